//! Single-bounding-box dirty-rect detection.
//!
//! Deliberately emits at most one rectangle per frame: the bounding box of
//! every pixel whose L1 sum-of-absolute-channel-difference against the
//! previous transmitted frame exceeds the current dynamic threshold. This
//! trades bandwidth for CPU and keeps downstream chunking bounded.

use crate::chunk::DirtyRect;
use crate::image::Image;

/// Compare `prev` (the last transmitted frame, if any) against `curr` and
/// return the single bounding rect of changed pixels, if any.
///
/// An absent or differently-sized `prev` always yields a full-frame rect,
/// satisfying "every accepted client causes exactly one full-frame
/// transmission before any partial updates."
pub fn detect_dirty_rect(prev: Option<&Image>, curr: &Image, threshold: i32) -> Option<DirtyRect> {
    let (w, h) = curr.size();

    let prev = match prev {
        Some(p) if p.size() == (w, h) => p,
        _ => return Some(DirtyRect { x: 0, y: 0, w, h }),
    };

    let mut min_x = u32::MAX;
    let mut min_y = u32::MAX;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    let mut any_changed = false;

    let prev_rgb = prev.as_rgb();
    let curr_rgb = curr.as_rgb();

    for y in 0..h {
        let row = y as usize * w as usize * 3;
        for x in 0..w {
            let i = row + x as usize * 3;
            let dr = curr_rgb[i] as i32 - prev_rgb[i] as i32;
            let dg = curr_rgb[i + 1] as i32 - prev_rgb[i + 1] as i32;
            let db = curr_rgb[i + 2] as i32 - prev_rgb[i + 2] as i32;
            let d = dr.abs() + dg.abs() + db.abs();
            if d > threshold {
                any_changed = true;
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);
            }
        }
    }

    if !any_changed {
        return None;
    }

    Some(DirtyRect {
        x: min_x,
        y: min_y,
        w: max_x - min_x + 1,
        h: max_y - min_y + 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_previous_frame_yields_full_frame() {
        let curr = Image::solid(4, 2, [1, 2, 3]);
        let rect = detect_dirty_rect(None, &curr, 5).unwrap();
        assert_eq!(rect, DirtyRect { x: 0, y: 0, w: 4, h: 2 });
    }

    #[test]
    fn identical_frames_yield_no_rect() {
        let img = Image::solid(4, 4, [9, 9, 9]);
        assert!(detect_dirty_rect(Some(&img), &img, 5).is_none());
    }

    #[test]
    fn size_mismatch_forces_full_frame() {
        let prev = Image::solid(2, 2, [0, 0, 0]);
        let curr = Image::solid(4, 4, [0, 0, 0]);
        let rect = detect_dirty_rect(Some(&prev), &curr, 5).unwrap();
        assert_eq!(rect, DirtyRect { x: 0, y: 0, w: 4, h: 4 });
    }

    #[test]
    fn single_pixel_change_yields_one_by_one_rect() {
        let mut curr = Image::solid(10, 10, [0, 0, 0]);
        curr.set_pixel(3, 7, [255, 0, 0]);
        let prev = Image::solid(10, 10, [0, 0, 0]);
        let rect = detect_dirty_rect(Some(&prev), &curr, 5).unwrap();
        assert_eq!(rect, DirtyRect { x: 3, y: 7, w: 1, h: 1 });
    }

    #[test]
    fn disjoint_changes_merge_into_one_bounding_box() {
        let mut curr = Image::solid(20, 20, [0, 0, 0]);
        curr.set_pixel(0, 0, [255, 255, 255]);
        curr.set_pixel(19, 19, [255, 255, 255]);
        let prev = Image::solid(20, 20, [0, 0, 0]);
        let rect = detect_dirty_rect(Some(&prev), &curr, 5).unwrap();
        assert_eq!(rect, DirtyRect { x: 0, y: 0, w: 20, h: 20 });
    }

    #[test]
    fn differences_at_or_below_threshold_do_not_count() {
        let prev = Image::solid(4, 4, [100, 100, 100]);
        let mut curr = Image::solid(4, 4, [100, 100, 100]);
        curr.set_pixel(1, 1, [102, 100, 100]); // abs diff sum == 2
        assert!(detect_dirty_rect(Some(&prev), &curr, 2).is_none());
        assert!(detect_dirty_rect(Some(&prev), &curr, 1).is_some());
    }
}
