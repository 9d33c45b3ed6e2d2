//! `ImageSource` contract and the bundled mock backend.
//!
//! Every other backend the original BIOS/CPU-monitor/dashboard/screen-grab
//! sources describe is out of scope here; `MockSource` stands in as the one
//! concrete, always-available source so the pipeline can run end-to-end
//! without an external capture dependency.

use imaging::Image;

use crate::error::FrameError;

/// A polymorphic producer of frames.
///
/// `render` writes into a caller-owned canvas that is always exactly
/// `resolution()` in size; implementations must not resize it.
pub trait ImageSource: Send {
    fn resolution(&self) -> (u32, u32);
    fn render(&mut self, canvas: &mut Image) -> Result<(), FrameError>;

    /// Idempotent teardown; the core calls this exactly once per session.
    fn shutdown(&mut self) {}
}

/// A synthetic source that sweeps a vertical bar across a solid background,
/// advancing one column per `render` call. Gives the dirty-rect detector and
/// the adaptive controller something to react to without any real capture
/// backend.
pub struct MockSource {
    width: u32,
    height: u32,
    frame_count: u64,
    background: [u8; 3],
    bar_color: [u8; 3],
}

impl MockSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_count: 0,
            background: [16, 16, 16],
            bar_color: [255, 200, 0],
        }
    }

    pub fn with_colors(width: u32, height: u32, background: [u8; 3], bar_color: [u8; 3]) -> Self {
        Self { width, height, frame_count: 0, background, bar_color }
    }
}

impl ImageSource for MockSource {
    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn render(&mut self, canvas: &mut Image) -> Result<(), FrameError> {
        if canvas.size() != (self.width, self.height) {
            return Err(FrameError::InternalInvariant {
                pipeline: "mock".to_string(),
                reason: format!(
                    "canvas size {:?} does not match source resolution {:?}",
                    canvas.size(),
                    (self.width, self.height)
                ),
            });
        }

        let bar_x = (self.frame_count % self.width as u64) as u32;
        for y in 0..self.height {
            for x in 0..self.width {
                let color = if x == bar_x { self.bar_color } else { self.background };
                canvas.set_pixel(x, y, color);
            }
        }
        self.frame_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_fails_on_canvas_size_mismatch() {
        let mut src = MockSource::new(10, 10);
        let mut canvas = Image::new(5, 5);
        assert!(src.render(&mut canvas).is_err());
    }

    #[test]
    fn bar_advances_one_column_per_frame() {
        let mut src = MockSource::new(4, 2);
        let mut canvas = Image::new(4, 2);
        src.render(&mut canvas).unwrap();
        assert_eq!(canvas.pixel(0, 0), [255, 200, 0]);
        src.render(&mut canvas).unwrap();
        assert_eq!(canvas.pixel(1, 0), [255, 200, 0]);
        assert_eq!(canvas.pixel(0, 0), [16, 16, 16]);
    }

    #[test]
    fn bar_wraps_around_width() {
        let mut src = MockSource::new(2, 1);
        let mut canvas = Image::new(2, 1);
        src.render(&mut canvas).unwrap();
        src.render(&mut canvas).unwrap();
        src.render(&mut canvas).unwrap();
        assert_eq!(canvas.pixel(1, 0), [255, 200, 0]);
    }
}
