//! Dirty rects and their split into wire-sized chunks.

use crate::error::ImagingError;

/// A rectangle bounding changed pixels, in target-resolution coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl DirtyRect {
    /// `true` iff the rect has positive area and lies fully inside an
    /// `image_w x image_h` image.
    pub fn is_valid_within(&self, image_w: u32, image_h: u32) -> bool {
        self.w > 0
            && self.h > 0
            && self.x + self.w <= image_w
            && self.y + self.h <= image_h
    }
}

/// One horizontal band of a dirty rect, sized to fit under a chunk's
/// `max_chunk_payload_bytes` budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Chunk {
    pub fn data_len(&self) -> usize {
        self.w as usize * self.h as usize * 2
    }
}

/// Slice this chunk's RGB565 bytes out of a full-frame encoded buffer.
///
/// `full_rgb565` is the row-major big-endian RGB565 encoding of the entire
/// `frame_w`-wide target image (see [`crate::dither::dither_frame_to_rgb565`]);
/// this copies out just the rows/columns covered by `chunk`.
pub fn extract_chunk_bytes(full_rgb565: &[u8], frame_w: u32, chunk: &Chunk) -> Vec<u8> {
    let frame_w = frame_w as usize;
    let row_bytes = chunk.w as usize * 2;
    let mut out = Vec::with_capacity(chunk.data_len());
    for row in 0..chunk.h as usize {
        let y = chunk.y as usize + row;
        let row_start = (y * frame_w + chunk.x as usize) * 2;
        out.extend_from_slice(&full_rgb565[row_start..row_start + row_bytes]);
    }
    out
}

/// Split `rect` into one or more top-to-bottom [`Chunk`]s such that every
/// chunk's RGB565 payload fits within `max_chunk_payload` bytes.
///
/// A rect whose packed size is exactly `max_chunk_payload` is returned as a
/// single chunk (the split only triggers on strictly-greater). If the rect's
/// width alone needs more than `max_chunk_payload` bytes per row, the rect is
/// un-sendable at this width: this is a config error, not a runtime fault,
/// and is reported as [`ImagingError::ChunkTooWide`] rather than silently
/// truncated.
pub fn split_into_chunks(rect: DirtyRect, max_chunk_payload: usize) -> Result<Vec<Chunk>, ImagingError> {
    let full_payload = rect.w as usize * rect.h as usize * 2;
    if full_payload <= max_chunk_payload {
        return Ok(vec![Chunk { x: rect.x, y: rect.y, w: rect.w, h: rect.h }]);
    }

    let bytes_per_row = rect.w as usize * 2;
    if bytes_per_row > max_chunk_payload {
        return Err(ImagingError::ChunkTooWide {
            w: rect.w,
            needed: bytes_per_row,
            max_payload: max_chunk_payload,
        });
    }

    let band_h = (max_chunk_payload / bytes_per_row).max(1) as u32;
    let end_y = rect.y + rect.h;
    let mut chunks = Vec::new();
    let mut y = rect.y;
    while y < end_y {
        let h = band_h.min(end_y - y);
        chunks.push(Chunk { x: rect.x, y, w: rect.w, h });
        y += h;
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::exact_fit_is_one_chunk(
        DirtyRect { x: 0, y: 0, w: 4, h: 2 }, // 16 bytes
        16,
        vec![Chunk { x: 0, y: 0, w: 4, h: 2 }],
    )]
    #[case::one_byte_over_splits_into_bounded_bands(
        DirtyRect { x: 0, y: 0, w: 4, h: 3 }, // 24 bytes, budget 16
        16,
        vec![Chunk { x: 0, y: 0, w: 4, h: 2 }, Chunk { x: 0, y: 2, w: 4, h: 1 }],
    )]
    #[case::multi_band_split(
        DirtyRect { x: 5, y: 10, w: 4, h: 5 }, // 40 bytes, budget 12 -> 1 row/band
        12,
        vec![
            Chunk { x: 5, y: 10, w: 4, h: 1 },
            Chunk { x: 5, y: 11, w: 4, h: 1 },
            Chunk { x: 5, y: 12, w: 4, h: 1 },
            Chunk { x: 5, y: 13, w: 4, h: 1 },
            Chunk { x: 5, y: 14, w: 4, h: 1 },
        ],
    )]
    fn split_into_chunks_produces_expected_bands(
        #[case] rect: DirtyRect,
        #[case] max_chunk_payload: usize,
        #[case] expected: Vec<Chunk>,
    ) {
        let chunks = split_into_chunks(rect, max_chunk_payload).unwrap();
        assert_eq!(chunks, expected);
        for c in &chunks {
            assert!(c.data_len() <= max_chunk_payload);
        }
    }

    #[test]
    fn width_alone_too_wide_errors() {
        let rect = DirtyRect { x: 0, y: 0, w: 100, h: 1 }; // 200 bytes/row
        assert!(split_into_chunks(rect, 16).is_err());
    }

    #[test]
    fn extract_chunk_bytes_pulls_correct_rows_and_columns() {
        // 4x4 frame, 2 bytes/pixel, values are 0,1,2,...
        let frame_w = 4u32;
        let full: Vec<u8> = (0..(4 * 4 * 2) as u16).map(|v| v as u8).collect();
        let chunk = Chunk { x: 1, y: 1, w: 2, h: 2 };
        let bytes = extract_chunk_bytes(&full, frame_w, &chunk);
        // row 1 starts at byte (1*4+1)*2 = 10, two pixels = 4 bytes
        // row 2 starts at byte (2*4+1)*2 = 18, two pixels = 4 bytes
        assert_eq!(bytes, vec![10, 11, 12, 13, 18, 19, 20, 21]);
    }

    #[test]
    fn bands_are_consecutive_and_same_x_w() {
        let rect = DirtyRect { x: 5, y: 10, w: 8, h: 10 };
        let chunks = split_into_chunks(rect, 32).unwrap(); // 2 rows/band
        let mut y = rect.y;
        for c in &chunks {
            assert_eq!(c.x, rect.x);
            assert_eq!(c.w, rect.w);
            assert_eq!(c.y, y);
            y += c.h;
        }
        assert_eq!(y, rect.y + rect.h);
    }
}
