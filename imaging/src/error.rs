use thiserror::Error;

/// Failure modes for the pixel kernels.
///
/// These map onto the framing server's `InternalInvariant` error kind: a
/// caller that hits one of these should skip the offending chunk/frame and
/// keep running, never tear down the process.
#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("buffer length {actual} does not match {width}x{height}x{channels}")]
    BufferLength {
        width: u32,
        height: u32,
        channels: u32,
        actual: usize,
    },

    #[error("rectangle ({x},{y},{w},{h}) is out of bounds for a {image_w}x{image_h} image")]
    RectOutOfBounds {
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        image_w: u32,
        image_h: u32,
    },

    #[error("rectangle width {w} alone needs {needed} bytes per row, exceeding max_chunk_payload {max_payload}")]
    ChunkTooWide { w: u32, needed: usize, max_payload: usize },

    #[error("resize failed: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),

    #[error("image buffer error: {0}")]
    ImageBuffer(#[from] fast_image_resize::ImageBufferError),
}
