//! High-quality downscaling via `fast_image_resize`.
//!
//! A reusable `fast_image_resize::Resizer` (so repeated frames amortize the
//! SIMD dispatch decision) driving a `Convolution(Lanczos3)` kernel. Runs
//! on tightly-packed RGB8 (`U8x3`) buffers since nothing downstream touches
//! an alpha channel.

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x3;
use fir::{ResizeAlg, ResizeOptions, Resizer as FirResizer};

use crate::error::ImagingError;
use crate::image::Image;

/// Wraps a `fast_image_resize::Resizer`, reused across frames so its
/// internal SIMD-algorithm cache stays warm between calls.
pub struct Resizer {
    inner: FirResizer,
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Resizer {
    pub fn new() -> Self {
        Self { inner: FirResizer::new() }
    }

    /// Downscale (or upscale) `src` to exactly `(target_w, target_h)`.
    pub fn resize(
        &mut self,
        src: &Image,
        target_w: u32,
        target_h: u32,
    ) -> Result<Image, ImagingError> {
        if src.size() == (target_w, target_h) {
            return Ok(src.clone());
        }

        let src_view = TypedImageRef::<U8x3>::from_buffer(src.width(), src.height(), src.as_rgb())?;

        let mut dst_buf = vec![0u8; target_w as usize * target_h as usize * 3];
        let mut dst_view = TypedImage::<U8x3>::from_buffer(target_w, target_h, &mut dst_buf)?;

        let opts = ResizeOptions::new()
            .resize_alg(ResizeAlg::Convolution(fir::FilterType::Lanczos3))
            .use_alpha(false);

        self.inner.resize_typed(&src_view, &mut dst_view, &opts)?;

        Image::from_rgb(target_w, target_h, dst_buf)
    }
}
