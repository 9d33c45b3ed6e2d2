//! Gamma and white-balance correction.
//!
//! Runs once per frame on the full target-resolution image (see the module
//! doc on [`crate::dither`] for why this crate pins per-frame, not per-chunk,
//! processing) on a float32 working buffer, then rounds back to 8-bit RGB.

use crate::image::Image;

/// Per-channel gamma exponent plus white-balance multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCorrection {
    pub gamma: f32,
    pub wb_scale: [f32; 3],
}

impl ColorCorrection {
    pub fn identity() -> Self {
        Self { gamma: 1.0, wb_scale: [1.0, 1.0, 1.0] }
    }

    /// Apply `c' = clip(((c/255)^gamma) * wb, 0, 1) * 255`, rounded to
    /// nearest, independently per channel.
    pub fn apply(&self, image: &Image) -> Image {
        if self.gamma == 1.0 && self.wb_scale == [1.0, 1.0, 1.0] {
            return image.clone();
        }

        let src = image.as_rgb();
        let mut out = vec![0u8; src.len()];
        for (chunk_idx, rgb) in src.chunks_exact(3).enumerate() {
            for c in 0..3 {
                let normalized = rgb[c] as f32 / 255.0;
                let gamma_corrected = normalized.powf(self.gamma);
                let balanced = (gamma_corrected * self.wb_scale[c]).clamp(0.0, 1.0);
                out[chunk_idx * 3 + c] = (balanced * 255.0).round() as u8;
            }
        }

        Image::from_rgb(image.width(), image.height(), out)
            .expect("output buffer matches input image dimensions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_correction_is_a_no_op() {
        let img = Image::solid(2, 2, [123, 45, 200]);
        let out = ColorCorrection::identity().apply(&img);
        assert_eq!(out, img);
    }

    #[test]
    fn gamma_above_one_darkens_midtones() {
        let img = Image::solid(1, 1, [128, 128, 128]);
        let cc = ColorCorrection { gamma: 2.2, wb_scale: [1.0, 1.0, 1.0] };
        let out = cc.apply(&img);
        assert!(out.pixel(0, 0)[0] < 128);
    }

    #[test]
    fn white_balance_scales_channels_independently() {
        let img = Image::solid(1, 1, [200, 200, 200]);
        let cc = ColorCorrection { gamma: 1.0, wb_scale: [0.5, 1.0, 1.0] };
        let out = cc.apply(&img);
        let px = out.pixel(0, 0);
        assert!(px[0] < px[1]);
        assert_eq!(px[1], px[2]);
    }

    #[test]
    fn result_is_clamped_into_range() {
        let img = Image::solid(1, 1, [255, 255, 255]);
        let cc = ColorCorrection { gamma: 0.5, wb_scale: [2.0, 2.0, 2.0] };
        let out = cc.apply(&img);
        assert_eq!(out.pixel(0, 0), [255, 255, 255]);
    }
}
