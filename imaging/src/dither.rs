//! Floyd-Steinberg error diffusion and RGB565 packing.
//!
//! Dithering runs once per frame rather than once per chunk: the full
//! target-resolution image is dithered once into a row-major big-endian
//! RGB565 byte buffer, and chunks are later produced by
//! [`crate::chunk::extract_chunk_bytes`] slicing that buffer rather than
//! re-dithering sub-rects independently. This avoids visible seams at
//! chunk boundaries and keeps the transmitted bytes identical regardless
//! of how the dirty rect happens to get split.

use crate::image::Image;

/// Quantize to the nearest RGB565-representable 8-bit value.
fn quantize_channel(value: f32, step: f32) -> f32 {
    (value / step).round() * step
}

/// Floyd-Steinberg dither `image` and pack the result into a row-major,
/// big-endian RGB565 byte buffer of length `width * height * 2`.
pub fn dither_frame_to_rgb565(image: &Image) -> Vec<u8> {
    let (w, h) = image.size();
    let (w_us, h_us) = (w as usize, h as usize);

    // Float32 working buffer so propagated quantization error keeps its
    // fractional part between pixels.
    let mut buf: Vec<[f32; 3]> = image
        .as_rgb()
        .chunks_exact(3)
        .map(|p| [p[0] as f32, p[1] as f32, p[2] as f32])
        .collect();

    let mut out = vec![0u8; w_us * h_us * 2];
    let step = [8.0f32, 4.0, 8.0];

    for y in 0..h_us {
        for x in 0..w_us {
            let idx = y * w_us + x;
            let px = buf[idx];

            let mut quantized = [0f32; 3];
            let mut error = [0f32; 3];
            for c in 0..3 {
                let clamped = px[c].clamp(0.0, 255.0);
                let q = quantize_channel(clamped, step[c]).clamp(0.0, 255.0);
                quantized[c] = q;
                error[c] = clamped - q;
            }

            // 7/16 right, 3/16 down-left, 5/16 down, 1/16 down-right.
            let has_right = x + 1 < w_us;
            let has_down = y + 1 < h_us;
            let has_left = x > 0;

            if has_right {
                diffuse(&mut buf[idx + 1], &error, 7.0 / 16.0);
            }
            if has_down {
                let row_start = idx + w_us;
                if has_left {
                    diffuse(&mut buf[row_start - 1], &error, 3.0 / 16.0);
                }
                diffuse(&mut buf[row_start], &error, 5.0 / 16.0);
                if has_right {
                    diffuse(&mut buf[row_start + 1], &error, 1.0 / 16.0);
                }
            }

            let r = quantized[0] as u8;
            let g = quantized[1] as u8;
            let b = quantized[2] as u8;
            let packed: u16 = ((r & 0xF8) as u16) << 8 | ((g & 0xFC) as u16) << 3 | (b >> 3) as u16;
            let byte_idx = idx * 2;
            out[byte_idx] = (packed >> 8) as u8;
            out[byte_idx + 1] = (packed & 0xFF) as u8;
        }
    }

    out
}

fn diffuse(target: &mut [f32; 3], error: &[f32; 3], weight: f32) {
    for c in 0..3 {
        target[c] += error[c] * weight;
    }
}

/// Decode a row-major big-endian RGB565 buffer back to 24-bit RGB by bit
/// replication, used only to check round-trip fidelity in tests.
pub fn decode_rgb565_to_rgb8(data: &[u8]) -> Vec<[u8; 3]> {
    data.chunks_exact(2)
        .map(|pair| {
            let packed = u16::from_be_bytes([pair[0], pair[1]]);
            let r5 = (packed >> 11) & 0x1F;
            let g6 = (packed >> 5) & 0x3F;
            let b5 = packed & 0x1F;
            let r = ((r5 << 3) | (r5 >> 2)) as u8;
            let g = ((g6 << 2) | (g6 >> 4)) as u8;
            let b = ((b5 << 3) | (b5 >> 2)) as u8;
            [r, g, b]
        })
        .collect()
}
