//! # imaging
//!
//! RGB pixel kernels for the framecast pipeline: resizing, gamma/white-balance
//! correction, Floyd-Steinberg dithering with RGB565 quantization, dirty-rect
//! diffing, and chunk splitting for the wire protocol.
//!
//! Every kernel here is a pure function (or a small stateful wrapper around a
//! reusable SIMD resizer) over plain buffers - no I/O, no threads. The
//! `framecast` crate calls these from its Consumer loop.
//!
//! ## Key components
//!
//! - [`image`]: the owned RGB pixel buffer type shared across the pipeline
//! - [`resize`]: SIMD-accelerated Lanczos3 downscaling via `fast_image_resize`
//! - [`diff`]: single-bounding-box dirty-rect detection
//! - [`chunk`]: splitting a dirty rect into wire-sized chunks
//! - [`color`]: gamma + white-balance correction
//! - [`dither`]: Floyd-Steinberg error diffusion and RGB565 packing

pub mod chunk;
pub mod color;
pub mod diff;
pub mod dither;
mod error;
pub mod image;
pub mod resize;

pub use chunk::{extract_chunk_bytes, split_into_chunks, Chunk, DirtyRect};
pub use color::ColorCorrection;
pub use diff::detect_dirty_rect;
pub use dither::{decode_rgb565_to_rgb8, dither_frame_to_rgb565};
pub use error::ImagingError;
pub use image::Image;
pub use resize::Resizer;
