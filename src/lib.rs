//! # framecast
//!
//! A multi-pipeline framing server: each pipeline captures or synthesizes
//! RGB images, reduces them to RGB565 with gamma/white-balance correction
//! and Floyd-Steinberg dithering, detects the dirty region against the last
//! frame a client actually saw, and streams just that region over a
//! persistent TCP connection to an embedded display client.
//!
//! ## Key components
//!
//! - [`config`]: per-pipeline configuration and validation
//! - [`source`]: the `ImageSource` boundary and the bundled mock backend
//! - [`frame_queue`]: the bounded Producer/Consumer handoff
//! - [`controller`]: the adaptive FPS-targeted dirty-pixel threshold
//! - [`protocol`]: wire framing for chunked RGB565 packets
//! - [`producer`] / [`consumer`]: the two threads of an active session
//! - [`session`]: spawns and tears down one client's Producer/Consumer pair
//! - [`listener`]: the per-pipeline accept loop
//! - [`pipeline`]: ties config, listener, and metrics together
//! - [`metrics`]: Prometheus exposition
//! - [`error`]: the pipeline-wide error enum

pub mod config;
pub mod consumer;
pub mod controller;
pub mod error;
pub mod frame_queue;
pub mod listener;
pub mod metrics;
pub mod pipeline;
pub mod producer;
pub mod protocol;
pub mod session;
pub mod source;

pub use config::PipelineConfig;
pub use error::FrameError;
pub use pipeline::Pipeline;
