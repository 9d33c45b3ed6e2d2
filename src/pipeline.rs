//! Top-level per-pipeline wiring: config + Listener + shared metrics.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::error::FrameError;
use crate::listener::{Listener, SourceFactory};
use crate::metrics::PipelineMetrics;

/// One independently-running framing pipeline: validates its config, binds
/// its listener, and runs until told to stop.
pub struct Pipeline {
    listener: Listener,
}

impl Pipeline {
    pub fn new(cfg: PipelineConfig, metrics: Arc<PipelineMetrics>, source_factory: SourceFactory) -> Result<Self, FrameError> {
        cfg.validate()?;
        let cfg = Arc::new(cfg);
        let listener = Listener::bind(cfg, metrics, source_factory)?;
        Ok(Self { listener })
    }

    /// Runs the Listener's accept loop on the calling thread until
    /// `global_stop` is raised. Intended to be spawned one-per-pipeline by
    /// the process entry point.
    pub fn run(&self, global_stop: &AtomicBool) {
        self.listener.run(global_stop);
    }
}
