//! Error types for the framing pipeline.
//!
//! Every variant here corresponds to one of the error kinds in the pipeline's
//! error handling design: each carries enough context to log usefully, and
//! each knows whether it should end the owning session or just be logged and
//! skipped. `FrameError` never unwinds past a pipeline boundary - the
//! Listener loop and `main` are the only places treating it as fatal.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid config for pipeline '{pipeline}': {reason}")]
    ConfigInvalid { pipeline: String, reason: String },

    #[error("failed to bind listener for pipeline '{pipeline}' on port {port}: {source}")]
    BindFailure {
        pipeline: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("source unavailable for pipeline '{pipeline}': {reason}")]
    SourceUnavailable { pipeline: String, reason: String },

    #[error("source fatal for pipeline '{pipeline}': {reason}")]
    SourceFatal { pipeline: String, reason: String },

    #[error("frame queue full for pipeline '{pipeline}', dropping frame")]
    QueueFull { pipeline: String },

    #[error("socket error on pipeline '{pipeline}': {source}")]
    SocketError {
        pipeline: String,
        #[source]
        source: std::io::Error,
    },

    #[error("internal invariant violated in pipeline '{pipeline}': {reason}")]
    InternalInvariant { pipeline: String, reason: String },
}

impl FrameError {
    /// `true` if the Producer should back off and retry rather than stop.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FrameError::SourceUnavailable { .. })
    }

    /// `true` if this error requires tearing down the whole session rather
    /// than just skipping the offending frame or chunk.
    pub fn ends_session(&self) -> bool {
        matches!(
            self,
            FrameError::SourceFatal { .. } | FrameError::SocketError { .. }
        )
    }
}
