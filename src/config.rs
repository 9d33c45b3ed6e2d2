//! Per-pipeline configuration.
//!
//! Loading this struct from a config file is out of scope; this module only
//! owns the struct and its validation. Defaults here mirror the documented
//! per-pipeline option table so a caller building one by hand sees the same
//! values a loader would.

use std::time::Duration;

use crate::error::FrameError;

/// Which `ImageSource` backend a pipeline should use.
///
/// Only [`ImageSourceKind::Mock`] is actually constructible by this crate;
/// the rest name backends that live outside its scope (screen/window
/// grabbers, a CPU monitor, a metrics dashboard renderer) but are accepted
/// here so a config loader can name them without this crate needing to know
/// how to build them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSourceKind {
    Mock,
    ScreenRegion,
    WindowTitle,
    CpuMonitor,
    MetricsDashboard,
}

impl ImageSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSourceKind::Mock => "mock",
            ImageSourceKind::ScreenRegion => "screen_region",
            ImageSourceKind::WindowTitle => "window_title",
            ImageSourceKind::CpuMonitor => "cpu_monitor",
            ImageSourceKind::MetricsDashboard => "metrics_dashboard",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub name: String,
    pub listen_port: u16,
    pub target_width: u32,
    pub target_height: u32,
    pub source: ImageSourceKind,

    pub gamma: f32,
    pub wb_scale: [f32; 3],

    pub max_chunk_payload_bytes: usize,

    pub target_fps: f32,
    pub fps_history_size: usize,
    pub fps_hysteresis_factor: f32,

    pub min_diff_threshold: i32,
    pub max_diff_threshold: i32,
    pub threshold_step_up: i32,
    pub threshold_step_down: i32,

    pub queue_capacity: usize,
    pub producer_low_water_mark: usize,
    pub producer_target_interval: Duration,

    pub socket_timeout: Duration,
}

impl PipelineConfig {
    /// A config using the documented default for every option, for the
    /// given pipeline name/port/resolution.
    pub fn with_defaults(name: impl Into<String>, listen_port: u16, target_width: u32, target_height: u32) -> Self {
        Self {
            name: name.into(),
            listen_port,
            target_width,
            target_height,
            source: ImageSourceKind::Mock,
            gamma: 1.0,
            wb_scale: [1.0, 1.0, 1.0],
            max_chunk_payload_bytes: 8192,
            target_fps: 10.0,
            fps_history_size: 10,
            fps_hysteresis_factor: 0.1,
            min_diff_threshold: 5,
            max_diff_threshold: 220,
            threshold_step_up: 10,
            threshold_step_down: 5,
            queue_capacity: 5,
            producer_low_water_mark: 2,
            producer_target_interval: Duration::from_millis(50),
            socket_timeout: Duration::from_millis(2000),
        }
    }

    /// Validate every field, returning the first violated constraint.
    pub fn validate(&self) -> Result<(), FrameError> {
        let invalid = |reason: &str| {
            Err(FrameError::ConfigInvalid {
                pipeline: self.name.clone(),
                reason: reason.to_string(),
            })
        };

        if self.name.trim().is_empty() {
            return invalid("name must not be empty");
        }
        if self.listen_port == 0 {
            return invalid("listen_port must be nonzero");
        }
        if self.target_width == 0 || self.target_height == 0 {
            return invalid("target_width and target_height must be nonzero");
        }
        if !(self.gamma > 0.0) {
            return invalid("gamma must be positive");
        }
        if self.wb_scale.iter().any(|&s| !(s > 0.0)) {
            return invalid("wb_scale components must be positive");
        }
        if self.max_chunk_payload_bytes == 0 {
            return invalid("max_chunk_payload_bytes must be nonzero");
        }
        if !(self.target_fps > 0.0) {
            return invalid("target_fps must be positive");
        }
        if self.fps_history_size == 0 {
            return invalid("fps_history_size must be nonzero");
        }
        if self.fps_hysteresis_factor < 0.0 {
            return invalid("fps_hysteresis_factor must be non-negative");
        }
        if self.min_diff_threshold < 0 || self.max_diff_threshold < self.min_diff_threshold {
            return invalid("min_diff_threshold must be >= 0 and <= max_diff_threshold");
        }
        if self.threshold_step_up == 0 || self.threshold_step_down == 0 {
            return invalid("threshold step sizes must be nonzero");
        }
        if self.queue_capacity == 0 {
            return invalid("queue_capacity must be nonzero");
        }
        if self.producer_low_water_mark >= self.queue_capacity {
            return invalid("producer_low_water_mark must be less than queue_capacity");
        }
        if matches!(
            self.source,
            ImageSourceKind::ScreenRegion
                | ImageSourceKind::WindowTitle
                | ImageSourceKind::CpuMonitor
                | ImageSourceKind::MetricsDashboard
        ) {
            return invalid(&format!(
                "source '{}' is recognized but its backend is out of scope for this crate",
                self.source.as_str()
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_table() {
        let cfg = PipelineConfig::with_defaults("display-1", 9000, 320, 240);
        assert_eq!(cfg.gamma, 1.0);
        assert_eq!(cfg.wb_scale, [1.0, 1.0, 1.0]);
        assert_eq!(cfg.max_chunk_payload_bytes, 8192);
        assert_eq!(cfg.target_fps, 10.0);
        assert_eq!(cfg.min_diff_threshold, 5);
        assert_eq!(cfg.max_diff_threshold, 220);
        assert_eq!(cfg.queue_capacity, 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let mut cfg = PipelineConfig::with_defaults("p", 9000, 0, 240);
        assert!(cfg.validate().is_err());
        cfg.target_width = 320;
        cfg.target_height = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn threshold_bounds_out_of_order_are_rejected() {
        let mut cfg = PipelineConfig::with_defaults("p", 9000, 320, 240);
        cfg.min_diff_threshold = 100;
        cfg.max_diff_threshold = 50;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn low_water_mark_must_be_below_capacity() {
        let mut cfg = PipelineConfig::with_defaults("p", 9000, 320, 240);
        cfg.producer_low_water_mark = cfg.queue_capacity;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_mock_sources_fail_validation_as_out_of_scope() {
        let mut cfg = PipelineConfig::with_defaults("p", 9000, 320, 240);
        cfg.source = ImageSourceKind::CpuMonitor;
        assert!(cfg.validate().is_err());
    }
}
