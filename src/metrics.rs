//! Prometheus exposition for the pipeline.
//!
//! Metric names and semantics follow the documented metrics surface;
//! every one carries a `pipeline_name` label so a single `/metrics` endpoint
//! can serve every pipeline in the process. Grounded on
//! `sbernauer-breakwater`'s `prometheus_exporter.rs`: one struct holding
//! already-registered metric handles, `prometheus_exporter::start` called
//! once for the whole process.

use std::net::SocketAddr;

use color_eyre::eyre;
use prometheus_exporter::prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram_vec, CounterVec, GaugeVec, HistogramVec,
};

/// Start the shared `/metrics` HTTP endpoint. Call once per process before
/// constructing any [`PipelineMetrics`].
pub fn start_exporter(addr: SocketAddr) -> eyre::Result<()> {
    prometheus_exporter::start(addr)?;
    Ok(())
}

pub struct PipelineMetrics {
    frames_generated: CounterVec,
    frames_processed: CounterVec,
    connection_errors: CounterVec,
    reconnections: CounterVec,

    stage_processing_seconds: HistogramVec,
    packet_size_bytes: HistogramVec,
    chunks_per_frame: HistogramVec,
    queue_size: HistogramVec,
    dirty_rects_send_duration: HistogramVec,

    current_dynamic_threshold: GaugeVec,
    consumer_calculated_fps: GaugeVec,
}

impl PipelineMetrics {
    /// Register every metric with the process-wide default registry. Safe
    /// to call once per pipeline; registering the same metric name twice
    /// across pipelines is fine since the label vectors are shared.
    pub fn register() -> eyre::Result<Self> {
        Ok(Self {
            frames_generated: register_counter_vec!(
                "frames_generated_total",
                "Frames produced by the ImageSource",
                &["pipeline_name"]
            )?,
            frames_processed: register_counter_vec!(
                "frames_processed_total",
                "Frames popped and processed by the Consumer",
                &["pipeline_name"]
            )?,
            connection_errors: register_counter_vec!(
                "connection_errors_total",
                "Socket errors that ended a session",
                &["pipeline_name"]
            )?,
            reconnections: register_counter_vec!(
                "reconnections_total",
                "Clients accepted by the Listener",
                &["pipeline_name"]
            )?,
            stage_processing_seconds: register_histogram_vec!(
                "frame_processing_seconds",
                "Per-stage processing duration",
                &["pipeline_name", "stage"]
            )?,
            packet_size_bytes: register_histogram_vec!(
                "packet_size_bytes",
                "Size in bytes of each packet written to the client socket",
                &["pipeline_name"]
            )?,
            chunks_per_frame: register_histogram_vec!(
                "chunks_per_frame",
                "Number of chunks a single frame's dirty rect was split into",
                &["pipeline_name"]
            )?,
            queue_size: register_histogram_vec!(
                "queue_size",
                "Observed frame queue depth",
                &["pipeline_name"]
            )?,
            dirty_rects_send_duration: register_histogram_vec!(
                "dirty_rects_send_duration_seconds",
                "Wall time to send every chunk of a frame's dirty rect",
                &["pipeline_name"]
            )?,
            current_dynamic_threshold: register_gauge_vec!(
                "current_dynamic_threshold",
                "Current value of the adaptive dirty-pixel threshold",
                &["pipeline_name"]
            )?,
            consumer_calculated_fps: register_gauge_vec!(
                "consumer_calculated_fps",
                "Consumer's rolling-average frames per second",
                &["pipeline_name"]
            )?,
        })
    }

    pub fn frame_generated(&self, pipeline: &str) {
        self.frames_generated.with_label_values(&[pipeline]).inc();
    }

    pub fn frame_processed(&self, pipeline: &str) {
        self.frames_processed.with_label_values(&[pipeline]).inc();
    }

    pub fn connection_error(&self, pipeline: &str) {
        self.connection_errors.with_label_values(&[pipeline]).inc();
    }

    pub fn reconnection(&self, pipeline: &str) {
        self.reconnections.with_label_values(&[pipeline]).inc();
    }

    pub fn observe_stage(&self, pipeline: &str, stage: &str, seconds: f64) {
        self.stage_processing_seconds.with_label_values(&[pipeline, stage]).observe(seconds);
    }

    pub fn observe_packet_size(&self, pipeline: &str, bytes: usize) {
        self.packet_size_bytes.with_label_values(&[pipeline]).observe(bytes as f64);
    }

    pub fn observe_chunks_per_frame(&self, pipeline: &str, chunks: usize) {
        self.chunks_per_frame.with_label_values(&[pipeline]).observe(chunks as f64);
    }

    pub fn observe_queue_size(&self, pipeline: &str, depth: usize) {
        self.queue_size.with_label_values(&[pipeline]).observe(depth as f64);
    }

    pub fn observe_dirty_rects_send_duration(&self, pipeline: &str, seconds: f64) {
        self.dirty_rects_send_duration.with_label_values(&[pipeline]).observe(seconds);
    }

    pub fn set_current_dynamic_threshold(&self, pipeline: &str, threshold: i32) {
        self.current_dynamic_threshold.with_label_values(&[pipeline]).set(threshold as f64);
    }

    pub fn set_consumer_calculated_fps(&self, pipeline: &str, fps: f64) {
        self.consumer_calculated_fps.with_label_values(&[pipeline]).set(fps);
    }
}

#[cfg(test)]
pub(crate) fn test_metrics() -> std::sync::Arc<PipelineMetrics> {
    use std::sync::OnceLock;
    // The default prometheus registry is process-global, so registering the
    // same metric names twice (once per test function) would fail. Every
    // test in this binary shares one registration.
    static METRICS: OnceLock<std::sync::Arc<PipelineMetrics>> = OnceLock::new();
    METRICS.get_or_init(|| std::sync::Arc::new(PipelineMetrics::register().unwrap())).clone()
}
