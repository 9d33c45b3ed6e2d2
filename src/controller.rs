//! Adaptive dirty-pixel threshold controller.
//!
//! A deadband proportional controller on a single scalar: it never shoots
//! for an exact FPS, only nudges the threshold when the measured FPS drifts
//! outside a hysteresis band around the target. Lives inside the Consumer.

use std::collections::VecDeque;
use std::time::Duration;

use crate::config::PipelineConfig;

pub struct ThresholdController {
    history: VecDeque<Duration>,
    history_size: usize,
    threshold: i32,
    min_threshold: i32,
    max_threshold: i32,
    target_fps: f32,
    hysteresis_factor: f32,
    step_up: i32,
    step_down: i32,
}

impl ThresholdController {
    pub fn new(cfg: &PipelineConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(cfg.fps_history_size),
            history_size: cfg.fps_history_size,
            threshold: cfg.min_diff_threshold,
            min_threshold: cfg.min_diff_threshold,
            max_threshold: cfg.max_diff_threshold,
            target_fps: cfg.target_fps,
            hysteresis_factor: cfg.fps_hysteresis_factor,
            step_up: cfg.threshold_step_up,
            step_down: cfg.threshold_step_down,
        }
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    /// Reset to the state a fresh session starts in: empty history, minimum
    /// threshold.
    pub fn reset(&mut self) {
        self.history.clear();
        self.threshold = self.min_threshold;
    }

    /// Record one frame's processing time and, once the history window is
    /// full, adjust the threshold. Returns the computed FPS once the window
    /// fills, `None` before that.
    pub fn record_frame(&mut self, elapsed: Duration) -> Option<f32> {
        if self.history.len() == self.history_size {
            self.history.pop_front();
        }
        self.history.push_back(elapsed);

        if self.history.len() < self.history_size {
            return None;
        }

        let avg = self.history.iter().map(Duration::as_secs_f32).sum::<f32>() / self.history_size as f32;
        let fps = if avg > 0.0 { 1.0 / avg } else { 0.0 };

        let band = self.target_fps * self.hysteresis_factor;
        if fps < self.target_fps - band {
            self.threshold = (self.threshold + self.step_up).min(self.max_threshold);
        } else if fps > self.target_fps + band {
            self.threshold = (self.threshold - self.step_down).max(self.min_threshold);
        }

        Some(fps)
    }
}
