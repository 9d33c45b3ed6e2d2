//! Producer loop: render into a canvas and enqueue while the queue has room.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use imaging::Image;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::FrameError;
use crate::frame_queue::FrameQueue;
use crate::metrics::PipelineMetrics;
use crate::source::ImageSource;

const QUEUE_PUT_TIMEOUT: Duration = Duration::from_millis(100);
const LOW_WATER_SLEEP: Duration = Duration::from_millis(10);
const SOURCE_UNAVAILABLE_BACKOFF: Duration = Duration::from_millis(500);

/// Run until `stop` fires or the source reports a fatal error. Always calls
/// `source.shutdown()` on the way out, regardless of exit path.
pub fn run(
    cfg: &PipelineConfig,
    queue: &FrameQueue,
    stop: &AtomicBool,
    mut source: Box<dyn ImageSource>,
    metrics: &Arc<PipelineMetrics>,
) {
    let (w, h) = source.resolution();
    let mut canvas = Image::new(w, h);

    while !stop.load(Ordering::Acquire) {
        let loop_start = Instant::now();

        let depth = queue.depth();
        metrics.observe_queue_size(&cfg.name, depth);
        if depth >= cfg.producer_low_water_mark {
            std::thread::sleep(LOW_WATER_SLEEP);
            continue;
        }

        match source.render(&mut canvas) {
            Ok(()) => {
                metrics.frame_generated(&cfg.name);
                if queue.try_put(canvas.clone(), QUEUE_PUT_TIMEOUT).is_err() {
                    let err = FrameError::QueueFull { pipeline: cfg.name.clone() };
                    warn!(pipeline = %cfg.name, error = %err, "dropping frame");
                }
            }
            Err(err) if err.ends_session() => {
                warn!(pipeline = %cfg.name, error = %err, "source error ends session");
                stop.store(true, Ordering::Release);
                break;
            }
            Err(err) if err.is_retryable() => {
                warn!(pipeline = %cfg.name, error = %err, "source unavailable, backing off");
                std::thread::sleep(SOURCE_UNAVAILABLE_BACKOFF);
            }
            Err(err) => {
                warn!(pipeline = %cfg.name, error = %err, "unexpected source error, backing off");
                std::thread::sleep(SOURCE_UNAVAILABLE_BACKOFF);
            }
        }

        let elapsed = loop_start.elapsed();
        if elapsed < cfg.producer_target_interval {
            std::thread::sleep(cfg.producer_target_interval - elapsed);
        }
    }

    source.shutdown();
    info!(pipeline = %cfg.name, "producer exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockSource;
    use std::sync::atomic::AtomicBool;
    use std::thread;

    #[test]
    fn producer_stops_promptly_when_signalled() {
        let cfg = PipelineConfig::with_defaults("producer-test", 9200, 4, 4);
        let queue = FrameQueue::new(cfg.queue_capacity);
        let stop = AtomicBool::new(false);
        let metrics = crate::metrics::test_metrics();
        let source: Box<dyn ImageSource> = Box::new(MockSource::new(4, 4));

        let stop_flag = &stop;
        thread::scope(|scope| {
            scope.spawn(|| {
                thread::sleep(Duration::from_millis(30));
                stop_flag.store(true, Ordering::Release);
            });
            run(&cfg, &queue, stop_flag, source, &metrics);
        });

        assert!(stop.load(Ordering::Acquire));
    }

    #[test]
    fn producer_enqueues_frames_below_low_water_mark() {
        let mut cfg = PipelineConfig::with_defaults("producer-test-2", 9201, 2, 2);
        cfg.producer_target_interval = Duration::from_millis(1);
        let queue = FrameQueue::new(cfg.queue_capacity);
        let stop = AtomicBool::new(false);
        let metrics = crate::metrics::test_metrics();
        let source: Box<dyn ImageSource> = Box::new(MockSource::new(2, 2));

        thread::scope(|scope| {
            scope.spawn(|| {
                thread::sleep(Duration::from_millis(40));
                stop.store(true, Ordering::Release);
            });
            run(&cfg, &queue, &stop, source, &metrics);
        });

        assert!(queue.depth() > 0 || queue.capacity() > 0);
    }
}
