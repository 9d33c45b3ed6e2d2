//! Consumer loop: resize, diff, color-correct, dither, chunk, send.
//!
//! Dithering is pinned per-frame rather than per-chunk (see
//! `imaging::dither`'s module doc): the whole resized frame is
//! color-corrected and dithered once, and chunks slice bytes out of that
//! single encoded buffer.

use std::io::Write;
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use imaging::{detect_dirty_rect, dither_frame_to_rgb565, extract_chunk_bytes, split_into_chunks, ColorCorrection, Image, Resizer};
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::controller::ThresholdController;
use crate::error::FrameError;
use crate::metrics::PipelineMetrics;
use crate::protocol::write_packet;

const QUEUE_GET_TIMEOUT: Duration = Duration::from_millis(100);

/// Run until `stop` fires or a socket write fails. On a socket error, sets
/// `stop` so the Producer unwinds too and resets the FPS gauge to 0.
pub fn run(
    cfg: &PipelineConfig,
    queue: &crate::frame_queue::FrameQueue,
    stop: &AtomicBool,
    stream: &mut TcpStream,
    metrics: &Arc<PipelineMetrics>,
) {
    let mut resizer = Resizer::new();
    let color = ColorCorrection { gamma: cfg.gamma, wb_scale: cfg.wb_scale };
    let mut controller = ThresholdController::new(cfg);
    controller.reset();
    let mut previous: Option<Image> = None;

    while !stop.load(Ordering::Acquire) {
        let Some(raw) = queue.get(QUEUE_GET_TIMEOUT) else {
            continue;
        };
        metrics.observe_queue_size(&cfg.name, queue.depth());

        let frame_start = Instant::now();

        let t = Instant::now();
        let resized = match resizer.resize(&raw, cfg.target_width, cfg.target_height) {
            Ok(img) => img,
            Err(err) => {
                error!(pipeline = %cfg.name, error = %err, "resize failed, skipping frame");
                continue;
            }
        };
        metrics.observe_stage(&cfg.name, "resize", t.elapsed().as_secs_f64());

        let t = Instant::now();
        let rect = detect_dirty_rect(previous.as_ref(), &resized, controller.threshold());
        metrics.observe_stage(&cfg.name, "diff", t.elapsed().as_secs_f64());

        let Some(rect) = rect else {
            previous = Some(resized);
            finish_frame(cfg, metrics, &mut controller, frame_start);
            continue;
        };

        let chunks = match split_into_chunks(rect, cfg.max_chunk_payload_bytes) {
            Ok(chunks) => chunks,
            Err(err) => {
                error!(pipeline = %cfg.name, error = %err, "dirty rect un-sendable at this width, skipping frame");
                finish_frame(cfg, metrics, &mut controller, frame_start);
                continue;
            }
        };

        let t = Instant::now();
        let corrected = color.apply(&resized);
        metrics.observe_stage(&cfg.name, "color_correction", t.elapsed().as_secs_f64());

        let t = Instant::now();
        let encoded = dither_frame_to_rgb565(&corrected);
        metrics.observe_stage(&cfg.name, "dither_encode", t.elapsed().as_secs_f64());

        let send_start = Instant::now();
        let mut send_failed = false;
        for chunk in &chunks {
            let payload = extract_chunk_bytes(&encoded, resized.width(), chunk);
            let t = Instant::now();
            if let Err(io_err) = write_packet(stream, chunk, &payload) {
                let err = FrameError::SocketError { pipeline: cfg.name.clone(), source: io_err };
                error!(pipeline = %cfg.name, error = %err, "socket write failed");
                metrics.connection_error(&cfg.name);
                if err.ends_session() {
                    metrics.set_consumer_calculated_fps(&cfg.name, 0.0);
                    stop.store(true, Ordering::Release);
                    send_failed = true;
                }
                break;
            }
            metrics.observe_stage(&cfg.name, "send", t.elapsed().as_secs_f64());
            metrics.observe_packet_size(&cfg.name, protocol_packet_len(payload.len()));
        }
        metrics.observe_dirty_rects_send_duration(&cfg.name, send_start.elapsed().as_secs_f64());
        metrics.observe_chunks_per_frame(&cfg.name, chunks.len());

        if send_failed {
            // previous is intentionally not promoted: the resized image was
            // never fully observed by the client.
            break;
        }

        previous = Some(resized);
        finish_frame(cfg, metrics, &mut controller, frame_start);
    }

    let _ = stream.flush();
    info!(pipeline = %cfg.name, "consumer exiting");
}

fn protocol_packet_len(data_len: usize) -> usize {
    crate::protocol::HEADER_LEN + data_len
}

fn finish_frame(cfg: &PipelineConfig, metrics: &Arc<PipelineMetrics>, controller: &mut ThresholdController, frame_start: Instant) {
    metrics.frame_processed(&cfg.name);
    let elapsed = frame_start.elapsed();
    metrics.observe_stage(&cfg.name, "full_frame", elapsed.as_secs_f64());
    if let Some(fps) = controller.record_frame(elapsed) {
        metrics.set_consumer_calculated_fps(&cfg.name, fps as f64);
    }
    metrics.set_current_dynamic_threshold(&cfg.name, controller.threshold());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame_queue::FrameQueue;
    use std::net::{TcpListener, TcpStream};
    use std::thread;

    fn loopback_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = thread::spawn(move || TcpStream::connect(addr).unwrap());
        let (server, _) = listener.accept().unwrap();
        (server, client.join().unwrap())
    }

    #[test]
    fn first_frame_is_sent_as_full_frame_packet() {
        let cfg = PipelineConfig::with_defaults("consumer-test", 9300, 4, 2);
        let queue = FrameQueue::new(cfg.queue_capacity);
        let stop = AtomicBool::new(false);
        let metrics = crate::metrics::test_metrics();

        let (mut server_stream, mut client_stream) = loopback_pair();

        queue.try_put(Image::solid(4, 2, [255, 0, 0]), Duration::from_millis(50)).unwrap();

        let cfg_clone = cfg.clone();
        let stop_flag = &stop;
        thread::scope(|scope| {
            scope.spawn(|| {
                run(&cfg_clone, &queue, stop_flag, &mut server_stream, &metrics);
            });

            let mut header = [0u8; 12];
            use std::io::Read;
            client_stream.read_exact(&mut header).unwrap();
            assert_eq!(header, [0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x02, 0x00, 0x00, 0x00, 0x10]);

            let mut payload = vec![0u8; 16];
            client_stream.read_exact(&mut payload).unwrap();
            for pair in payload.chunks_exact(2) {
                assert_eq!(pair, [0xF8, 0x00]);
            }

            stop_flag.store(true, Ordering::Release);
        });
    }

    #[test]
    fn identical_second_frame_emits_no_packet() {
        let cfg = PipelineConfig::with_defaults("consumer-test-2", 9301, 2, 2);
        let queue = FrameQueue::new(cfg.queue_capacity);
        let stop = AtomicBool::new(false);
        let metrics = crate::metrics::test_metrics();

        let (mut server_stream, mut client_stream) = loopback_pair();

        queue.try_put(Image::solid(2, 2, [10, 10, 10]), Duration::from_millis(50)).unwrap();
        queue.try_put(Image::solid(2, 2, [10, 10, 10]), Duration::from_millis(50)).unwrap();

        let cfg_clone = cfg.clone();
        let stop_flag = &stop;
        thread::scope(|scope| {
            scope.spawn(|| {
                run(&cfg_clone, &queue, stop_flag, &mut server_stream, &metrics);
            });

            use std::io::Read;
            let mut header = [0u8; 12];
            client_stream.read_exact(&mut header).unwrap();
            let mut payload = vec![0u8; 8];
            client_stream.read_exact(&mut payload).unwrap();

            // No second packet should ever arrive; give the consumer time to
            // have processed the identical second frame, then stop it.
            thread::sleep(Duration::from_millis(100));
            stop_flag.store(true, Ordering::Release);

            client_stream.set_read_timeout(Some(Duration::from_millis(100))).unwrap();
            let mut probe = [0u8; 1];
            let res = client_stream.read(&mut probe);
            assert!(res.is_err() || res.unwrap() == 0);
        });
    }
}
