//! One accepted client's lifetime: Starting, Active, Draining.

use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::frame_queue::FrameQueue;
use crate::metrics::PipelineMetrics;
use crate::source::ImageSource;
use crate::{consumer, producer};

const JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Spawns Producer and Consumer for one client connection and tears both
/// down on disconnect, error, or a global shutdown request.
pub struct Session {
    stop: Arc<AtomicBool>,
    producer_handle: Option<JoinHandle<()>>,
    consumer_handle: Option<JoinHandle<()>>,
}

impl Session {
    /// Starting: fresh queue, fresh stop signal, fresh source, spawn both
    /// threads against a freshly accepted socket.
    pub fn start(
        cfg: Arc<PipelineConfig>,
        mut stream: TcpStream,
        source: Box<dyn ImageSource>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        if let Err(err) = stream.set_nodelay(true) {
            warn!(pipeline = %cfg.name, error = %err, "failed to set TCP_NODELAY");
        }
        if let Err(err) = stream.set_read_timeout(Some(cfg.socket_timeout)) {
            warn!(pipeline = %cfg.name, error = %err, "failed to set socket read timeout");
        }

        let queue = Arc::new(FrameQueue::new(cfg.queue_capacity));
        let stop = Arc::new(AtomicBool::new(false));

        let producer_handle = {
            let cfg = Arc::clone(&cfg);
            let queue = Arc::clone(&queue);
            let stop = Arc::clone(&stop);
            let metrics = Arc::clone(&metrics);
            std::thread::Builder::new()
                .name(format!("{}-producer", cfg.name))
                .spawn(move || producer::run(&cfg, &queue, &stop, source, &metrics))
                .expect("failed to spawn producer thread")
        };

        let consumer_handle = {
            let cfg = Arc::clone(&cfg);
            let queue = Arc::clone(&queue);
            let stop = Arc::clone(&stop);
            let metrics = Arc::clone(&metrics);
            std::thread::Builder::new()
                .name(format!("{}-consumer", cfg.name))
                .spawn(move || {
                    consumer::run(&cfg, &queue, &stop, &mut stream, &metrics);
                    queue.drain();
                })
                .expect("failed to spawn consumer thread")
        };

        info!(pipeline = %cfg.name, "session started");

        Session { stop, producer_handle: Some(producer_handle), consumer_handle: Some(consumer_handle) }
    }

    /// `true` once both the Producer and Consumer threads have exited, i.e.
    /// the session is ready to be drained without blocking.
    pub fn is_finished(&self) -> bool {
        let producer_done = self.producer_handle.as_ref().map(JoinHandle::is_finished).unwrap_or(true);
        let consumer_done = self.consumer_handle.as_ref().map(JoinHandle::is_finished).unwrap_or(true);
        producer_done && consumer_done
    }

    /// Draining: raise the stop signal and join both threads with a bounded
    /// timeout. A thread that outlives the timeout is logged and abandoned,
    /// since the caller is either tearing down for a new client or exiting
    /// the process outright.
    pub fn stop_and_join(mut self, pipeline_name: &str) {
        self.stop.store(true, Ordering::Release);

        if let Some(handle) = self.producer_handle.take() {
            join_with_timeout(handle, pipeline_name, "producer");
        }
        if let Some(handle) = self.consumer_handle.take() {
            join_with_timeout(handle, pipeline_name, "consumer");
        }

        info!(pipeline = %pipeline_name, "session drained");
    }
}

fn join_with_timeout(handle: JoinHandle<()>, pipeline_name: &str, role: &str) {
    let deadline = std::time::Instant::now() + JOIN_TIMEOUT;
    while !handle.is_finished() && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    if !handle.is_finished() {
        warn!(pipeline = %pipeline_name, role, "thread did not exit within join timeout, abandoning");
        return;
    }
    if let Err(panic) = handle.join() {
        warn!(pipeline = %pipeline_name, role, ?panic, "thread panicked");
    }
}
