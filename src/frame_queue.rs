//! Bounded single-producer single-consumer frame queue.
//!
//! A thin wrapper over `crossbeam_channel::bounded`: `send_timeout`/
//! `recv_timeout` map directly onto the put/get-with-timeout semantics the
//! Producer and Consumer need (so the Consumer can poll its stop signal and
//! the Producer never stalls the pipeline), and `Receiver::len` gives the
//! water-mark check its depth reading for free. Shared between exactly one
//! Producer and one Consumer per session.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};
use imaging::Image;

pub struct FrameQueue {
    capacity: usize,
    tx: Sender<Image>,
    rx: Receiver<Image>,
}

impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "frame queue capacity must be nonzero");
        let (tx, rx) = bounded(capacity);
        Self { capacity, tx, rx }
    }

    /// Current number of queued frames. Never exceeds `capacity`.
    pub fn depth(&self) -> usize {
        self.rx.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Attempt to enqueue `image`, waiting up to `timeout` for room. On
    /// timeout (or a disconnected peer) the image is handed back to the
    /// caller so it can be counted as a dropped frame.
    pub fn try_put(&self, image: Image, timeout: Duration) -> Result<(), Image> {
        self.tx.send_timeout(image, timeout).map_err(|err| match err {
            SendTimeoutError::Timeout(image) => image,
            SendTimeoutError::Disconnected(image) => image,
        })
    }

    /// Block up to `timeout` for a frame. Returns `None` on timeout or
    /// disconnect, giving the caller a chance to check its stop signal.
    pub fn get(&self, timeout: Duration) -> Option<Image> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Discard every queued frame, used on session teardown.
    pub fn drain(&self) {
        while self.rx.try_recv().is_ok() {}
    }
}
