//! Accept loop: the Idle state of the session lifecycle.
//!
//! One Listener owns one bound `TcpListener` and runs exactly one `Session`
//! at a time, serially: a second client cannot connect until the first is
//! fully drained.

use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Socket, Type};
use tracing::{error, info, warn};

use crate::config::PipelineConfig;
use crate::error::FrameError;
use crate::metrics::PipelineMetrics;
use crate::session::Session;
use crate::source::ImageSource;

const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// A fresh `ImageSource` for each accepted client. The server never
/// constructs sources itself; callers supply a factory instead.
pub type SourceFactory = Box<dyn Fn() -> Box<dyn ImageSource> + Send + Sync>;

pub struct Listener {
    cfg: Arc<PipelineConfig>,
    listener: TcpListener,
    metrics: Arc<PipelineMetrics>,
    source_factory: SourceFactory,
}

impl Listener {
    pub fn bind(cfg: Arc<PipelineConfig>, metrics: Arc<PipelineMetrics>, source_factory: SourceFactory) -> Result<Self, FrameError> {
        let addr = format!("0.0.0.0:{}", cfg.listen_port).parse().expect("well-formed socket address");
        let listener = bind_with_reuseaddr(addr).map_err(|source| FrameError::BindFailure {
            pipeline: cfg.name.clone(),
            port: cfg.listen_port,
            source,
        })?;

        info!(pipeline = %cfg.name, port = cfg.listen_port, "listening");
        Ok(Self { cfg, listener, metrics, source_factory })
    }

    /// Idle -> Starting -> Active -> Draining -> Idle, repeating until
    /// `global_stop` fires.
    pub fn run(&self, global_stop: &AtomicBool) {
        // `set_read_timeout` has no equivalent on `TcpListener` across all
        // platforms for `accept`, so the timeout is approximated with a
        // short poll-and-retry loop driven by `set_nonblocking`.
        if let Err(err) = self.listener.set_nonblocking(true) {
            error!(pipeline = %self.cfg.name, error = %err, "failed to set listener non-blocking, cannot poll shutdown");
            return;
        }

        while !global_stop.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    self.metrics.reconnection(&self.cfg.name);
                    info!(pipeline = %self.cfg.name, %peer, "client accepted");

                    let source = (self.source_factory)();
                    let session = Session::start(Arc::clone(&self.cfg), stream, source, Arc::clone(&self.metrics));

                    while !session.is_finished() && !global_stop.load(Ordering::Acquire) {
                        std::thread::sleep(Duration::from_millis(20));
                    }
                    session.stop_and_join(&self.cfg.name);
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(err) => {
                    warn!(pipeline = %self.cfg.name, error = %err, "accept failed, backing off");
                    std::thread::sleep(ACCEPT_ERROR_BACKOFF);
                }
            }
        }

        info!(pipeline = %self.cfg.name, "listener terminated");
    }
}

fn bind_with_reuseaddr(addr: std::net::SocketAddr) -> std::io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, None)?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;
    Ok(socket.into())
}
