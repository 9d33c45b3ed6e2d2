use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{self, Context};
use framecast::config::PipelineConfig;
use framecast::listener::SourceFactory;
use framecast::metrics::{start_exporter, PipelineMetrics};
use framecast::source::MockSource;
use framecast::Pipeline;

/// Multi-pipeline framing server for embedded display clients.
#[derive(Parser, Debug)]
#[command(name = "framecastd")]
#[command(about = "Streams dirty-region RGB565 frames to embedded display clients over TCP")]
struct Args {
    /// Pipeline identity, used in logs and metric labels.
    #[arg(long, default_value = "default")]
    name: String,

    /// TCP port the pipeline listens on for its one display client.
    #[arg(long, default_value_t = 9100)]
    listen_port: u16,

    /// Display width in pixels.
    #[arg(long, default_value_t = 320)]
    target_width: u32,

    /// Display height in pixels.
    #[arg(long, default_value_t = 240)]
    target_height: u32,

    /// Gamma exponent applied before dithering.
    #[arg(long, default_value_t = 1.0)]
    gamma: f32,

    /// Target frames per second the adaptive threshold aims for.
    #[arg(long, default_value_t = 10.0)]
    target_fps: f32,

    /// Address the Prometheus exposition endpoint binds to.
    #[arg(long, default_value = "0.0.0.0:9898")]
    prometheus_listen_address: String,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    init_tracing();

    let args = Args::parse();

    let prometheus_addr: SocketAddr = args
        .prometheus_listen_address
        .parse()
        .context("invalid --prometheus-listen-address")?;
    start_exporter(prometheus_addr)?;

    let mut cfg = PipelineConfig::with_defaults(&args.name, args.listen_port, args.target_width, args.target_height);
    cfg.gamma = args.gamma;
    cfg.target_fps = args.target_fps;

    let metrics = Arc::new(PipelineMetrics::register()?);

    let source_factory: SourceFactory = {
        let (w, h) = (cfg.target_width, cfg.target_height);
        Box::new(move || Box::new(MockSource::new(w, h)) as Box<dyn framecast::source::ImageSource>)
    };

    let pipeline = Pipeline::new(cfg, metrics, source_factory)?;

    let global_stop = Arc::new(AtomicBool::new(false));
    {
        let global_stop = Arc::clone(&global_stop);
        ctrlc::set_handler(move || {
            tracing::info!("shutdown signal received");
            global_stop.store(true, Ordering::Release);
        })
        .context("failed to install signal handler")?;
    }

    pipeline.run(&global_stop);

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt().with_env_filter(filter).init();
}
