use anyhow::{Context, Result};
use clap::Parser;
use live_transcribe::{
    create_router, AppState, Config, HttpTranscriber, PipelineSupervisor, SessionRegistry,
    Transcriber, WavStore,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "live-transcribe", about = "Live audio transcription server")]
struct Cli {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/live-transcribe")]
    config: String,

    /// Override the configured bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override the configured port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config))?;

    let bind = cli.bind.unwrap_or_else(|| cfg.service.http.bind.clone());
    let port = cli.port.unwrap_or(cfg.service.http.port);

    info!("{} starting", cfg.service.name);

    // Composition root: everything the handlers touch is built here
    // and passed down explicitly.
    let store = Arc::new(
        WavStore::new(
            &cfg.audio.storage_path,
            cfg.audio.sample_rate,
            cfg.audio.channels,
        )
        .context("failed to initialize audio storage")?,
    );

    // reqwest's blocking client must be built off the async runtime
    let endpoint = cfg.transcriber.endpoint.clone();
    let request_timeout = Duration::from_secs(cfg.transcriber.request_timeout_secs);
    let (sample_rate, channels) = (cfg.audio.sample_rate, cfg.audio.channels);
    let transcriber: Arc<dyn Transcriber> = Arc::new(
        tokio::task::spawn_blocking(move || {
            HttpTranscriber::new(&endpoint, request_timeout, sample_rate, channels)
        })
        .await
        .context("transcriber init task failed")?
        .context("failed to initialize transcriber")?,
    );

    let registry = Arc::new(SessionRegistry::new(cfg.pipeline.outbound_queue_capacity));
    let pipeline = Arc::new(
        PipelineSupervisor::start(&cfg.pipeline, store, transcriber, Arc::clone(&registry))
            .context("failed to start pipeline")?,
    );

    let app = create_router(AppState::new(registry, Arc::clone(&pipeline)));

    let addr = format!("{}:{}", bind, port);
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, draining pipeline workers");
    let timeout = cfg.pipeline.shutdown_timeout();
    let stop = tokio::task::spawn_blocking(move || pipeline.stop(timeout)).await?;
    if let Err(e) = stop {
        warn!("Pipeline shutdown incomplete: {}", e);
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
