//! Area sentinel monitor binary.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sentinel_worker::{
    metrics, open_frame_source, AlertDispatcher, FrameProcessor, HttpAlertSink, HttpLandmarkSource,
    Monitor, MonitorConfig,
};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("sentinel=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting sentinel-monitor");

    if let Err(e) = run().await {
        error!("Monitor error: {:#}", e);
        std::process::exit(1);
    }

    info!("Monitor shutdown complete");
}

async fn run() -> anyhow::Result<()> {
    // Load configuration
    let config = MonitorConfig::from_env();
    config.validate()?;
    info!("Monitor config: {:?}", config);

    if let Some(port) = config.metrics_port {
        metrics::install_exporter(port)?;
        info!("Prometheus exporter listening on port {}", port);
    }

    let handle = Handle::current();
    let sink = Arc::new(HttpAlertSink::new(&config.dispatch)?);
    info!("Alerts go to {}", sink.url());
    let dispatcher = Arc::new(AlertDispatcher::new(sink, &config.dispatch, handle.clone()));

    let landmarks = HttpLandmarkSource::new(&config.landmarks, handle)?;
    let frames = open_frame_source(&config.source)?;
    let processor = FrameProcessor::new(config.detection.clone(), config.alerts.clone());
    let monitor = Monitor::new(
        frames,
        Box::new(landmarks),
        processor,
        dispatcher,
        config.source.mirror,
    );

    // Setup signal handler
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_tx.send(true).ok();
    });

    // In-flight alerts are drained before an error is returned
    let drain = config.dispatch.timeout + Duration::from_secs(1);
    let summary = monitor.run_to_completion(shutdown_rx, drain).await?;
    info!(
        frames_processed = summary.frames_processed,
        frames_skipped = summary.frames_skipped,
        alerts_emitted = summary.alerts_emitted,
        alerts_dropped = summary.alerts_dropped,
        "Monitor finished"
    );
    Ok(())
}
