//! mini-goga binary

use clap::Parser;
use probe_server::{Args, Config, ProbeServer, setup_tracing_with_otel, shutdown_signal};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    // Tracing is not initialized yet
    let config = match Config::load(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    let _telemetry_guard = setup_tracing_with_otel(&config.logging, &config.telemetry).await?;

    match &config.source {
        Some(path) => tracing::info!("Loaded configuration from: {}", path.display()),
        None => tracing::info!("No configuration file found, using defaults"),
    }

    let server_config = config.to_server_config()?;
    tracing::info!(
        targets_path = %server_config.targets_path.display(),
        "Configuration loaded"
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    let result = ProbeServer::new(server_config).run(shutdown).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "mini-goga exited with error");
    }

    // Telemetry guard flushes spans on drop
    result
}
