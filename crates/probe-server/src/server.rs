//! Main mini-goga server implementation.

use crate::http_server::MetricsServer;
use crate::metrics::MetricsRegistry;
use crate::types::ServerConfig;
use probe::client::build_client;
use probe::{HttpProber, MetricsStore, Scheduler, TargetRegistry};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Prober server: scheduler plus exposition endpoint
pub struct ProbeServer {
    config: ServerConfig,
    store: Arc<MetricsStore>,
}

impl ProbeServer {
    /// Create a new server
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            store: Arc::new(MetricsStore::new()),
        }
    }

    /// Shared metrics store
    pub fn store(&self) -> Arc<MetricsStore> {
        self.store.clone()
    }

    /// Bind the configured address and run until `shutdown` is cancelled
    pub async fn run(
        self,
        shutdown: CancellationToken,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let listener = TcpListener::bind(self.config.listen_addr).await?;
        self.run_with_listener(listener, shutdown).await
    }

    /// Run on an already bound listener until `shutdown` is cancelled.
    ///
    /// The target list is read before anything starts; an unreadable file is
    /// returned as an error. On shutdown the HTTP server drains and the
    /// scheduler finishes its current round before this returns.
    pub async fn run_with_listener(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let targets = TargetRegistry::load(&self.config.targets_path)?;
        if targets.is_empty() {
            warn!(
                path = %self.config.targets_path.display(),
                "No targets configured, exposition will be empty"
            );
        }

        let client = build_client(&self.config.client, self.config.timeout)?;
        let prober = Arc::new(HttpProber::new(client, self.config.timeout));

        info!(
            targets = targets.len(),
            interval = ?self.config.interval,
            timeout = ?self.config.timeout,
            listen_addr = %listener.local_addr()?,
            "Starting mini-goga"
        );

        let scheduler = Scheduler::new(
            targets,
            prober,
            self.store.clone(),
            self.config.interval,
        );
        let scheduler_handle = tokio::spawn(scheduler.run(shutdown.clone()));

        let registry = Arc::new(MetricsRegistry::new(
            self.store.clone(),
            &self.config.status_codes,
        ));
        let server = MetricsServer::new(registry, self.config.request_timeout);
        let served = server.serve(listener, shutdown.clone()).await;

        // Stop the scheduler even when the server failed on its own
        shutdown.cancel();
        if let Err(e) = scheduler_handle.await {
            warn!(error = %e, "Scheduler task failed");
        }

        served?;
        info!("mini-goga stopped");
        Ok(())
    }
}

/// Resolve when SIGINT or SIGTERM is received
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use std::time::Duration;

    fn config(targets_path: PathBuf) -> ServerConfig {
        ServerConfig {
            targets_path,
            interval: Duration::from_millis(50),
            timeout: Duration::from_millis(200),
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_missing_target_file_is_fatal() {
        let server = ProbeServer::new(config(PathBuf::from("/nonexistent/targets.txt")));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();

        let result = server
            .run_with_listener(listener, CancellationToken::new())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_empty_target_file_runs() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let server = ProbeServer::new(config(file.path().to_path_buf()));
        let store = server.store();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(server.run_with_listener(listener, shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
        assert!(store.is_empty());
        assert!(store.rounds().rounds_total >= 1);
    }

    #[tokio::test]
    async fn test_targets_are_registered_before_first_round() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment\nhttp://127.0.0.1:1/\n").unwrap();

        let mut cfg = config(file.path().to_path_buf());
        cfg.interval = Duration::from_secs(60);
        let server = ProbeServer::new(cfg);
        let store = server.store();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let shutdown = CancellationToken::new();

        let handle = tokio::spawn(server.run_with_listener(listener, shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let state = store.get("http://127.0.0.1:1/").unwrap();
        assert!(!state.up);
        assert_eq!(state.errors_total, 0);

        shutdown.cancel();
        assert!(handle.await.unwrap().is_ok());
    }
}
