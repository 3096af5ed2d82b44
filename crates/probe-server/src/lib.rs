//! mini-goga server
//!
//! Probes a list of HTTP targets on a fixed interval and serves the latest
//! observation per target as Prometheus metrics.
//!
//! # Components
//!
//! - **Config**: YAML settings with command line and environment overrides
//! - **Scheduler**: the probing engine from the `probe` crate
//! - **Metrics**: a collector that encodes a fresh store snapshot per scrape
//! - **HTTP server**: `/metrics` and `/health` over axum
//! - **Telemetry**: log output and optional OTLP span export
//!
//! # Lifecycle
//!
//! Targets are read once at startup. SIGINT or SIGTERM cancels a shared
//! token: the HTTP server drains, the scheduler lets the current round
//! finish, and the process exits.

pub mod config;
pub mod http_server;
pub mod metrics;
pub mod server;
pub mod telemetry;
pub mod types;

pub use config::{Args, Config, ConfigError};
pub use http_server::MetricsServer;
pub use metrics::MetricsRegistry;
pub use server::{ProbeServer, shutdown_signal};
pub use telemetry::{TelemetryGuard, init_telemetry, setup_tracing_with_otel};
pub use types::ServerConfig;
