//! Blackbox availability probing for mini-goga.
//!
//! This crate is the probing engine: it loads a list of target URLs, probes
//! each of them with an HTTP GET on a fixed interval, and keeps the latest
//! observation per target in an in-memory store that an exposition endpoint
//! can read at any time.
//!
//! # Components
//!
//! - **Target registry**: ordered, immutable list of URLs read from a text file
//! - **Probe client**: one pooled `reqwest` client shared by every probe
//! - **Prober**: one bounded GET per attempt, classified as up or failed
//! - **Scheduler**: fixed-interval fan-out with a join barrier per round
//! - **Metrics store**: latest state per target, safe for concurrent readers
//!
//! # Example
//!
//! ```no_run
//! use probe::{HttpProber, MetricsStore, Scheduler, TargetRegistry, client};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let timeout = Duration::from_secs(5);
//! let targets = TargetRegistry::load("config.cfg")?;
//! let http = client::build_client(&client::ClientConfig::default(), timeout)?;
//!
//! let store = Arc::new(MetricsStore::new());
//! let scheduler = Scheduler::new(
//!     targets,
//!     Arc::new(HttpProber::new(http, timeout)),
//!     store.clone(),
//!     Duration::from_secs(15),
//! );
//!
//! let shutdown = CancellationToken::new();
//! tokio::spawn(scheduler.run(shutdown.clone()));
//!
//! // Read the latest state from anywhere
//! let snapshot = store.snapshot();
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod prober;
pub mod scheduler;
pub mod state;
pub mod targets;
pub mod types;

pub use client::ClientConfig;
pub use prober::{HttpProber, Prober};
pub use scheduler::Scheduler;
pub use state::MetricsStore;
pub use targets::TargetRegistry;
pub use types::{
    DEFAULT_STATUS_CODES, MetricsSnapshot, ProbeOutcome, RoundStats, RoundSummary, Target,
    TargetState,
};
