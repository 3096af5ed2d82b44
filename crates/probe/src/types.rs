//! Probe types and structures.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Status codes exposed as one-hot series even before they are observed.
pub const DEFAULT_STATUS_CODES: [u16; 10] = [200, 301, 302, 400, 401, 403, 404, 500, 502, 503];

/// A probe target.
///
/// Identity is the URL string exactly as loaded: no case folding, no
/// normalization. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target(Arc<str>);

impl Target {
    /// Create a target from a URL string
    pub fn new(url: impl Into<Arc<str>>) -> Self {
        Self(url.into())
    }

    /// The target URL
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Target {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Target {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for Target {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

/// Result of a single probe attempt
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    /// Whether a response was received and fully read before the deadline
    pub up: bool,

    /// HTTP status code (successful probes only)
    pub status_code: Option<u16>,

    /// Dispatch to body-fully-read, in milliseconds (successful probes only)
    pub latency_ms: Option<u64>,

    /// Transport error description (failed probes only)
    pub error: Option<String>,

    /// When the request was dispatched
    pub started_at: SystemTime,

    /// When the outcome was classified
    pub observed_at: SystemTime,
}

impl ProbeOutcome {
    /// Create a successful outcome observed now
    pub fn success(status_code: u16, latency: Duration, started_at: SystemTime) -> Self {
        Self {
            up: true,
            status_code: Some(status_code),
            latency_ms: Some(u64::try_from(latency.as_millis()).unwrap_or(u64::MAX)),
            error: None,
            started_at,
            observed_at: SystemTime::now(),
        }
    }

    /// Create a failed outcome observed now
    pub fn failure(message: impl Into<String>, started_at: SystemTime) -> Self {
        Self {
            up: false,
            status_code: None,
            latency_ms: None,
            error: Some(message.into()),
            started_at,
            observed_at: SystemTime::now(),
        }
    }

    /// Check if the probe failed before a response could be read
    pub fn error_occurred(&self) -> bool {
        self.error.is_some()
    }
}

/// Latest known state of one target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetState {
    /// Outcome of the most recent probe
    pub up: bool,

    /// Latency of the most recent successful probe
    pub latency_ms: Option<u64>,

    /// Status code of the most recent successful probe (the one-hot code)
    pub active_code: Option<u16>,

    /// Failed probes since startup
    pub errors_total: u64,

    /// Last time a 2xx/3xx response was observed
    pub last_success: Option<SystemTime>,

    /// Last time any outcome was recorded
    pub last_observed: Option<SystemTime>,
}

/// Scheduler round statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundStats {
    /// Completed rounds since startup
    pub rounds_total: u64,

    /// Wall-clock length of the most recent round
    pub last_round_duration: Duration,

    /// When the most recent round completed
    pub last_round_at: Option<SystemTime>,
}

/// Summary of one completed round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    /// Targets probed
    pub probed: usize,

    /// Targets that answered
    pub up: usize,

    /// Targets that failed
    pub down: usize,

    /// Wall-clock length of the round
    pub duration: Duration,
}

/// Point-in-time copy of the metrics store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// Per-target state, ordered by target
    pub targets: Vec<(Target, TargetState)>,

    /// Scheduler statistics
    pub rounds: RoundStats,
}

impl MetricsSnapshot {
    /// Look up one target
    pub fn get(&self, target: &str) -> Option<&TargetState> {
        self.targets
            .binary_search_by(|(t, _)| t.as_str().cmp(target))
            .ok()
            .map(|i| &self.targets[i].1)
    }

    /// Number of targets in the snapshot
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the snapshot holds no targets
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Whether a status code counts as a success for `last_success` (2xx or 3xx)
pub fn is_success_code(code: u16) -> bool {
    (200..400).contains(&code)
}
