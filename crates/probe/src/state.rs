//! In-memory metrics state shared by the scheduler and the exposition endpoint.

use crate::types::{
    MetricsSnapshot, ProbeOutcome, RoundStats, Target, TargetState, is_success_code,
};
use dashmap::DashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, SystemTime};

/// Latest observation per target.
///
/// Each target's fields are replaced under a single entry lock, so a reader
/// never sees `up`, latency and status code from different rounds.
/// Consistency across targets is not guaranteed.
#[derive(Debug, Default)]
pub struct MetricsStore {
    targets: DashMap<Target, TargetState>,
    rounds: RwLock<RoundStats>,
}

impl MetricsStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entry for every target that has none yet
    pub fn register<'a>(&self, targets: impl IntoIterator<Item = &'a Target>) {
        for target in targets {
            self.targets.entry(target.clone()).or_default();
        }
    }

    /// Record a response.
    ///
    /// `status_code` becomes the only active code for the target. A 2xx or
    /// 3xx code also moves `last_success` to `now`.
    pub fn record_success(
        &self,
        target: &Target,
        status_code: u16,
        latency_ms: u64,
        now: SystemTime,
    ) {
        let mut entry = self.targets.entry(target.clone()).or_default();
        let state = entry.value_mut();

        state.up = true;
        state.latency_ms = Some(latency_ms);
        state.active_code = Some(status_code);
        if is_success_code(status_code) {
            state.last_success = Some(now);
        }
        state.last_observed = Some(now);
    }

    /// Record a failed probe.
    ///
    /// Latency and the active code keep their last known values.
    pub fn record_failure(&self, target: &Target, now: SystemTime) {
        let mut entry = self.targets.entry(target.clone()).or_default();
        let state = entry.value_mut();

        state.up = false;
        state.errors_total += 1;
        state.last_observed = Some(now);
    }

    /// Fold a probe outcome into the store
    pub fn record(&self, target: &Target, outcome: &ProbeOutcome) {
        match (outcome.up, outcome.status_code) {
            (true, Some(code)) => self.record_success(
                target,
                code,
                outcome.latency_ms.unwrap_or_default(),
                outcome.observed_at,
            ),
            _ => self.record_failure(target, outcome.observed_at),
        }
    }

    /// Record a completed scheduler round
    pub fn record_round(&self, duration: Duration, now: SystemTime) {
        let mut rounds = self.rounds.write().unwrap_or_else(PoisonError::into_inner);
        rounds.rounds_total += 1;
        rounds.last_round_duration = duration;
        rounds.last_round_at = Some(now);
    }

    /// Current state of one target
    pub fn get(&self, target: &str) -> Option<TargetState> {
        self.targets.get(target).map(|entry| entry.value().clone())
    }

    /// Scheduler statistics
    pub fn rounds(&self) -> RoundStats {
        *self.rounds.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of tracked targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether no target is tracked
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Copy the current state, ordered by target
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut targets: Vec<(Target, TargetState)> = self
            .targets
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        targets.sort_by(|(a, _), (b, _)| a.cmp(b));

        MetricsSnapshot {
            targets,
            rounds: self.rounds(),
        }
    }
}
