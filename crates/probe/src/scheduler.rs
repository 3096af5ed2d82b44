//! Fixed-interval probe scheduling.

use crate::prober::Prober;
use crate::state::MetricsStore;
use crate::targets::TargetRegistry;
use crate::types::{ProbeOutcome, RoundSummary, Target};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shortest accepted round interval
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Probes every target once per interval.
///
/// A round fans out one task per target and waits for all of them before the
/// outcomes are folded into the store. Rounds never overlap: a round that
/// outlasts the interval delays the next tick instead of queueing more.
pub struct Scheduler {
    targets: TargetRegistry,
    prober: Arc<dyn Prober>,
    store: Arc<MetricsStore>,
    interval: Duration,
}

impl Scheduler {
    /// Create a scheduler and seed the store with every target
    pub fn new(
        targets: TargetRegistry,
        prober: Arc<dyn Prober>,
        store: Arc<MetricsStore>,
        interval: Duration,
    ) -> Self {
        store.register(targets.iter());

        Self {
            targets,
            prober,
            store,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// The first round starts one interval after the call. Cancellation is
    /// only observed between rounds: a round in flight runs to completion
    /// (each probe is bounded by its own timeout) and is recorded.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            targets = self.targets.len(),
            interval_ms = self.interval.as_millis(),
            "Scheduler started"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // Skip first immediate tick

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_round().await;
                }
            }
        }
    }

    /// Probe every target once and record the outcomes
    pub async fn run_round(&self) -> RoundSummary {
        let start = Instant::now();
        let targets = self.targets.as_slice();

        let mut tasks = JoinSet::new();
        for (index, target) in targets.iter().enumerate() {
            let prober = self.prober.clone();
            let target = target.clone();
            tasks.spawn(async move { (index, prober.probe(&target).await) });
        }

        let mut outcomes: Vec<Option<ProbeOutcome>> = targets.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => warn!(error = %e, "Probe task did not complete"),
            }
        }

        let mut up = 0;
        for (target, outcome) in targets.iter().zip(outcomes) {
            let outcome = outcome.unwrap_or_else(|| Self::aborted(target));
            if outcome.up {
                up += 1;
            }
            self.store.record(target, &outcome);
        }

        let duration = start.elapsed();
        self.store.record_round(duration, SystemTime::now());

        let summary = RoundSummary {
            probed: targets.len(),
            up,
            down: targets.len() - up,
            duration,
        };
        debug!(
            probed = summary.probed,
            up = summary.up,
            down = summary.down,
            duration_ms = duration.as_millis(),
            "Probe round complete"
        );

        summary
    }

    /// Outcome for a target whose task panicked or was cancelled
    fn aborted(target: &Target) -> ProbeOutcome {
        warn!(url = %target, "Recording aborted probe as failure");
        ProbeOutcome::failure("probe task aborted", SystemTime::now())
    }

    /// Configured round interval
    pub fn interval(&self) -> Duration {
        self.interval
    }
}
