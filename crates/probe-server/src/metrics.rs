//! Prometheus exposition of the probe metrics store.

use probe::{MetricsSnapshot, MetricsStore, TargetState};
use prometheus_client::collector::Collector;
use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{DescriptorEncoder, EncodeLabelSet, EncodeMetric};
use prometheus_client::metrics::MetricType;
use prometheus_client::metrics::counter::ConstCounter;
use prometheus_client::metrics::gauge::ConstGauge;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Labels for per-target metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TargetLabels {
    /// Target URL
    pub url: String,
}

/// Labels for the one-hot status code metric
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct StatusCodeLabels {
    /// Target URL
    pub url: String,
    /// HTTP status code
    pub code: String,
}

/// Metrics registry backed by a [`MetricsStore`].
///
/// Nothing is copied into gauges ahead of time: every scrape takes a fresh
/// snapshot of the store and encodes it.
pub struct MetricsRegistry {
    /// Prometheus registry
    pub registry: Registry,
}

impl MetricsRegistry {
    /// Create a registry exposing `store`.
    ///
    /// `status_codes` are always emitted as one-hot series (0 or 1) for every
    /// target that has answered at least once.
    pub fn new(store: Arc<MetricsStore>, status_codes: &[u16]) -> Self {
        let mut registry = Registry::default();
        let mut codes = Vec::with_capacity(status_codes.len());
        for &code in status_codes {
            if !codes.contains(&code) {
                codes.push(code);
            }
        }

        registry.register_collector(Box::new(SnapshotCollector {
            store,
            status_codes: codes,
        }));

        Self { registry }
    }

    /// Encode the current state in text exposition format
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

/// Collector that reads the store on every scrape
#[derive(Debug)]
struct SnapshotCollector {
    store: Arc<MetricsStore>,
    status_codes: Vec<u16>,
}

impl Collector for SnapshotCollector {
    fn encode(&self, mut encoder: DescriptorEncoder) -> Result<(), std::fmt::Error> {
        let snapshot = self.store.snapshot();

        encode_per_target(
            &mut encoder,
            &snapshot,
            "mini_goga_target_up",
            "Whether the target is up (1) or down (0).",
            |state| Some(i64::from(state.up)),
        )?;

        encode_per_target(
            &mut encoder,
            &snapshot,
            "mini_goga_target_response_ms",
            "Response time in milliseconds.",
            |state| state.latency_ms.map(saturating_i64),
        )?;

        let mut status = encoder.encode_descriptor(
            "mini_goga_target_status_code",
            "Status code one-hot. Label 'code' holds the HTTP status.",
            None,
            MetricType::Gauge,
        )?;
        for (target, state) in &snapshot.targets {
            let Some(active) = state.active_code else {
                continue;
            };
            for code in one_hot_codes(&self.status_codes, active) {
                let labels = StatusCodeLabels {
                    url: target.to_string(),
                    code: code.to_string(),
                };
                ConstGauge::new(i64::from(code == active)).encode(status.encode_family(&labels)?)?;
            }
        }

        let mut errors = encoder.encode_descriptor(
            "mini_goga_scrape_errors",
            "Total scrape errors per target.",
            None,
            MetricType::Counter,
        )?;
        for (target, state) in &snapshot.targets {
            let labels = TargetLabels {
                url: target.to_string(),
            };
            ConstCounter::new(state.errors_total).encode(errors.encode_family(&labels)?)?;
        }

        encode_per_target(
            &mut encoder,
            &snapshot,
            "mini_goga_last_success_timestamp",
            "Unix timestamp of last successful check.",
            |state| state.last_success.map(unix_seconds),
        )?;

        ConstGauge::new(saturating_i64(snapshot.len())).encode(encoder.encode_descriptor(
            "mini_goga_targets",
            "Number of configured targets.",
            None,
            MetricType::Gauge,
        )?)?;

        ConstCounter::new(snapshot.rounds.rounds_total).encode(encoder.encode_descriptor(
            "mini_goga_rounds",
            "Total completed probe rounds.",
            None,
            MetricType::Counter,
        )?)?;

        let last_round_ms = saturating_i64(snapshot.rounds.last_round_duration.as_millis());
        ConstGauge::new(last_round_ms).encode(
            encoder.encode_descriptor(
                "mini_goga_last_round_duration_ms",
                "Duration of the most recent probe round in milliseconds.",
                None,
                MetricType::Gauge,
            )?,
        )?;

        Ok(())
    }
}

/// Encode one gauge family with a `url` label, skipping targets with no value
fn encode_per_target(
    encoder: &mut DescriptorEncoder,
    snapshot: &MetricsSnapshot,
    name: &str,
    help: &str,
    value: impl Fn(&TargetState) -> Option<i64>,
) -> Result<(), std::fmt::Error> {
    let mut family = encoder.encode_descriptor(name, help, None, MetricType::Gauge)?;
    for (target, state) in &snapshot.targets {
        let Some(value) = value(state) else {
            continue;
        };
        let labels = TargetLabels {
            url: target.to_string(),
        };
        ConstGauge::new(value).encode(family.encode_family(&labels)?)?;
    }
    Ok(())
}

/// Enumerated codes followed by the active code when it is not one of them
fn one_hot_codes(enumerated: &[u16], active: u16) -> impl Iterator<Item = u16> + '_ {
    let extra = (!enumerated.contains(&active)).then_some(active);
    enumerated.iter().copied().chain(extra)
}

/// Clamp an unsigned value into a gauge
fn saturating_i64<T: TryInto<i64>>(value: T) -> i64 {
    value.try_into().unwrap_or(i64::MAX)
}

/// Seconds since the epoch, zero for times before it
fn unix_seconds(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| saturating_i64(d.as_secs()))
        .unwrap_or_default()
}
