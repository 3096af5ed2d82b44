//! OpenTelemetry integration for distributed tracing
//!
//! Spans recorded with `tracing` can be exported to an OTLP collector over
//! gRPC or HTTP. When export is disabled only the local log layer is
//! installed.

use crate::config::{LoggingSettings, OtlpProtocol, TelemetrySettings};
use common::logging::{LogFormat, env_filter};
use opentelemetry::{KeyValue, trace::TracerProvider as _};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource, runtime,
    trace::{RandomIdGenerator, Sampler, TracerProvider},
};
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// OpenTelemetry tracer guard
///
/// When dropped, flushes all pending spans and shuts down the tracer
pub struct TelemetryGuard;

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        opentelemetry::global::shutdown_tracer_provider();
    }
}

/// Build a tracer provider exporting to `settings.otlp_endpoint`
fn build_provider(settings: &TelemetrySettings) -> Result<TracerProvider, BoxError> {
    let exporter = match settings.protocol {
        OtlpProtocol::Grpc => opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(settings.otlp_endpoint.as_str())
            .build()?,
        OtlpProtocol::Http => opentelemetry_otlp::SpanExporter::builder()
            .with_http()
            .with_endpoint(settings.otlp_endpoint.as_str())
            .build()?,
    };

    let resource = Resource::new(vec![
        KeyValue::new("service.name", settings.service_name.clone()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION").to_string()),
    ]);

    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(resource),
        )
        .build())
}

/// Initialize OpenTelemetry export.
///
/// Returns `None` when export is disabled. Otherwise the returned guard must
/// be kept alive for the duration of the program.
pub async fn init_telemetry(
    settings: &TelemetrySettings,
) -> Result<Option<(TelemetryGuard, TracerProvider)>, BoxError> {
    if !settings.enabled {
        return Ok(None);
    }

    let provider = build_provider(settings)?;
    opentelemetry::global::set_tracer_provider(provider.clone());

    Ok(Some((TelemetryGuard, provider)))
}

/// Setup tracing-subscriber with the configured log format and, when enabled,
/// an OpenTelemetry layer.
pub async fn setup_tracing_with_otel(
    logging: &LoggingSettings,
    telemetry: &TelemetrySettings,
) -> Result<Option<TelemetryGuard>, BoxError> {
    let level = logging.level.as_deref().unwrap_or("info");
    let format = LogFormat::from_name(logging.format.as_deref());

    let Some((guard, provider)) = init_telemetry(telemetry).await? else {
        common::logging::init_with(level, format);
        tracing::debug!("Tracing initialized without OpenTelemetry");
        return Ok(None);
    };

    let fmt_layer = match format {
        LogFormat::Text => tracing_subscriber::fmt::layer().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    };
    let otel_layer = tracing_opentelemetry::layer().with_tracer(provider.tracer("mini-goga"));

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()?;

    tracing::info!(
        service_name = %telemetry.service_name,
        otlp_endpoint = %telemetry.otlp_endpoint,
        protocol = ?telemetry.protocol,
        "Tracing initialized with OpenTelemetry integration"
    );

    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_telemetry_disabled() {
        let settings = TelemetrySettings::default();
        let result = init_telemetry(&settings).await;
        assert!(result.is_ok());
        assert!(result.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_telemetry_http_disabled() {
        let settings = TelemetrySettings {
            protocol: OtlpProtocol::Http,
            otlp_endpoint: "http://localhost:4318/v1/traces".to_string(),
            ..TelemetrySettings::default()
        };
        let result = init_telemetry(&settings).await;
        assert!(result.unwrap().is_none());
    }
}
