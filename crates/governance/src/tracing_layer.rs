//! Logging and distributed tracing configuration.

use concierge_core::{config::LoggingConfig, Error, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "voice-concierge";

/// Keeps the OTLP pipeline alive; flushes and shuts it down on drop.
#[derive(Default)]
pub struct TelemetryGuard {
    provider: Option<sdktrace::TracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are being exported.
    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("Failed to shut down OpenTelemetry pipeline: {}", e);
            }
        }
    }
}

/// Batch OTLP exporter to `endpoint`. Needs a running Tokio runtime.
fn otlp_provider(endpoint: &str) -> Result<sdktrace::TracerProvider> {
    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(
            sdktrace::Config::default()
                .with_resource(Resource::new(vec![KeyValue::new("service.name", SERVICE_NAME)])),
        )
        .install_batch(runtime::Tokio)
        .map_err(|e| Error::governance(format!("Failed to install OTLP pipeline: {}", e)))
}

/// Configure stdout logging plus OpenTelemetry export when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set. `RUST_LOG` overrides `config.filter`.
///
/// Hold the returned guard until shutdown.
pub fn configure_tracing(config: &LoggingConfig) -> Result<TelemetryGuard> {
    let env_filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| config.filter.clone()),
    );

    // Exactly one of these is Some
    let json_layer = config.json.then(|| tracing_subscriber::fmt::layer().json());
    let text_layer = (!config.json).then(|| tracing_subscriber::fmt::layer());

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer);

    let Ok(endpoint) = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") else {
        registry
            .try_init()
            .map_err(|e| Error::governance(format!("Failed to install subscriber: {}", e)))?;
        return Ok(TelemetryGuard::default());
    };

    let provider = otlp_provider(&endpoint)?;
    let tracer = provider.tracer(SERVICE_NAME);

    registry
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()
        .map_err(|e| Error::governance(format!("Failed to install subscriber: {}", e)))?;

    tracing::info!(endpoint = %endpoint, "OpenTelemetry tracing enabled");
    Ok(TelemetryGuard {
        provider: Some(provider),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // Batch export runs on the runtime; shutdown blocks, so use worker threads.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_otlp_provider_yields_tracer() {
        let provider = otlp_provider("http://127.0.0.1:4317").unwrap();
        let _tracer = provider.tracer(SERVICE_NAME);

        let guard = TelemetryGuard {
            provider: Some(provider),
        };
        assert!(guard.is_exporting());
        drop(guard);
    }

    #[test]
    fn test_default_guard_is_inert() {
        let guard = TelemetryGuard::default();
        assert!(!guard.is_exporting());
    }
}
