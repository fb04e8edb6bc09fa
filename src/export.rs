//! OTLP export pipeline.
//!
//! Builds the metrics backend the generator reports through: an OTLP/HTTP
//! exporter with cumulative temporality behind a periodic reader that pulls
//! the asynchronous instruments and ships a batch on its own collection
//! clock. Shutdown performs one bounded-time final flush; a timeout or
//! failure there is surfaced but never fatal.

use std::time::Duration;

use opentelemetry::global;
use opentelemetry_otlp::{MetricExporter, Protocol, WithExportConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider, Temporality};
use opentelemetry_sdk::Resource;
use thiserror::Error;

/// Environment variable overriding the export target.
pub const ENDPOINT_ENV_VAR: &str = "OTLP_EXPORTER_OTLP_ENDPOINT";

/// Default export target when no override is present.
pub const DEFAULT_ENDPOINT: &str = "0.0.0.0:4318";

/// Default collection period of the periodic reader (3 seconds), distinct
/// from the synchronous update interval.
pub const DEFAULT_COLLECT_PERIOD: Duration = Duration::from_secs(3);

/// Hard timeout for the final flush at shutdown (1 second).
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// OTLP metrics path appended when the endpoint carries none.
const METRICS_PATH: &str = "/v1/metrics";

/// Export pipeline errors.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Failed to construct the OTLP exporter.
    #[error("failed to build OTLP exporter: {0}")]
    Exporter(String),

    /// Final flush did not complete within the timeout.
    #[error("export flush timed out after {0:?}")]
    FlushTimeout(Duration),

    /// Final flush completed with an error.
    #[error("export flush failed: {0}")]
    Flush(String),
}

/// Resolve the export endpoint to a full OTLP/HTTP metrics URL.
///
/// Priority: explicit override (CLI), then [`ENDPOINT_ENV_VAR`], then
/// [`DEFAULT_ENDPOINT`]. Bare `host:port` targets get an insecure `http://`
/// scheme and the standard metrics path.
pub fn resolve_endpoint(override_endpoint: Option<String>) -> String {
    let endpoint = override_endpoint
        .or_else(|| std::env::var(ENDPOINT_ENV_VAR).ok())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let with_scheme = if endpoint.contains("://") {
        endpoint
    } else {
        format!("http://{}", endpoint)
    };

    if with_scheme.ends_with(METRICS_PATH) {
        with_scheme
    } else {
        format!("{}{}", with_scheme.trim_end_matches('/'), METRICS_PATH)
    }
}

/// Build the exporter controller: OTLP exporter, periodic reader, provider.
///
/// The returned provider is also installed as the global meter provider.
/// The reader invokes registered observation callbacks once per
/// `collect_period` and pushes the batch to `endpoint`.
///
/// # Errors
/// Returns `ExportError::Exporter` if the OTLP exporter cannot be built.
pub fn init_provider(
    endpoint: &str,
    collect_period: Duration,
) -> Result<SdkMeterProvider, ExportError> {
    let exporter = MetricExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint)
        .with_temporality(Temporality::Cumulative)
        .build()
        .map_err(|e| ExportError::Exporter(e.to_string()))?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(collect_period)
        .build();

    let provider = SdkMeterProvider::builder()
        .with_resource(Resource::builder().with_service_name("mirage").build())
        .with_reader(reader)
        .build();

    global::set_meter_provider(provider.clone());

    tracing::info!(endpoint, collect_period = ?collect_period, "Export pipeline started");
    Ok(provider)
}

/// Shut the provider down, flushing any last batch within `timeout`.
///
/// The provider's shutdown blocks on the final export, so it runs on a
/// blocking task under a hard timeout. On expiry the flush is abandoned;
/// the caller logs the error and exits anyway.
///
/// # Errors
/// Returns `ExportError::FlushTimeout` on expiry or `ExportError::Flush` if
/// the backend reports a failure.
pub async fn shutdown_with_timeout(
    provider: SdkMeterProvider,
    timeout: Duration,
) -> Result<(), ExportError> {
    let shutdown = tokio::task::spawn_blocking(move || provider.shutdown());

    match tokio::time::timeout(timeout, shutdown).await {
        Ok(Ok(Ok(()))) => Ok(()),
        Ok(Ok(Err(e))) => Err(ExportError::Flush(e.to_string())),
        Ok(Err(join_err)) => Err(ExportError::Flush(join_err.to_string())),
        Err(_) => Err(ExportError::FlushTimeout(timeout)),
    }
}
