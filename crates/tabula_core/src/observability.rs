//! Tracing setup and optional OpenTelemetry fetch counters.

use tabula_error::ConfigError;
use tracing::{debug, info, instrument};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "metrics")]
use opentelemetry::{KeyValue, global, metrics::Counter};
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

/// Outcome of a fetch, as counted by [`record_fetch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum FetchOutcome {
    /// Request handed to the data source
    Issued,
    /// Result applied to the view
    Applied,
    /// Result dropped because a newer request superseded it
    Discarded,
    /// Data source reported an error
    Failed,
}

/// Installs a global `tracing` subscriber.
///
/// Reads `RUST_LOG` (default `info`). With `json` set, events are emitted as
/// one JSON object per line.
pub fn init_tracing(json: bool) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| ConfigError::new(format!("Failed to install tracing subscriber: {}", e)))
}

/// Initializes OpenTelemetry metrics with a stdout exporter.
///
/// When the `metrics` feature is disabled this only logs and returns.
#[instrument(skip_all, fields(service_name))]
pub fn init_metrics(service_name: &'static str, export_interval_secs: u64) {
    #[cfg(not(feature = "metrics"))]
    {
        let _ = export_interval_secs;
        info!(service_name, "Metrics feature disabled, skipping metrics initialization");
    }

    #[cfg(feature = "metrics")]
    {
        use opentelemetry_sdk::{
            Resource,
            metrics::{PeriodicReader, SdkMeterProvider},
        };
        use std::time::Duration;

        let resource = Resource::builder_empty()
            .with_attributes([KeyValue::new("service.name", service_name)])
            .build();
        let reader = PeriodicReader::builder(opentelemetry_stdout::MetricExporter::default())
            .with_interval(Duration::from_secs(export_interval_secs))
            .build();
        let provider = SdkMeterProvider::builder()
            .with_resource(resource)
            .with_reader(reader)
            .build();
        global::set_meter_provider(provider);
        info!(service_name, export_interval_secs, "Metrics initialized");
    }
}

#[cfg(feature = "metrics")]
fn fetch_counter() -> &'static Counter<u64> {
    static COUNTER: OnceLock<Counter<u64>> = OnceLock::new();
    COUNTER.get_or_init(|| global::meter("tabula").u64_counter("tabula.fetches").build())
}

/// Counts one fetch outcome for `table_id`.
pub fn record_fetch(table_id: &str, outcome: FetchOutcome) {
    debug!(table_id, %outcome, "Fetch outcome");
    #[cfg(feature = "metrics")]
    fetch_counter().add(
        1,
        &[
            KeyValue::new("table_id", table_id.to_string()),
            KeyValue::new("outcome", outcome.as_ref().to_string()),
        ],
    );
}
