//! Instrument registry: the four metric handles and their registration.
//!
//! The registry owns one handle per synthetic metric:
//!
//! - `time_alive` — synchronous monotonic counter, pushed by the scheduler
//! - `cpu_usage` — asynchronous gauge, pulled by the exporter's reader
//! - `total_heap_size` — asynchronous up-down counter, pulled likewise
//! - `threads_active` — synchronous up-down counter, pushed by the scheduler
//!
//! The asynchronous instruments are wired to [`BoundedSampler`] callbacks at
//! registration time; the reader invokes each callback at most once per
//! collection period, on its own clock.

use opentelemetry::metrics::{
    Counter, Meter, ObservableGauge, ObservableUpDownCounter, UpDownCounter,
};
use thiserror::Error;

use crate::config::Config;
use crate::generator::random::BoundedSampler;

/// Name of the time-alive counter.
pub const TIME_ALIVE: &str = "time_alive";
/// Name of the CPU-usage gauge.
pub const CPU_USAGE: &str = "cpu_usage";
/// Name of the heap-size up-down counter.
pub const TOTAL_HEAP_SIZE: &str = "total_heap_size";
/// Name of the threads-active up-down counter.
pub const THREADS_ACTIVE: &str = "threads_active";

/// Maximum instrument name length accepted by the backend.
const MAX_NAME_LEN: usize = 255;

/// Instrument registration failures. Fatal at startup: the process must not
/// run with a half-registered instrument set.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The backend rejects the instrument name.
    #[error("invalid instrument name '{0}': must start with a letter, contain only \
             [A-Za-z0-9_.-/], and be at most 255 characters")]
    InvalidName(String),
}

/// Check a name against the backend's instrument-name grammar.
///
/// # Errors
/// Returns `RegistrationError::InvalidName` for names the meter would
/// silently turn into no-op instruments.
pub fn validate_instrument_name(name: &str) -> Result<(), RegistrationError> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '/'))
        && name.len() <= MAX_NAME_LEN;

    if valid {
        Ok(())
    } else {
        Err(RegistrationError::InvalidName(name.to_string()))
    }
}

/// The four registered metric handles.
///
/// Registration happens exactly once per process lifetime; the accumulated
/// and last-observed values live in the metrics backend, not here. Handles
/// are safe for concurrent use from multiple tasks, so no locking is added
/// around them.
pub struct InstrumentSet {
    time_alive: Counter<u64>,
    #[allow(dead_code)] // held for its registration; observed via callback
    cpu_usage: ObservableGauge<i64>,
    #[allow(dead_code)] // held for its registration; observed via callback
    total_heap_size: ObservableUpDownCounter<i64>,
    threads_active: UpDownCounter<i64>,
}

impl InstrumentSet {
    /// Register all four instruments against `meter`, snapshotting the bounds
    /// the asynchronous callbacks need from `config`.
    ///
    /// # Errors
    /// Returns `RegistrationError` if any instrument name is rejected.
    pub fn register(meter: &Meter, config: &Config) -> Result<Self, RegistrationError> {
        for name in [TIME_ALIVE, CPU_USAGE, TOTAL_HEAP_SIZE, THREADS_ACTIVE] {
            validate_instrument_name(name)?;
        }

        let time_alive = meter
            .u64_counter(TIME_ALIVE)
            .with_unit("s")
            .with_description("Time Alive: total time the application has been alive")
            .build();

        let cpu_sampler = BoundedSampler::new(CPU_USAGE, config.cpu_usage_upper_bound);
        let cpu_usage = meter
            .i64_observable_gauge(CPU_USAGE)
            .with_unit("%")
            .with_description("CPU Usage: synthetic CPU usage percent")
            .with_callback(move |observer| match cpu_sampler.sample() {
                Ok(value) => observer.observe(value, &[]),
                Err(e) => {
                    tracing::error!(instrument = CPU_USAGE, error = %e, "Skipping observation");
                }
            })
            .build();

        let heap_sampler = BoundedSampler::new(TOTAL_HEAP_SIZE, config.total_heap_size_upper_bound);
        let total_heap_size = meter
            .i64_observable_up_down_counter(TOTAL_HEAP_SIZE)
            .with_unit("1")
            .with_description("Total Heap Size: synthetic current total heap size")
            .with_callback(move |observer| match heap_sampler.sample() {
                Ok(value) => observer.observe(value, &[]),
                Err(e) => {
                    tracing::error!(
                        instrument = TOTAL_HEAP_SIZE,
                        error = %e,
                        "Skipping observation"
                    );
                }
            })
            .build();

        let threads_active = meter
            .i64_up_down_counter(THREADS_ACTIVE)
            .with_unit("1")
            .with_description("Threads Active: synthetic count of active threads")
            .build();

        tracing::debug!("Registered 4 instruments");

        Ok(Self {
            time_alive,
            cpu_usage,
            total_heap_size,
            threads_active,
        })
    }

    /// Add to the monotonic time-alive counter.
    pub fn add_time_alive(&self, amount: u64) {
        self.time_alive.add(amount, &[]);
    }

    /// Apply a delta to the threads-active up-down counter.
    pub fn add_threads_active(&self, delta: i64) {
        self.threads_active.add(delta, &[]);
    }
}

impl std::fmt::Debug for InstrumentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentSet")
            .field(
                "instruments",
                &[TIME_ALIVE, CPU_USAGE, TOTAL_HEAP_SIZE, THREADS_ACTIVE],
            )
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::metrics::MeterProvider;
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};

    fn in_memory_provider() -> (SdkMeterProvider, InMemoryMetricExporter) {
        let exporter = InMemoryMetricExporter::default();
        let reader = PeriodicReader::builder(exporter.clone()).build();
        let provider = SdkMeterProvider::builder().with_reader(reader).build();
        (provider, exporter)
    }

    fn exported_names(exporter: &InMemoryMetricExporter) -> Vec<String> {
        let mut names = Vec::new();
        for resource_metrics in exporter.get_finished_metrics().expect("finished metrics") {
            for scope_metrics in &resource_metrics.scope_metrics {
                for metric in &scope_metrics.metrics {
                    names.push(metric.name.to_string());
                }
            }
        }
        names
    }

    #[test]
    fn test_validate_instrument_name_accepts_registry_names() {
        for name in [TIME_ALIVE, CPU_USAGE, TOTAL_HEAP_SIZE, THREADS_ACTIVE] {
            assert!(validate_instrument_name(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_validate_instrument_name_rejects_bad_names() {
        for name in ["", "Time Alive", "9starts_with_digit", "_leading_underscore"] {
            let err = validate_instrument_name(name).unwrap_err();
            assert!(err.to_string().contains("invalid instrument name"));
        }

        let too_long = format!("a{}", "b".repeat(255));
        assert!(validate_instrument_name(&too_long).is_err());
    }

    #[test]
    fn test_register_exports_async_instruments() {
        let (provider, exporter) = in_memory_provider();
        let meter = provider.meter("mirage-test");

        let _instruments =
            InstrumentSet::register(&meter, &Config::default()).expect("registration");

        provider.force_flush().expect("force_flush");
        let names = exported_names(&exporter);

        // Async instruments observe on every collection, sync instruments
        // only appear once something was added.
        assert!(names.contains(&CPU_USAGE.to_string()));
        assert!(names.contains(&TOTAL_HEAP_SIZE.to_string()));

        provider.shutdown().expect("shutdown");
    }

    #[test]
    fn test_register_exports_sync_instruments_after_adds() {
        let (provider, exporter) = in_memory_provider();
        let meter = provider.meter("mirage-test");

        let instruments =
            InstrumentSet::register(&meter, &Config::default()).expect("registration");
        instruments.add_time_alive(1);
        instruments.add_threads_active(1);

        provider.force_flush().expect("force_flush");
        let names = exported_names(&exporter);
        assert!(names.contains(&TIME_ALIVE.to_string()));
        assert!(names.contains(&THREADS_ACTIVE.to_string()));

        provider.shutdown().expect("shutdown");
    }

    #[test]
    fn test_degenerate_bound_produces_no_observation() {
        let (provider, exporter) = in_memory_provider();
        let meter = provider.meter("mirage-test");

        let config = Config {
            cpu_usage_upper_bound: 0,
            ..Config::default()
        };
        let _instruments = InstrumentSet::register(&meter, &config).expect("registration");

        provider.force_flush().expect("force_flush");
        let names = exported_names(&exporter);

        // The degenerate sampler skips its observation, so the gauge exports
        // no data; the other async instrument is unaffected.
        assert!(!names.contains(&CPU_USAGE.to_string()));
        assert!(names.contains(&TOTAL_HEAP_SIZE.to_string()));

        provider.shutdown().expect("shutdown");
    }
}
