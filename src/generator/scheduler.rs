//! Fixed-interval scheduler driving the synchronous instruments.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::Config;
use crate::generator::instruments::InstrumentSet;
use crate::generator::oscillator::Oscillator;

/// Drives the two synchronous instruments on a fixed-interval clock.
///
/// Each tick adds the configured increment to the time-alive counter and
/// advances the threads-active oscillator by one step. The scheduler owns
/// the oscillator state outright; the asynchronous instruments are pulled
/// by the exporter's own collection clock and never touch it. The two
/// clocks are independent and no phase relationship between them is
/// assumed.
#[derive(Debug)]
pub struct UpdateScheduler {
    interval: Duration,
    increment: u64,
    oscillator: Oscillator,
    instruments: Arc<InstrumentSet>,
}

impl UpdateScheduler {
    /// Create a scheduler from validated configuration.
    pub fn new(config: &Config, instruments: Arc<InstrumentSet>) -> Self {
        Self {
            interval: config.update_interval(),
            // Clamped by Config::validate; saturate rather than wrap if an
            // unvalidated config sneaks through.
            increment: config.time_alive_incrementer.max(0) as u64,
            oscillator: Oscillator::new(config.threads_active_upper_bound),
            instruments,
        }
    }

    /// Run one synchronous update cycle.
    ///
    /// This is the whole of the work on the scheduler's clock: a monotonic
    /// add and one oscillator step. The degenerate oscillator emits no
    /// delta, in which case the up-down counter is left untouched.
    pub fn tick(&mut self) {
        self.instruments.add_time_alive(self.increment);
        if let Some(delta) = self.oscillator.tick() {
            self.instruments.add_threads_active(delta);
        }
        tracing::debug!(
            threads_active = self.oscillator.current(),
            "Updated time alive and threads active"
        );
    }

    /// Spawn the repeating update loop as an independent task.
    ///
    /// The loop runs until the task is aborted; it does not observe
    /// shutdown on its own, the supervisor simply abandons it at exit.
    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            // First tick fires immediately, matching do-work-then-sleep.
            loop {
                ticker.tick().await;
                self.tick();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::metrics::MeterProvider;
    use opentelemetry_sdk::metrics::data::{self, ResourceMetrics};
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, PeriodicReader, SdkMeterProvider};

    fn test_scheduler(config: &Config) -> (UpdateScheduler, SdkMeterProvider, InMemoryMetricExporter)
    {
        let exporter = InMemoryMetricExporter::default();
        let reader = PeriodicReader::builder(exporter.clone()).build();
        let provider = SdkMeterProvider::builder().with_reader(reader).build();
        let meter = provider.meter("mirage-test");
        let instruments = Arc::new(InstrumentSet::register(&meter, config).expect("registration"));
        (
            UpdateScheduler::new(config, instruments),
            provider,
            exporter,
        )
    }

    fn sum_value_u64(metrics: &[ResourceMetrics], name: &str) -> Option<u64> {
        find_sum_points::<u64>(metrics, name)
    }

    fn sum_value_i64(metrics: &[ResourceMetrics], name: &str) -> Option<i64> {
        find_sum_points::<i64>(metrics, name)
    }

    fn find_sum_points<T: Copy + 'static>(
        metrics: &[ResourceMetrics],
        name: &str,
    ) -> Option<T> {
        // Cumulative exports accumulate across flushes; the newest snapshot
        // carries the current value, so search from the back.
        for resource_metrics in metrics.iter().rev() {
            for scope_metrics in &resource_metrics.scope_metrics {
                for metric in &scope_metrics.metrics {
                    if metric.name == name {
                        let sum = metric.data.as_any().downcast_ref::<data::Sum<T>>()?;
                        return sum.data_points.first().map(|dp| dp.value);
                    }
                }
            }
        }
        None
    }

    fn latest_flush(
        provider: &SdkMeterProvider,
        exporter: &InMemoryMetricExporter,
    ) -> Vec<ResourceMetrics> {
        provider.force_flush().expect("force_flush");
        exporter.get_finished_metrics().expect("finished metrics")
    }

    #[test]
    fn test_counter_accumulates_increment_per_tick() {
        let config = Config {
            time_alive_incrementer: 2,
            ..Config::default()
        };
        let (mut scheduler, provider, exporter) = test_scheduler(&config);

        for _ in 0..5 {
            scheduler.tick();
        }

        let metrics = latest_flush(&provider, &exporter);
        assert_eq!(sum_value_u64(&metrics, "time_alive"), Some(10));

        provider.shutdown().expect("shutdown");
    }

    #[test]
    fn test_threads_active_follows_oscillator() {
        let config = Config {
            threads_active_upper_bound: 3,
            ..Config::default()
        };
        let (mut scheduler, provider, exporter) = test_scheduler(&config);

        // Cumulative values after each tick: 1,2,3,2,1,0 then the flip to 1.
        let expected = [1, 2, 3, 2, 1, 0, 1];
        for (tick, want) in expected.iter().enumerate() {
            scheduler.tick();
            let metrics = latest_flush(&provider, &exporter);
            assert_eq!(
                sum_value_i64(&metrics, "threads_active"),
                Some(*want),
                "after tick {}",
                tick + 1
            );
        }

        provider.shutdown().expect("shutdown");
    }

    #[test]
    fn test_degenerate_bound_never_touches_counter() {
        let config = Config {
            threads_active_upper_bound: 0,
            ..Config::default()
        };
        let (mut scheduler, provider, exporter) = test_scheduler(&config);

        for _ in 0..4 {
            scheduler.tick();
        }

        // No delta was ever added, so the up-down counter exported nothing.
        let metrics = latest_flush(&provider, &exporter);
        assert_eq!(sum_value_i64(&metrics, "threads_active"), None);

        provider.shutdown().expect("shutdown");
    }
}
