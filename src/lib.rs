//! Mirage - Synthetic OTLP Metrics Generator
//!
//! This crate provides the core functionality for the Mirage synthetic
//! telemetry generator: a long-running process that fabricates plausible
//! values for a fixed set of runtime metrics and pushes them to an OTLP
//! collector, for exercising metrics-collection pipelines without a real
//! workload behind them.
//!
//! # Architecture
//!
//! - **Config**: YAML tunables with documented defaults, immutable after load
//! - **Generator**: instrument registry, threads-active oscillator, bounded
//!   random samplers, and the fixed-interval update scheduler
//! - **Export**: OTLP/HTTP pipeline with a periodic collection cycle and a
//!   bounded final flush at shutdown
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mirage::{Config, InstrumentSet, UpdateScheduler, export};
//! use opentelemetry::metrics::MeterProvider;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_default("config.yaml");
//! let endpoint = export::resolve_endpoint(None);
//! let provider = export::init_provider(&endpoint, export::DEFAULT_COLLECT_PERIOD)?;
//!
//! let meter = provider.meter("mirage");
//! let instruments = Arc::new(InstrumentSet::register(&meter, &config)?);
//! let _handle = UpdateScheduler::new(&config, instruments).spawn();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod export;
pub mod generator;

pub use config::{Config, ConfigError};
pub use export::ExportError;
pub use generator::{
    BoundedSampler, CallbackError, Direction, InstrumentSet, Oscillator, RegistrationError,
    UpdateScheduler,
};
