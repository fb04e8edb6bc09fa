//! Metric collection and update engine.
//!
//! Two independent clocks write into the instrument handles:
//!
//! - [`UpdateScheduler`] runs a fixed-interval loop in its own task and
//!   pushes the synchronous instruments (time-alive counter, threads-active
//!   up-down counter). It exclusively owns the [`Oscillator`] state.
//! - The exporter's periodic reader pulls the asynchronous instruments
//!   (CPU-usage gauge, heap-size up-down counter) through the
//!   [`BoundedSampler`] callbacks registered with the [`InstrumentSet`].
//!
//! The clocks may have different periods and no ordering between them is
//! assumed anywhere.

mod instruments;
mod oscillator;
mod random;
mod scheduler;

pub use instruments::{
    validate_instrument_name, InstrumentSet, RegistrationError, CPU_USAGE, THREADS_ACTIVE,
    TIME_ALIVE, TOTAL_HEAP_SIZE,
};
pub use oscillator::{Direction, Oscillator};
pub use random::{BoundedSampler, CallbackError};
pub use scheduler::UpdateScheduler;
