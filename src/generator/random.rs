//! Bounded random samplers backing the asynchronous instruments.

use rand::Rng;
use thiserror::Error;

/// Errors raised inside an observation callback.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The configured upper bound leaves no valid values to draw from.
    #[error("degenerate bound for '{instrument}': upper bound must be positive, got {bound}")]
    DegenerateBound {
        /// Instrument the sampler feeds.
        instrument: &'static str,
        /// The offending bound.
        bound: i64,
    },
}

/// Uniform sampler over `[0, upper_bound)` for one asynchronous instrument.
///
/// Holds an immutable snapshot of the bound taken at registration time, so
/// the observation callback carries no reference back into [`crate::Config`]
/// and no state across invocations: every call is a fresh draw from the
/// thread-local RNG. The upper bound is exclusive.
#[derive(Debug, Clone)]
pub struct BoundedSampler {
    instrument: &'static str,
    upper_bound: i64,
}

impl BoundedSampler {
    /// Create a sampler for `instrument` drawing from `[0, upper_bound)`.
    pub fn new(instrument: &'static str, upper_bound: i64) -> Self {
        Self {
            instrument,
            upper_bound,
        }
    }

    /// Instrument this sampler feeds.
    pub fn instrument(&self) -> &'static str {
        self.instrument
    }

    /// Draw one value uniformly from `[0, upper_bound)`.
    ///
    /// # Errors
    /// Returns `CallbackError::DegenerateBound` if the bound is zero or
    /// negative; no draw is attempted over an empty range.
    pub fn sample(&self) -> Result<i64, CallbackError> {
        if self.upper_bound <= 0 {
            return Err(CallbackError::DegenerateBound {
                instrument: self.instrument,
                bound: self.upper_bound,
            });
        }
        Ok(rand::rng().random_range(0..self.upper_bound))
    }
}
