//! Scalar signal filters.
//!
//! Every filter owns its own history. `filter` consumes exactly one sample and
//! returns the new output; `output` re-reads it without touching state.
//! Stages that are referenced from several places (a `ComposableFilter` and a
//! telemetry reader, say) are held as [`SharedFilter`] handles.

mod average;
mod composable;
mod smoothing;

use std::sync::Arc;

use parking_lot::Mutex;

pub use average::AverageFilter;
pub use composable::ComposableFilter;
pub use smoothing::{DemaFilter, EmaFilter, MedianFilter};

pub trait Filter {
    /// Push one reading through the filter and return the new output.
    fn filter(&mut self, reading: f64) -> f64;
    /// Last computed output.
    fn output(&self) -> f64;
    /// Drop all history.
    fn reset(&mut self);
}

/// Reference-counted filter stage.
pub type SharedFilter = Arc<Mutex<dyn Filter + Send>>;

/// Wrap a filter into a shareable stage handle.
pub fn shared<F: Filter + Send + 'static>(filter: F) -> SharedFilter {
    Arc::new(Mutex::new(filter))
}

/// Identity stage: output equals the last reading.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughFilter {
    output: f64,
}

impl PassthroughFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Filter for PassthroughFilter {
    #[inline]
    fn filter(&mut self, reading: f64) -> f64 {
        self.output = reading;
        reading
    }

    #[inline]
    fn output(&self) -> f64 {
        self.output
    }

    fn reset(&mut self) {
        self.output = 0.0;
    }
}
