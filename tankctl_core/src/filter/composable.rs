use super::{Filter, SharedFilter, shared};

/// Chain of filter stages applied in order.
///
/// The raw reading enters stage 0; every later stage is fed the previous
/// stage's freshly updated output. With no stages the chain outputs 0.
#[derive(Default, Clone)]
pub struct ComposableFilter {
    filters: Vec<SharedFilter>,
    output: f64,
}

impl core::fmt::Debug for ComposableFilter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ComposableFilter")
            .field("stages", &self.filters.len())
            .field("output", &self.output)
            .finish()
    }
}

impl ComposableFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_stages(filters: Vec<SharedFilter>) -> Self {
        Self {
            filters,
            output: 0.0,
        }
    }

    /// Append an owned filter as the last stage.
    pub fn with_filter<F: Filter + Send + 'static>(mut self, filter: F) -> Self {
        self.filters.push(shared(filter));
        self
    }

    /// Append a shared stage.
    pub fn add_filter(&mut self, filter: SharedFilter) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Filter for ComposableFilter {
    fn filter(&mut self, reading: f64) -> f64 {
        let Some(first) = self.filters.first() else {
            return 0.0;
        };
        first.lock().filter(reading);

        // Each guard is released before the next stage is locked, so the same
        // stage may appear in the chain more than once.
        for i in 1..self.filters.len() {
            let prev = self.filters[i - 1].lock().output();
            self.filters[i].lock().filter(prev);
        }

        if let Some(last) = self.filters.last() {
            self.output = last.lock().output();
        }
        self.output
    }

    fn output(&self) -> f64 {
        self.output
    }

    fn reset(&mut self) {
        for stage in &self.filters {
            stage.lock().reset();
        }
        self.output = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{AverageFilter, PassthroughFilter};

    #[test]
    fn empty_chain_outputs_zero() {
        let mut f = ComposableFilter::new();
        assert_eq!(f.filter(42.0), 0.0);
        assert_eq!(f.output(), 0.0);
    }

    #[test]
    fn later_stages_see_previous_output() {
        let first = shared(AverageFilter::<2>::new());
        let second = shared(AverageFilter::<2>::new());
        let mut chain = ComposableFilter::from_stages(vec![first.clone(), second.clone()]);

        // stage 1: (8 + 0) / 2 = 4; stage 2: (4 + 0) / 2 = 2
        assert_eq!(chain.filter(8.0), 2.0);
        assert_eq!(first.lock().output(), 4.0);
        assert_eq!(second.lock().output(), 2.0);
    }

    #[test]
    fn repeated_stage_does_not_deadlock() {
        let stage = shared(PassthroughFilter::new());
        let mut chain = ComposableFilter::from_stages(vec![stage.clone(), stage]);
        assert_eq!(chain.filter(1.5), 1.5);
    }
}
