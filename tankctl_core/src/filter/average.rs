use super::Filter;

/// Moving average over a fixed window of `N` taps.
///
/// The window starts zero-filled, so the first `N - 1` outputs are pulled toward
/// zero. The oldest slot is overwritten on every sample and the mean is
/// recomputed over all `N` slots.
#[derive(Debug, Clone)]
pub struct AverageFilter<const N: usize> {
    data: [f64; N],
    index: usize,
    output: f64,
}

impl<const N: usize> AverageFilter<N> {
    pub fn new() -> Self {
        const { assert!(N > 0, "AverageFilter needs at least one tap") };
        Self {
            data: [0.0; N],
            index: 0,
            output: 0.0,
        }
    }

    /// Number of taps.
    pub const fn taps(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for AverageFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Filter for AverageFilter<N> {
    fn filter(&mut self, reading: f64) -> f64 {
        self.data[self.index] = reading;
        self.index += 1;
        if self.index >= N {
            self.index = 0;
        }

        self.output = self.data.iter().sum::<f64>() / N as f64;
        self.output
    }

    fn output(&self) -> f64 {
        self.output
    }

    fn reset(&mut self) {
        self.data = [0.0; N];
        self.index = 0;
        self.output = 0.0;
    }
}
