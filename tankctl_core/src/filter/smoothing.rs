use super::Filter;
use crate::error::{Result, invalid_config};

fn check_gain(name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0 && value <= 1.0) {
        return Err(invalid_config(format!("{name} must be in (0.0, 1.0], got {value}")));
    }
    Ok(())
}

/// Exponential moving average: `y = alpha * x + (1 - alpha) * y_prev`.
///
/// The first sample seeds the average to avoid a startup bias toward zero.
#[derive(Debug, Clone, Copy)]
pub struct EmaFilter {
    alpha: f64,
    output: f64,
    seeded: bool,
}

impl EmaFilter {
    pub fn new(alpha: f64) -> Result<Self> {
        check_gain("ema alpha", alpha)?;
        Ok(Self {
            alpha,
            output: 0.0,
            seeded: false,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Filter for EmaFilter {
    fn filter(&mut self, reading: f64) -> f64 {
        self.output = if self.seeded {
            self.alpha * reading + (1.0 - self.alpha) * self.output
        } else {
            self.seeded = true;
            reading
        };
        self.output
    }

    fn output(&self) -> f64 {
        self.output
    }

    fn reset(&mut self) {
        self.output = 0.0;
        self.seeded = false;
    }
}

/// Double exponential smoothing (level + trend).
#[derive(Debug, Clone, Copy)]
pub struct DemaFilter {
    alpha: f64,
    beta: f64,
    level: f64,
    trend: f64,
    output: f64,
}

impl DemaFilter {
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        check_gain("dema alpha", alpha)?;
        check_gain("dema beta", beta)?;
        Ok(Self {
            alpha,
            beta,
            level: 0.0,
            trend: 0.0,
            output: 0.0,
        })
    }
}

impl Filter for DemaFilter {
    fn filter(&mut self, reading: f64) -> f64 {
        let level = self.alpha * reading + (1.0 - self.alpha) * (self.level + self.trend);
        self.trend = self.beta * (level - self.level) + (1.0 - self.beta) * self.trend;
        self.level = level;
        self.output = self.level + self.trend;
        self.output
    }

    fn output(&self) -> f64 {
        self.output
    }

    fn reset(&mut self) {
        self.level = 0.0;
        self.trend = 0.0;
        self.output = 0.0;
    }
}

/// Median over a zero-filled window of `N` taps. Rejects single-sample spikes.
#[derive(Debug, Clone)]
pub struct MedianFilter<const N: usize> {
    data: [f64; N],
    // Sort scratch space so filtering never allocates.
    scratch: [f64; N],
    index: usize,
    output: f64,
}

impl<const N: usize> MedianFilter<N> {
    pub fn new() -> Self {
        const { assert!(N > 0, "MedianFilter needs at least one tap") };
        Self {
            data: [0.0; N],
            scratch: [0.0; N],
            index: 0,
            output: 0.0,
        }
    }
}

impl<const N: usize> Default for MedianFilter<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Filter for MedianFilter<N> {
    fn filter(&mut self, reading: f64) -> f64 {
        self.data[self.index] = reading;
        self.index = (self.index + 1) % N;

        self.scratch = self.data;
        self.scratch.sort_unstable_by(f64::total_cmp);
        let mid = N / 2;
        self.output = if N % 2 == 0 {
            (self.scratch[mid - 1] + self.scratch[mid]) / 2.0
        } else {
            self.scratch[mid]
        };
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
