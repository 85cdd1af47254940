//! Settle detection shared by every controller.

use std::sync::Arc;
use std::time::Instant;

use tankctl_traits::Clock;

use crate::config::SettleCfg;

/// Tracks how long an error signal has stayed inside the settle band.
pub struct SettledUtil {
    cfg: SettleCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    last_error: f64,
    in_band_since: Option<Instant>,
}

impl core::fmt::Debug for SettledUtil {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SettledUtil")
            .field("cfg", &self.cfg)
            .field("last_error", &self.last_error)
            .field("in_band", &self.in_band_since.is_some())
            .finish()
    }
}

impl SettledUtil {
    pub fn new(cfg: SettleCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            cfg,
            clock,
            last_error: 0.0,
            in_band_since: None,
        }
    }

    /// Feed the current error; true once it has been in band for the configured time.
    pub fn is_settled(&mut self, error: f64) -> bool {
        let derivative = error - self.last_error;
        self.last_error = error;

        if error.abs() > self.cfg.at_target_error
            || derivative.abs() > self.cfg.at_target_derivative
        {
            self.in_band_since = None;
            return false;
        }

        let now = self.clock.now();
        let since = *self.in_band_since.get_or_insert(now);
        now.saturating_duration_since(since) >= self.cfg.at_target_time
    }

    pub fn reset(&mut self) {
        self.last_error = 0.0;
        self.in_band_since = None;
    }

    pub fn cfg(&self) -> &SettleCfg {
        &self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tankctl_traits::clock::test_clock::TestClock;

    fn util(clock: &TestClock) -> SettledUtil {
        SettledUtil::new(SettleCfg::default(), Arc::new(clock.clone()))
    }

    #[test]
    fn settles_after_dwell_time() {
        let clock = TestClock::new();
        let mut s = util(&clock);
        // first sample jumps from 0 to 10, over the derivative limit
        assert!(!s.is_settled(10.0));
        clock.advance(Duration::from_millis(100));
        assert!(!s.is_settled(10.0));
        clock.advance(Duration::from_millis(150));
        assert!(!s.is_settled(10.0));
        clock.advance(Duration::from_millis(100));
        assert!(s.is_settled(10.0));
    }

    #[test]
    fn leaving_band_restarts_timer() {
        let clock = TestClock::new();
        let mut s = util(&clock);
        assert!(!s.is_settled(0.0));
        clock.advance(Duration::from_millis(200));
        assert!(!s.is_settled(500.0));
        clock.advance(Duration::from_millis(300));
        // back in error band but the jump exceeds the derivative limit
        assert!(!s.is_settled(0.0));
        assert!(!s.is_settled(0.0));
        clock.advance(Duration::from_millis(250));
        assert!(s.is_settled(0.0));
    }
}
