//! Loop pacing and the time bundle handed to controllers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tankctl_traits::{Clock, MonotonicClock};

use crate::config::SettleCfg;
use crate::settled::SettledUtil;

/// Fixed-rate pacing: `delay_until(p)` returns `p` after the previous wake-up.
///
/// If the caller overran the period, the call returns immediately and the
/// schedule restarts from now instead of bursting to catch up.
pub struct Rate {
    clock: Arc<dyn Clock + Send + Sync>,
    last: Option<Instant>,
}

impl Rate {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { clock, last: None }
    }

    pub fn delay_until(&mut self, period: Duration) {
        let now = self.clock.now();
        let target = self.last.unwrap_or(now) + period;
        if target > now {
            self.clock.sleep(target - now);
            self.last = Some(target);
        } else {
            self.last = Some(now);
        }
    }

    /// Convenience for `delay_until(Duration::from_millis(ms))`.
    pub fn delay_until_ms(&mut self, ms: u64) {
        self.delay_until(Duration::from_millis(ms));
    }
}

/// Clock plus settle policy; every controller built from one shares the same time source.
#[derive(Clone)]
pub struct TimeUtil {
    clock: Arc<dyn Clock + Send + Sync>,
    settle: SettleCfg,
}

impl core::fmt::Debug for TimeUtil {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimeUtil")
            .field("settle", &self.settle)
            .finish()
    }
}

impl Default for TimeUtil {
    fn default() -> Self {
        Self::new(Arc::new(MonotonicClock::new()), SettleCfg::default())
    }
}

impl TimeUtil {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>, settle: SettleCfg) -> Self {
        Self { clock, settle }
    }

    pub fn with_settle(mut self, settle: SettleCfg) -> Self {
        self.settle = settle;
        self
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.clock.clone()
    }

    pub fn settle_cfg(&self) -> SettleCfg {
        self.settle
    }

    /// A fresh rate limiter on this clock.
    pub fn rate(&self) -> Rate {
        Rate::new(self.clock.clone())
    }

    /// A fresh settle detector with this policy.
    pub fn settled_util(&self) -> SettledUtil {
        SettledUtil::new(self.settle, self.clock.clone())
    }
}
