//! Runs an iterative controller on a background thread.
//!
//! The loop thread owns nothing but `Arc` handles: the controller, its input and
//! its output live behind one mutex shared with the foreground handle, so every
//! target change or reset is serialized against the tick that reads them.
//! Dropping the wrapper stops the thread and joins it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use tankctl_traits::{ControllerInput, ControllerOutput};

use crate::settled::SettledUtil;
use crate::time::TimeUtil;

use super::AsyncPositionController;
use super::iterative::IterativeController;

struct LoopState {
    input: Box<dyn ControllerInput + Send>,
    output: Box<dyn ControllerOutput + Send>,
    controller: Box<dyn IterativeController + Send>,
    ticks: u64,
    /// Cleared on every target change, reset or re-enable; set by the next step.
    /// Until then `controller.error()` describes the previous target.
    fresh: bool,
}

pub struct AsyncWrapper {
    state: Arc<Mutex<LoopState>>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<JoinHandle<()>>,
    settled: SettledUtil,
    time_util: TimeUtil,
}

impl core::fmt::Debug for AsyncWrapper {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AsyncWrapper")
            .field("running", &self.join_handle.is_some())
            .field("settled", &self.settled)
            .finish()
    }
}

impl AsyncWrapper {
    /// Start stepping `controller` at its sample time.
    ///
    /// Each tick reads `input`, steps the controller and writes the result to
    /// `output`. While disabled the thread keeps pacing but does not step.
    pub fn new(
        input: Box<dyn ControllerInput + Send>,
        output: Box<dyn ControllerOutput + Send>,
        controller: Box<dyn IterativeController + Send>,
        time_util: &TimeUtil,
    ) -> Self {
        let state = Arc::new(Mutex::new(LoopState {
            input,
            output,
            controller,
            ticks: 0,
            fresh: false,
        }));
        let shutdown = Arc::new(AtomicBool::new(false));

        let loop_state = state.clone();
        let loop_shutdown = shutdown.clone();
        let mut rate = time_util.rate();
        let join_handle = std::thread::spawn(move || {
            loop {
                if loop_shutdown.load(Ordering::Relaxed) {
                    tracing::debug!("controller loop received shutdown signal");
                    break;
                }

                let period = {
                    let mut s = loop_state.lock();
                    if !s.controller.is_disabled() {
                        let reading = s.input.controller_get();
                        let out = s.controller.step(reading);
                        s.output.controller_set(out);
                        s.ticks += 1;
                        s.fresh = true;
                    }
                    s.controller.sample_time()
                };

                if loop_shutdown.load(Ordering::Relaxed) {
                    break;
                }
                rate.delay_until(period);
                std::thread::yield_now();
            }
            tracing::trace!("controller loop exiting cleanly");
        });

        Self {
            state,
            shutdown,
            join_handle: Some(join_handle),
            settled: time_util.settled_util(),
            time_util: time_util.clone(),
        }
    }

    /// Last output written by the loop.
    pub fn output(&self) -> f64 {
        self.state.lock().controller.output()
    }

    /// Number of ticks that stepped the controller so far.
    pub fn ticks(&self) -> u64 {
        self.state.lock().ticks
    }

    pub fn set_sample_time(&mut self, sample_time: Duration) {
        self.state.lock().controller.set_sample_time(sample_time);
    }

    /// Block until settled, polling every 10 ms.
    pub fn wait_until_settled(&mut self) {
        let mut rate = self.time_util.rate();
        while !self.is_settled() {
            rate.delay_until_ms(10);
        }
    }
}

impl AsyncPositionController for AsyncWrapper {
    fn set_target(&mut self, target: f64) {
        tracing::info!(target, "async wrapper: set target");
        let mut s = self.state.lock();
        s.controller.set_target(target);
        s.fresh = false;
    }

    fn target(&self) -> f64 {
        self.state.lock().controller.target()
    }

    fn error(&self) -> f64 {
        self.state.lock().controller.error()
    }

    fn is_settled(&mut self) -> bool {
        let (disabled, fresh, error) = {
            let s = self.state.lock();
            (s.controller.is_disabled(), s.fresh, s.controller.error())
        };
        if disabled {
            return true;
        }
        fresh && self.settled.is_settled(error)
    }

    fn reset(&mut self) {
        tracing::info!("async wrapper: reset");
        let mut s = self.state.lock();
        s.controller.reset();
        s.fresh = false;
        drop(s);
        self.settled.reset();
    }

    fn flip_disable(&mut self, disabled: bool) {
        tracing::info!(disabled, "async wrapper: flip disable");
        let mut s = self.state.lock();
        s.controller.flip_disable(disabled);
        if disabled {
            s.output.controller_set(0.0);
        } else {
            s.fresh = false;
        }
    }

    fn is_disabled(&self) -> bool {
        self.state.lock().controller.is_disabled()
    }
}

impl Drop for AsyncWrapper {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("controller loop joined"),
                Err(e) => tracing::warn!(?e, "controller loop panicked during shutdown"),
            }
        }
    }
}
