//! Type-state builder for [`AsyncWrapper`] pipelines.
//!
//! The builder enforces at compile time that an input and an output are
//! provided before `build()` is available. `try_build()` is always available
//! and reports what is missing at runtime.

use std::marker::PhantomData;
use std::time::Duration;

use tankctl_traits::{ControllerInput, ControllerOutput};

use crate::config::PidGains;
use crate::control::{
    AsyncWrapper, IterativeController, IterativeLambdaController, IterativePosPidController,
    IterativeVelPidController, PipelineController, VelMath,
};
use crate::error::{BuildError, Result};
use crate::filter::{ComposableFilter, Filter, PassthroughFilter, SharedFilter, shared};
use crate::time::TimeUtil;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Controller stages are recorded as recipes and instantiated on build, so
/// they all share the builder's final `TimeUtil`.
enum Stage {
    PosPid(PidGains),
    VelPid { kp: f64, kd: f64, kf: f64, ticks_per_rev: f64 },
    Lambda(Box<dyn FnMut(f64) -> f64 + Send>),
    Custom(Box<dyn IterativeController + Send>),
}

impl Stage {
    fn instantiate(self, time_util: &TimeUtil) -> Result<Box<dyn IterativeController + Send>> {
        Ok(match self {
            Stage::PosPid(gains) => Box::new(IterativePosPidController::new(gains, time_util)),
            Stage::VelPid {
                kp,
                kd,
                kf,
                ticks_per_rev,
            } => {
                let vel_math = VelMath::new(ticks_per_rev, time_util)?;
                Box::new(IterativeVelPidController::new(kp, kd, kf, vel_math, time_util))
            }
            Stage::Lambda(f) => Box::new(IterativeLambdaController::new(f, time_util)),
            Stage::Custom(c) => c,
        })
    }
}

/// Assembles input, filters, controllers and output into a running loop.
///
/// The filter list starts with a passthrough stage, so a pipeline with no
/// user filters sees raw readings.
pub struct AsyncControllerBuilder<I, O> {
    input: Option<Box<dyn ControllerInput + Send>>,
    output: Option<Box<dyn ControllerOutput + Send>>,
    filters: Vec<SharedFilter>,
    stages: Vec<Stage>,
    time_util: TimeUtil,
    sample_time: Option<Duration>,
    _i: PhantomData<I>,
    _o: PhantomData<O>,
}

impl Default for AsyncControllerBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new(TimeUtil::default())
    }
}

impl AsyncControllerBuilder<Missing, Missing> {
    pub fn new(time_util: TimeUtil) -> Self {
        Self {
            input: None,
            output: None,
            filters: vec![shared(PassthroughFilter::new())],
            stages: Vec::new(),
            time_util,
            sample_time: None,
            _i: PhantomData,
            _o: PhantomData,
        }
    }
}

impl<I, O> AsyncControllerBuilder<I, O> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<AsyncWrapper> {
        let input = self
            .input
            .ok_or_else(|| eyre::Report::new(BuildError::MissingInput))?;
        let output = self
            .output
            .ok_or_else(|| eyre::Report::new(BuildError::MissingOutput))?;

        let mut stages = self.stages.into_iter();
        let head = stages
            .next()
            .ok_or_else(|| eyre::Report::new(BuildError::MissingController))?
            .instantiate(&self.time_util)?;
        let tail = stages
            .map(|s| s.instantiate(&self.time_util))
            .collect::<Result<Vec<_>>>()?;

        let filter_count = self.filters.len();
        let mut pipeline = PipelineController::new(
            ComposableFilter::from_stages(self.filters),
            head,
            tail,
        );
        if let Some(sample_time) = self.sample_time {
            pipeline.set_sample_time(sample_time);
        }

        tracing::info!(
            filters = filter_count,
            controllers = pipeline.stage_count(),
            sample_time_ms = pipeline.sample_time().as_millis() as u64,
            "async controller built"
        );
        Ok(AsyncWrapper::new(
            input,
            output,
            Box::new(pipeline),
            &self.time_util,
        ))
    }
}

/// Chainable setters that do not affect type-state.
impl<I, O> AsyncControllerBuilder<I, O> {
    /// Append a filter stage.
    pub fn filter(mut self, filter: impl Filter + Send + 'static) -> Self {
        self.filters.push(shared(filter));
        self
    }

    /// Append a filter stage that is also held elsewhere.
    pub fn filter_shared(mut self, filter: SharedFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn pos_pid(mut self, kp: f64, ki: f64, kd: f64, bias: f64) -> Self {
        self.stages.push(Stage::PosPid(PidGains { kp, ki, kd, bias }));
        self
    }

    /// Velocity PID; `ticks_per_rev` is validated on build.
    pub fn vel_pid(mut self, kp: f64, kd: f64, kf: f64, ticks_per_rev: f64) -> Self {
        self.stages.push(Stage::VelPid {
            kp,
            kd,
            kf,
            ticks_per_rev,
        });
        self
    }

    pub fn lambda<F>(mut self, f: F) -> Self
    where
        F: FnMut(f64) -> f64 + Send + 'static,
    {
        self.stages.push(Stage::Lambda(Box::new(f)));
        self
    }

    pub fn controller(mut self, controller: impl IterativeController + Send + 'static) -> Self {
        self.stages.push(Stage::Custom(Box::new(controller)));
        self
    }

    pub fn with_time_util(mut self, time_util: TimeUtil) -> Self {
        self.time_util = time_util;
        self
    }

    /// Loop period; defaults to the first controller's sample time.
    pub fn with_sample_time(mut self, sample_time: Duration) -> Self {
        self.sample_time = Some(sample_time);
        self
    }
}

// Setters that advance type-state. Calling one again replaces the earlier value.
impl<I, O> AsyncControllerBuilder<I, O> {
    pub fn input(
        self,
        input: impl ControllerInput + Send + 'static,
    ) -> AsyncControllerBuilder<Set, O> {
        AsyncControllerBuilder {
            input: Some(Box::new(input)),
            output: self.output,
            filters: self.filters,
            stages: self.stages,
            time_util: self.time_util,
            sample_time: self.sample_time,
            _i: PhantomData,
            _o: PhantomData,
        }
    }

    pub fn output(
        self,
        output: impl ControllerOutput + Send + 'static,
    ) -> AsyncControllerBuilder<I, Set> {
        AsyncControllerBuilder {
            input: self.input,
            output: Some(Box::new(output)),
            filters: self.filters,
            stages: self.stages,
            time_util: self.time_util,
            sample_time: self.sample_time,
            _i: PhantomData,
            _o: PhantomData,
        }
    }
}

impl AsyncControllerBuilder<Set, Set> {
    /// Build and start the loop. Only available once input and output are set.
    pub fn build(self) -> Result<AsyncWrapper> {
        self.try_build()
    }
}
