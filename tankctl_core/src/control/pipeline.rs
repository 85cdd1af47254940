//! Filter chain followed by an ordered list of controllers.

use std::time::Duration;

use crate::filter::{ComposableFilter, Filter};

use super::iterative::IterativeController;

/// One tick: `reading -> filters -> stage 0 -> stage 1 -> ... -> output`.
///
/// The target is applied to the first stage; later stages see the previous
/// stage's output as their reading. There is always at least one stage.
pub struct PipelineController {
    filter: ComposableFilter,
    head: Box<dyn IterativeController + Send>,
    tail: Vec<Box<dyn IterativeController + Send>>,
    filtered: f64,
    output: f64,
    sample_time: Duration,
    disabled: bool,
}

impl PipelineController {
    pub fn new(
        filter: ComposableFilter,
        head: Box<dyn IterativeController + Send>,
        tail: Vec<Box<dyn IterativeController + Send>>,
    ) -> Self {
        let sample_time = head.sample_time();
        Self {
            filter,
            head,
            tail,
            filtered: 0.0,
            output: 0.0,
            sample_time,
            disabled: false,
        }
    }

    pub fn stage_count(&self) -> usize {
        1 + self.tail.len()
    }

    pub fn filter_count(&self) -> usize {
        self.filter.len()
    }

    /// Last reading after the filter chain.
    pub fn filtered(&self) -> f64 {
        self.filtered
    }
}

impl IterativeController for PipelineController {
    fn step(&mut self, reading: f64) -> f64 {
        if self.disabled {
            self.output = 0.0;
            return 0.0;
        }
        self.filtered = self.filter.filter(reading);
        let mut value = self.head.step(self.filtered);
        for stage in &mut self.tail {
            value = stage.step(value);
        }
        self.output = value;
        tracing::trace!(reading, filtered = self.filtered, output = value, "pipeline step");
        value
    }

    fn set_target(&mut self, target: f64) {
        self.head.set_target(target);
    }

    fn target(&self) -> f64 {
        self.head.target()
    }

    fn output(&self) -> f64 {
        self.output
    }

    fn error(&self) -> f64 {
        self.head.error()
    }

    /// Settled when disabled or when the first stage reports settled.
    fn is_settled(&mut self) -> bool {
        self.disabled || self.head.is_settled()
    }

    fn reset(&mut self) {
        self.filter.reset();
        self.head.reset();
        for stage in &mut self.tail {
            stage.reset();
        }
        self.filtered = 0.0;
        self.output = 0.0;
    }

    fn flip_disable(&mut self, disabled: bool) {
        self.disabled = disabled;
        self.head.flip_disable(disabled);
        for stage in &mut self.tail {
            stage.flip_disable(disabled);
        }
    }

    fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn sample_time(&self) -> Duration {
        self.sample_time
    }

    fn set_sample_time(&mut self, sample_time: Duration) {
        if sample_time.is_zero() {
            return;
        }
        self.sample_time = sample_time;
        self.head.set_sample_time(sample_time);
        for stage in &mut self.tail {
            stage.set_sample_time(sample_time);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeUtil;
    use crate::control::IterativeLambdaController;
    use crate::filter::{AverageFilter, PassthroughFilter};

    fn passthrough() -> ComposableFilter {
        ComposableFilter::new().with_filter(PassthroughFilter::new())
    }

    fn lambda(f: fn(f64) -> f64) -> Box<dyn IterativeController + Send> {
        Box::new(IterativeLambdaController::new(f, &TimeUtil::default()))
    }

    #[test]
    fn stages_run_in_insertion_order() {
        let mut p = PipelineController::new(
            passthrough(),
            lambda(|x| x + 1.0),
            vec![lambda(|x| x * 10.0)],
        );
        // (3 + 1) * 10, not 3 * 10 + 1
        assert_eq!(p.step(3.0), 40.0);
        assert_eq!(p.stage_count(), 2);
    }

    #[test]
    fn filters_apply_before_first_stage() {
        let filter = ComposableFilter::new().with_filter(AverageFilter::<2>::new());
        let mut p = PipelineController::new(filter, lambda(|x| x), Vec::new());
        assert_eq!(p.step(4.0), 2.0);
        assert_eq!(p.filtered(), 2.0);
    }

    #[test]
    fn target_goes_to_first_stage() {
        let mut p = PipelineController::new(
            passthrough(),
            lambda(|x| x),
            vec![lambda(|x| x)],
        );
        p.set_target(12.0);
        p.step(2.0);
        assert_eq!(p.target(), 12.0);
        assert_eq!(p.error(), 10.0);
    }

    #[test]
    fn disabled_pipeline_outputs_zero_and_reports_settled() {
        let mut p = PipelineController::new(passthrough(), lambda(|x| x + 1.0), Vec::new());
        p.flip_disable(true);
        assert_eq!(p.step(5.0), 0.0);
        assert!(p.is_settled());
    }
}
