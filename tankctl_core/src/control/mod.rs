//! Iterative (per-tick) controllers and the asynchronous wrappers that drive them.

pub mod async_wrapper;
pub mod integrated;
pub mod iterative;
pub mod pipeline;

pub use async_wrapper::AsyncWrapper;
pub use integrated::AsyncPosIntegratedController;
pub use iterative::{
    IterativeController, IterativeLambdaController, IterativePosPidController,
    IterativeVelPidController, VelMath,
};
pub use pipeline::PipelineController;

/// A position loop that runs on its own and is steered through targets and enable flags.
///
/// Implementations serialize access to their internal state; callers never step them.
pub trait AsyncPositionController {
    /// Set an absolute target in encoder units.
    fn set_target(&mut self, target: f64);
    fn target(&self) -> f64;
    fn error(&self) -> f64;
    /// True once the loop has converged (always true while disabled).
    fn is_settled(&mut self) -> bool;
    /// Clear accumulated state (integrators, settle timers).
    fn reset(&mut self);
    fn flip_disable(&mut self, disabled: bool);
    fn is_disabled(&self) -> bool;
}
