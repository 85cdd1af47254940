#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Closed-loop motion control for differential-drive robots (hardware-agnostic).
//!
//! All hardware interactions go through the `tankctl_traits` seams
//! (`ControllerInput`, `ControllerOutput`, `PositionMotor`, `ChassisModel`, `Clock`).
//!
//! ## Architecture
//!
//! - **Filtering**: composable scalar filters (`filter` module)
//! - **Control**: iterative controllers, pipelines and background loops (`control` module)
//! - **Builder**: type-state assembly of async pipelines (`builder` module)
//! - **Chassis**: unit/tick scales and the integrated chassis controller (`chassis` module)
//! - **Time**: loop pacing and settle detection (`time`, `settled` modules)
//!
//! A typical single-axis loop:
//!
//! ```no_run
//! use tankctl_core::{AsyncControllerBuilder, TimeUtil};
//! use tankctl_core::control::AsyncPositionController;
//! # struct Enc; impl tankctl_traits::ControllerInput for Enc { fn controller_get(&mut self) -> f64 { 0.0 } }
//! # struct Mot; impl tankctl_traits::ControllerOutput for Mot { fn controller_set(&mut self, _: f64) {} }
//!
//! let mut arm = AsyncControllerBuilder::new(TimeUtil::default())
//!     .input(Enc)
//!     .filter(tankctl_core::filter::AverageFilter::<5>::new())
//!     .pos_pid(0.001, 0.0, 0.0001, 0.0)
//!     .output(Mot)
//!     .build()?;
//! arm.set_target(900.0);
//! arm.wait_until_settled();
//! # Ok::<(), eyre::Report>(())
//! ```

pub mod builder;
pub mod chassis;
pub mod config;
pub mod control;
pub mod conversions;
pub mod error;
pub mod filter;
pub mod settled;
pub mod time;
pub mod units;

pub use builder::AsyncControllerBuilder;
pub use chassis::{
    ChassisController, ChassisControllerIntegrated, ChassisScales, ChassisState, GearsetRatioPair,
};
pub use config::{LoopCfg, PidGains, SettleCfg};
pub use error::{BuildError, ControlError, Result};
pub use settled::SettledUtil;
pub use time::{Rate, TimeUtil};
