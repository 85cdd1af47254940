use thiserror::Error;

/// Errors raised by the control core. Configuration errors are fatal at construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Usage errors of `AsyncControllerBuilder`, detected before any hardware is touched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    #[error("missing controller input")]
    MissingInput,
    #[error("missing controller output")]
    MissingOutput,
    #[error("no controller stage configured")]
    MissingController,
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

/// Log `msg` at error level and return it as a typed `InvalidConfiguration` report.
pub(crate) fn invalid_config(msg: impl Into<String>) -> Report {
    let msg = msg.into();
    tracing::error!("{msg}");
    Report::new(ControlError::InvalidConfiguration(msg))
}
