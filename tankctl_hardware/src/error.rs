use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HwError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("scripted sensor needs at least one reading")]
    EmptyScript,
}

pub type Result<T> = std::result::Result<T, HwError>;
