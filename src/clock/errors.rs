use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Clock is closed")]
    Closed,
}
