use thiserror::Error;

use crate::clock::ClockError;
use crate::stats::StatlineError;

use super::socket::TransportError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HubError {
    #[error("Game not found: {0}")]
    GameNotFound(String),

    #[error("Game requires two teams")]
    TwoTeamsRequired,

    #[error("User {0} is not authorized to keep this game")]
    KeeperNotAuthorized(i64),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Failed to parse event: {0}")]
    EventParseFailed(String),

    #[error("Invalid event: {0}")]
    EventValidationFailed(String),

    #[error("Connection failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid periods: {0}")]
    InvalidPeriods(String),

    #[error("Invalid game type: {0}")]
    InvalidGameType(String),

    #[error(transparent)]
    Statline(#[from] StatlineError),

    #[error("Game ended")]
    Ended,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Timed out waiting for the database")]
    Timeout,

    #[error("Hub is closed")]
    HubClosed,
}

impl HubError {
    /// Whether this error, once on a hub's error channel, shuts the hub down.
    ///
    /// Rejected events only cost the offending frame.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            HubError::EventParseFailed(_) | HubError::EventValidationFailed(_)
        )
    }
}

impl From<ClockError> for HubError {
    fn from(err: ClockError) -> Self {
        match err {
            ClockError::InvalidDuration(value) => HubError::InvalidDuration(value),
            ClockError::Closed => HubError::HubClosed,
        }
    }
}
