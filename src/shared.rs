use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::hub::{HubError, HubRegistry, UserId};

/// Header carrying the caller's user id, set by the upstream authenticator
pub const USER_ID_HEADER: &str = "x-user-id";

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub registry: HubRegistry,
}

impl AppState {
    pub fn new(registry: HubRegistry) -> Self {
        Self { registry }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal server error")]
    Internal,
}

impl From<HubError> for AppError {
    fn from(err: HubError) -> Self {
        match err {
            HubError::GameNotFound(_) => AppError::NotFound(err.to_string()),
            HubError::KeeperNotAuthorized(_) => AppError::Forbidden(err.to_string()),
            HubError::TwoTeamsRequired
            | HubError::InvalidPeriods(_)
            | HubError::InvalidGameType(_)
            | HubError::InvalidDuration(_)
            | HubError::Statline(_) => AppError::Unprocessable(err.to_string()),
            HubError::Database(msg) => AppError::DatabaseError(msg),
            HubError::Timeout => AppError::Timeout(err.to_string()),
            HubError::EventParseFailed(_)
            | HubError::EventValidationFailed(_)
            | HubError::Transport(_)
            | HubError::Ended
            | HubError::HubClosed => AppError::Internal,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Reads the caller's user id from the request headers.
pub fn user_id(headers: &HeaderMap) -> Result<UserId, AppError> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.trim().parse::<UserId>().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid user id".to_string()))
}
