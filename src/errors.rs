use axum::{Json, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::models::ActivityId;

/// Failures of tracker operations. None of them leave partial state behind.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("user '{0}' not found")]
    UserNotFound(String),

    #[error("activity {0} not found")]
    ActivityNotFound(ActivityId),

    #[error("default activities cannot be {action}")]
    DefaultActivityLocked { action: &'static str },

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("{0}")]
    Invalid(String),

    #[error("invalid activity template: {0}")]
    Template(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl TrackerError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        let status = match &err {
            TrackerError::Unauthenticated | TrackerError::UserNotFound(_) => {
                StatusCode::UNAUTHORIZED
            }
            TrackerError::ActivityNotFound(_) => StatusCode::NOT_FOUND,
            TrackerError::DefaultActivityLocked { .. } => StatusCode::FORBIDDEN,
            TrackerError::UsernameTaken(_) => StatusCode::CONFLICT,
            TrackerError::Invalid(_) => StatusCode::BAD_REQUEST,
            TrackerError::Template(_) | TrackerError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({ "success": false, "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
