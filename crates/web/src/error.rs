use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use storage::error::StorageError;
use storage::services::JudgingError;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Judging(JudgingError),
    BadRequest(String),
    Unauthorized,
    InternalServerError(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Judging(e) => write!(f, "{}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::InternalServerError(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl WebError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Judging(error) => match error {
                JudgingError::Validation(_) => StatusCode::BAD_REQUEST,
                JudgingError::InvalidCredential(_) | JudgingError::IdentityRequired => {
                    StatusCode::UNAUTHORIZED
                }
                JudgingError::AdminRequired => StatusCode::FORBIDDEN,
                JudgingError::GroupClosed(_) | JudgingError::Conflict(_) => StatusCode::CONFLICT,
                JudgingError::NotFound(_) => StatusCode::NOT_FOUND,
                JudgingError::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
                JudgingError::Storage(StorageError::Migration(_)) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                JudgingError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let body = match &self {
            Self::Judging(JudgingError::Validation(errors)) => {
                json!({
                    "error": "Validation failed",
                    "details": errors.violations
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>(),
                    "violations": errors.violations
                })
            }
            Self::Judging(JudgingError::InvalidCredential(resource)) => {
                json!({
                    "error": "invalid_credential",
                    "resource": resource
                })
            }
            Self::Judging(JudgingError::IdentityRequired) => {
                json!({
                    "error": "identity_required"
                })
            }
            Self::Judging(JudgingError::AdminRequired) => {
                json!({
                    "error": "admin_required"
                })
            }
            Self::Judging(JudgingError::GroupClosed(reason)) => {
                json!({
                    "error": "group_closed",
                    "reason": reason
                })
            }
            Self::Judging(JudgingError::NotFound(entity)) => {
                json!({
                    "error": format!("{} not found", entity)
                })
            }
            Self::Judging(JudgingError::Conflict(msg)) => {
                json!({
                    "error": msg
                })
            }
            Self::Judging(e @ (JudgingError::Storage(_) | JudgingError::PasswordHash(_))) => {
                tracing::error!("Storage error: {:?}", e);
                json!({
                    "error": "An internal error occurred"
                })
            }
            Self::BadRequest(msg) => {
                json!({
                    "error": msg
                })
            }
            Self::Unauthorized => {
                json!({
                    "error": "Unauthorized"
                })
            }
            Self::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                json!({
                    "error": "An internal error occurred"
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<JudgingError> for WebError {
    fn from(error: JudgingError) -> Self {
        Self::Judging(error)
    }
}

pub type ApiResult<T> = Result<T, WebError>;
