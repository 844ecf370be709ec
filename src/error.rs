//! Application-wide error type and its HTTP mapping.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid identity.
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated but lacking authority.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    InvalidDate(String),

    #[error("Invalid off type {0}. Allowed: 1 (morning), 2 (afternoon), 3 (full day)")]
    InvalidOffType(u8),

    /// Action not valid for the letter's current status.
    #[error("{0}")]
    InvalidStateTransition(String),

    #[error("{0}")]
    InsufficientBalance(String),

    #[error("{0}")]
    OverlapConflict(String),

    /// Record store failure. The detail is logged, never returned.
    #[error("Internal Server Error")]
    Database(#[source] sqlx::Error),

    #[error("Internal Server Error")]
    Internal(String),
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::InvalidDate(_) => "INVALID_DATE",
            Self::InvalidOffType(_) => "INVALID_OFF_TYPE",
            Self::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            Self::InsufficientBalance(_) => "INSUFFICIENT_BALANCE",
            Self::OverlapConflict(_) => "OVERLAP_CONFLICT",
            Self::Database(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "Database operation failed");
        AppError::Database(e)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidInput(_) | Self::InvalidDate(_) | Self::InvalidOffType(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidStateTransition(_) | Self::OverlapConflict(_) => StatusCode::CONFLICT,
            Self::InsufficientBalance(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::Internal(detail) = self {
            tracing::error!(detail = %detail, "Internal error");
        }
        HttpResponse::build(self.status_code()).json(json!({
            "code": self.error_code(),
            "message": self.to_string(),
        }))
    }
}
