use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::core::MatchError;
use crate::models::ErrorResponse;
use crate::services::StoreError;

/// Errors surfaced by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    BadRequest { error: &'static str, message: String },

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn bad_request(error: &'static str, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            error,
            message: message.into(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest { error, .. } => *error,
            ApiError::Match(MatchError::InvalidCoordinate { .. }) => "invalid_coordinate",
            ApiError::Store(StoreError::NotFound(_)) => "not_found",
            ApiError::Store(StoreError::AlreadyExists(_)) => "already_exists",
            ApiError::Store(StoreError::Timeout(_)) => "store_timeout",
            ApiError::Store(_) => "store_unavailable",
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::bad_request("validation_failed", errors.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } | ApiError::Match(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::AlreadyExists(_)) => StatusCode::CONFLICT,
            ApiError::Store(StoreError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Store(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}
