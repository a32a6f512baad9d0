// src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::{error, warn};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for every handler and domain operation.
///
/// Client-caused failures keep their own variants so the frontend can react
/// to them (expired window vs. duplicate mark vs. missing session); everything
/// coming out of the store or the auth libraries collapses into generic
/// backend errors.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthorized,

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("attendance window is closed")]
    SessionExpired,

    #[error("attendance already marked")]
    AlreadyMarked,

    #[error("no active attendance session for today")]
    NoActiveSession,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("malformed stored document: {0}")]
    Malformed(String),
}

impl ApiError {
    /// Stable machine-readable kind included in the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::Permission(_) => "permission_denied",
            ApiError::SessionExpired => "session_expired",
            ApiError::AlreadyMarked => "already_marked",
            ApiError::NoActiveSession => "no_active_session",
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation(_) => "validation_failed",
            ApiError::Database(_) | ApiError::Token(_) | ApiError::Hash(_) | ApiError::Malformed(_) => {
                "backend_error"
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Permission(_) => StatusCode::FORBIDDEN,
            ApiError::SessionExpired | ApiError::AlreadyMarked => StatusCode::CONFLICT,
            ApiError::NoActiveSession | ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Token(_) | ApiError::Hash(_) | ApiError::Malformed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }
        HttpResponse::build(status).json(json!({
            "error": self.kind(),
            "message": self.to_string(),
        }))
    }
}
