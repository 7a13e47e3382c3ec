//! Error taxonomy for the auth core and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use super::token::TokenError;

pub const BAD_REQUEST_ERROR_CODE: &str = "bad_request";
pub const EXPIRED_ACCESS_TOKEN_ERROR_CODE: &str = "expired_access_token";
pub const INVALID_ACCESS_TOKEN_ERROR_CODE: &str = "invalid_access_token";

/// Failures surfaced to clients by the auth core.
///
/// None of these are retried internally; each maps to exactly one
/// status/error-code pair. Store connectivity problems are kept apart from
/// client mistakes so they can surface as 503 instead of a generic 400.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Username already registered")]
    UsernameTaken,
    #[error("Not authenticated or token expired")]
    NotAuthenticated,
    #[error("You are not allowed to perform this action")]
    Forbidden,
    #[error("Access token expired")]
    TokenExpired,
    #[error("Invalid token")]
    TokenInvalid,
    #[error("User not found")]
    UserNotFound,
    #[error("Invalid refresh token")]
    RefreshTokenMismatch,
    #[error("Invalid device info")]
    DeviceMismatch,
    #[error("Malformed request")]
    MalformedRequest,
    #[error("Store unavailable")]
    Store(#[from] sqlx::Error),
    #[error("Internal error")]
    Internal,
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials
            | Self::NotAuthenticated
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::UserNotFound
            | Self::RefreshTokenMismatch
            | Self::DeviceMismatch => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UsernameTaken | Self::MalformedRequest => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::UsernameTaken => "username_taken",
            Self::NotAuthenticated => "not_authenticated",
            Self::Forbidden => "forbidden",
            Self::TokenExpired => EXPIRED_ACCESS_TOKEN_ERROR_CODE,
            Self::TokenInvalid => INVALID_ACCESS_TOKEN_ERROR_CODE,
            Self::UserNotFound => "user_not_found",
            Self::RefreshTokenMismatch => "invalid_refresh_token",
            Self::DeviceMismatch => "invalid_device_info",
            Self::MalformedRequest => BAD_REQUEST_ERROR_CODE,
            Self::Store(_) => "store_unavailable",
            Self::Internal => "internal_error",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => Self::TokenExpired,
            TokenError::Invalid => Self::TokenInvalid,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        if let Self::Store(err) = &self {
            tracing::error!("Store failure: {err}");
        }
        let body = json!({
            "error_code": self.error_code(),
            "error": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}
