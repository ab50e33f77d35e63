use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Reasons a bearer token is rejected. All of them collapse into one
/// client-facing message; the variant is only kept for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("token missing")]
    TokenMissing,
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("refresh token presented where an access token is required")]
    WrongTokenKind,
    #[error("unexpected signing method")]
    UnexpectedSigningMethod,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("user not found")]
    UserNotFound,
    #[error("password mismatch")]
    PasswordMismatch,
    #[error("invalid email or password")]
    LoginFail,
    #[error("password hashing failed: {0}")]
    PasswordHashingFailed(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("missing configuration: {0}")]
    ConfigurationMissing(String),
    #[error("message not found")]
    MessageNotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(inner: argon2::password_hash::Error) -> Self {
        AppError::PasswordHashingFailed(inner.to_string())
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::UserAlreadyExists => StatusCode::CONFLICT,
            AppError::UserNotFound | AppError::MessageNotFound => StatusCode::NOT_FOUND,
            AppError::PasswordMismatch
            | AppError::LoginFail
            | AppError::Auth(_)
            | AppError::InvalidApiKey => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::PasswordHashingFailed(_)
            | AppError::ConfigurationMissing(_)
            | AppError::Sqlx(_)
            | AppError::Jwt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            AppError::Auth(kind) => {
                tracing::debug!(reason = %kind, "rejected bearer token");
                "invalid or expired token".to_string()
            }
            AppError::PasswordHashingFailed(_)
            | AppError::ConfigurationMissing(_)
            | AppError::Sqlx(_)
            | AppError::Jwt(_) => {
                tracing::error!(error = %self, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
