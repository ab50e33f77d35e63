use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{
    error::{AppError, AuthError},
    AppState,
};

/// Id of the caller, taken from a valid access token in the
/// `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = match parts.headers.get(AUTHORIZATION) {
            None => "",
            Some(value) => value.to_str().map_err(|_| AuthError::TokenInvalid)?,
        };
        let user_id = state.tokens.validate(header)?;
        Ok(AuthUser(user_id))
    }
}

/// Marker for requests carrying `Authorization: ApiKey <key>` with the
/// configured webhook key.
#[derive(Debug, Clone, Copy)]
pub struct ApiKey;

#[async_trait]
impl FromRequestParts<AppState> for ApiKey {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("ApiKey "))
            .ok_or(AppError::InvalidApiKey)?;

        if !constant_time_eq(presented.as_bytes(), state.api_key.as_bytes()) {
            tracing::warn!("webhook called with a wrong api key");
            return Err(AppError::InvalidApiKey);
        }
        Ok(ApiKey)
    }
}

/// Compares without returning early on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
