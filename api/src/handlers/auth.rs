use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppError,
    models::user::{CreateUser, LoginPayload, LoginResponse, UserResponse},
    AppState,
};

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.validate()?;

    let user = state
        .users
        .create_user(payload.email.trim(), &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;

    // Unknown email and wrong password look the same from outside.
    let response = state
        .users
        .login(payload.email.trim(), &payload.password)
        .await
        .map_err(|e| match e {
            AppError::UserNotFound | AppError::PasswordMismatch => AppError::LoginFail,
            other => other,
        })?;

    Ok(Json(response))
}
