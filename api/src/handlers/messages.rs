use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppError,
    extract::AuthUser,
    models::message::{Message, MessagePayload},
    AppState,
};

pub async fn create_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<MessagePayload>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    payload.validate()?;
    let message = state
        .messages
        .create_message(&user_id, &payload.body)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn list_messages(State(state): State<AppState>) -> Result<Json<Vec<Message>>, AppError> {
    Ok(Json(state.messages.read_messages().await?))
}

pub async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Message>, AppError> {
    Ok(Json(state.messages.read_message(&id).await?))
}

pub async fn update_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<MessagePayload>,
) -> Result<Json<Message>, AppError> {
    payload.validate()?;
    let message = state
        .messages
        .update_message(&user_id, &id, &payload.body)
        .await?;
    Ok(Json(message))
}

pub async fn delete_message(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.messages.delete_message(&user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
