use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{error::AppError, extract::ApiKey, models::user::MembershipWebhook, AppState};

/// Called by the payment side once a membership purchase settles.
pub async fn membership(
    State(state): State<AppState>,
    _key: ApiKey,
    Json(payload): Json<MembershipWebhook>,
) -> Result<Json<Value>, AppError> {
    payload.validate()?;

    state
        .users
        .update_membership_status(&payload.user_id, true)
        .await?;

    Ok(Json(json!({
        "message": "membership status updated",
    })))
}
