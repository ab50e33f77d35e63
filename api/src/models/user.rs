use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Stored user record. This is also the shape written to the cache, so the
/// hash is serialized; use [`UserResponse`] for anything leaving the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub membership: bool,
}

/// Partial update applied by `UserStore::update_by_id`. `None` leaves the
/// column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub membership: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub membership: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            membership: user.membership,
        }
    }
}

/// Body of both signup and profile update.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub id: String,
    pub email: String,
    pub membership: bool,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct MembershipWebhook {
    pub event: String,
    pub user_id: String,
}

pub const MEMBERSHIP_UPDATED_EVENT: &str = "membership_status_updated";

impl CreateUser {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_credentials(&self.email, &self.password)
    }
}

impl LoginPayload {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_credentials(&self.email, &self.password)
    }
}

impl MembershipWebhook {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.event != MEMBERSHIP_UPDATED_EVENT {
            return Err(AppError::Validation(format!(
                "unsupported event type: {}",
                self.event
            )));
        }
        if self.user_id.trim().is_empty() {
            return Err(AppError::Validation("user_id is required".into()));
        }
        Ok(())
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".into()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("password is required".into()));
    }
    Ok(())
}
