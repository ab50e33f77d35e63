use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: String,
    pub user_id: String,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagePayload {
    pub body: String,
}

impl MessagePayload {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.body.trim().is_empty() {
            return Err(AppError::Validation("message body is required".into()));
        }
        Ok(())
    }
}
