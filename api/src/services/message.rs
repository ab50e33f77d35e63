use std::sync::Arc;

use tracing::info;

use crate::{error::AppError, models::message::Message, store::MessageStore};

pub struct MessageService {
    store: Arc<dyn MessageStore>,
}

impl MessageService {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    pub async fn create_message(&self, user_id: &str, body: &str) -> Result<Message, AppError> {
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            body: body.to_string(),
        };
        let message = self.store.insert(&message).await?;
        info!(message_id = %message.id, user_id = %user_id, "message created");
        Ok(message)
    }

    pub async fn read_message(&self, id: &str) -> Result<Message, AppError> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(AppError::MessageNotFound)
    }

    pub async fn read_messages(&self) -> Result<Vec<Message>, AppError> {
        self.store.find_all().await
    }

    /// Only the author may edit.
    pub async fn update_message(
        &self,
        user_id: &str,
        id: &str,
        body: &str,
    ) -> Result<Message, AppError> {
        let message = self.owned_message(user_id, id).await?;
        self.store.update_body(id, body).await?;
        Ok(Message {
            body: body.to_string(),
            ..message
        })
    }

    /// Only the author may delete.
    pub async fn delete_message(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        self.owned_message(user_id, id).await?;
        self.store.delete_by_id(id).await?;
        info!(message_id = %id, "message deleted");
        Ok(())
    }

    async fn owned_message(&self, user_id: &str, id: &str) -> Result<Message, AppError> {
        let message = self.read_message(id).await?;
        if message.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        Ok(message)
    }
}
