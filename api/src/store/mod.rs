//! Persistence collaborators. Services only see these traits.

pub mod sqlite;

use crate::{
    error::AppError,
    models::{
        message::Message,
        user::{User, UserChanges},
    },
};

pub use sqlite::{connect, SqliteMessageStore, SqliteUserStore};

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_all(&self) -> Result<Vec<User>, AppError>;

    /// Fails with `UserAlreadyExists` when the email is taken.
    async fn insert(&self, user: &User) -> Result<User, AppError>;

    /// Fails with `UserNotFound` when no row matched.
    async fn update_by_id(&self, id: &str, changes: UserChanges) -> Result<(), AppError>;

    /// Fails with `UserNotFound` when no row matched.
    async fn delete_by_id(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait::async_trait]
pub trait MessageStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Message>, AppError>;

    async fn find_all(&self) -> Result<Vec<Message>, AppError>;

    async fn insert(&self, message: &Message) -> Result<Message, AppError>;

    async fn update_body(&self, id: &str, body: &str) -> Result<(), AppError>;

    async fn delete_by_id(&self, id: &str) -> Result<(), AppError>;
}
