use std::time::Duration;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use super::{MessageStore, UserStore};
use crate::{
    error::AppError,
    models::{
        message::Message,
        user::{User, UserChanges},
    },
};

/// Open the pool and bring the schema up to date.
pub async fn connect(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<SqlitePool, AppError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(sqlx::Error::from)?;

    Ok(pool)
}

fn map_unique_violation(e: sqlx::Error) -> AppError {
    let unique = e
        .as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation());
    if unique {
        AppError::UserAlreadyExists
    } else {
        AppError::Sqlx(e)
    }
}

#[derive(Clone)]
pub struct SqliteUserStore {
    db: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl UserStore for SqliteUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, membership FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, membership FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, membership FROM users ORDER BY email",
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn insert(&self, user: &User) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash, membership) VALUES (?, ?, ?, ?) \
             RETURNING id, email, password_hash, membership",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.membership)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique_violation)
    }

    async fn update_by_id(&self, id: &str, changes: UserChanges) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET \
                 email = COALESCE(?, email), \
                 password_hash = COALESCE(?, password_hash), \
                 membership = COALESCE(?, membership) \
             WHERE id = ?",
        )
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.membership)
        .bind(id)
        .execute(&self.db)
        .await
        .map_err(map_unique_violation)?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteMessageStore {
    db: SqlitePool,
}

impl SqliteMessageStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl MessageStore for SqliteMessageStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<Message>, AppError> {
        let message =
            sqlx::query_as::<_, Message>("SELECT id, user_id, body FROM messages WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
        Ok(message)
    }

    async fn find_all(&self) -> Result<Vec<Message>, AppError> {
        let messages =
            sqlx::query_as::<_, Message>("SELECT id, user_id, body FROM messages ORDER BY rowid")
                .fetch_all(&self.db)
                .await?;
        Ok(messages)
    }

    async fn insert(&self, message: &Message) -> Result<Message, AppError> {
        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (id, user_id, body) VALUES (?, ?, ?) RETURNING id, user_id, body",
        )
        .bind(&message.id)
        .bind(&message.user_id)
        .bind(&message.body)
        .fetch_one(&self.db)
        .await?;
        Ok(message)
    }

    async fn update_body(&self, id: &str, body: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE messages SET body = ? WHERE id = ?")
            .bind(body)
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::MessageNotFound);
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::MessageNotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    connect("sqlite::memory:", 1, Duration::from_secs(5))
        .await
        .unwrap()
}
