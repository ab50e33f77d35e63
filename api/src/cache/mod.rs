//! Key/value cache used for read-through user lookups.
//!
//! Production uses Redis; tests use an in-memory map with TTLs.

pub mod redis;

#[cfg(test)]
mod memory;

use std::time::Duration;

pub use self::redis::RedisCache;

#[cfg(test)]
pub use self::memory::{FailingCache, InMemoryCache, SlowCache};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache call timed out")]
    Timeout,
    #[error("cache value could not be decoded: {0}")]
    Codec(#[from] serde_json::Error),
}

impl From<::redis::RedisError> for CacheError {
    fn from(inner: ::redis::RedisError) -> Self {
        CacheError::Unavailable(inner.to_string())
    }
}

#[async_trait::async_trait]
pub trait Cache: Send + Sync {
    /// Returns `None` on a miss.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}

pub fn user_key(id: &str) -> String {
    format!("user:{id}")
}
