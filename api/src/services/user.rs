//! User accounts behind a cache-aside layer, plus login.
//!
//! Reads go cache first, then the store, and populate the cache on a miss.
//! Every write goes to the store and then deletes the cached copy, so a
//! key is either absent or holds what the store held when it was read.
//! Cache trouble of any kind degrades to a store round trip and a log
//! line; it never fails the request.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{
    auth::{hash_password, verify_password, TokenIssuer},
    cache::{user_key, Cache, CacheError},
    error::AppError,
    models::user::{LoginResponse, User, UserChanges},
    store::UserStore,
};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

pub struct UserService {
    store: Arc<dyn UserStore>,
    cache: Option<Arc<dyn Cache>>,
    tokens: TokenIssuer,
    cache_ttl: Duration,
    cache_timeout: Duration,
}

impl UserService {
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: Option<Arc<dyn Cache>>,
        tokens: TokenIssuer,
    ) -> Self {
        Self {
            store,
            cache,
            tokens,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    pub async fn create_user(&self, email: &str, password: &str) -> Result<User, AppError> {
        if self.store.find_by_email(email).await?.is_some() {
            return Err(AppError::UserAlreadyExists);
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
            membership: false,
        };
        let user = self.store.insert(&user).await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub async fn read_user(&self, id: &str) -> Result<User, AppError> {
        if let Some(user) = self.cached_user(id).await {
            return Ok(user);
        }

        let user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        self.populate(&user).await;
        Ok(user)
    }

    /// Lists are never cached.
    pub async fn read_users(&self) -> Result<Vec<User>, AppError> {
        self.store.find_all().await
    }

    pub async fn update_user(
        &self,
        id: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let existing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let password_hash = hash_password(password)?;
        let changes = UserChanges {
            email: Some(email.to_string()),
            password_hash: Some(password_hash.clone()),
            membership: None,
        };
        let result = self.store.update_by_id(id, changes).await;
        self.invalidate(id).await;
        result?;

        info!(user_id = %id, "user updated");
        Ok(User {
            email: email.to_string(),
            password_hash,
            ..existing
        })
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let result = self.store.delete_by_id(id).await;
        self.invalidate(id).await;
        result?;

        info!(user_id = %id, "user deleted");
        Ok(())
    }

    pub async fn update_membership_status(&self, id: &str, status: bool) -> Result<(), AppError> {
        if self.store.find_by_id(id).await?.is_none() {
            return Err(AppError::UserNotFound);
        }

        let changes = UserChanges {
            membership: Some(status),
            ..Default::default()
        };
        let result = self.store.update_by_id(id, changes).await;
        self.invalidate(id).await;
        result?;

        info!(user_id = %id, membership = status, "membership status updated");
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AppError> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        verify_password(&user.password_hash, password)?;

        let access_token = self.tokens.issue_access_token(&user.id)?;
        let refresh_token = self.tokens.issue_refresh_token(&user.id)?;

        debug!(user_id = %user.id, "login succeeded");
        Ok(LoginResponse {
            id: user.id,
            email: user.email,
            membership: user.membership,
            access_token,
            refresh_token,
        })
    }

    async fn cached_user(&self, id: &str) -> Option<User> {
        let cache = self.cache.as_ref()?;
        let key = user_key(id);

        let lookup = match tokio::time::timeout(self.cache_timeout, cache.get(&key)).await {
            Ok(Ok(Some(raw))) => serde_json::from_slice::<User>(&raw)
                .map(Some)
                .map_err(CacheError::from),
            Ok(Ok(None)) => Ok(None),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CacheError::Timeout),
        };

        match lookup {
            Ok(Some(user)) => {
                debug!(key = %key, "cache hit");
                Some(user)
            }
            Ok(None) => {
                debug!(key = %key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, falling back to store");
                None
            }
        }
    }

    async fn populate(&self, user: &User) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let key = user_key(&user.id);

        let payload = match serde_json::to_vec(user) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to encode user for cache");
                return;
            }
        };

        let result =
            match tokio::time::timeout(self.cache_timeout, cache.set(&key, &payload, self.cache_ttl))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(CacheError::Timeout),
            };
        if let Err(e) = result {
            warn!(key = %key, error = %e, "cache populate failed");
        }
    }

    async fn invalidate(&self, id: &str) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let key = user_key(id);

        let result = match tokio::time::timeout(self.cache_timeout, cache.delete(&key)).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout),
        };
        match result {
            Ok(()) => debug!(key = %key, "cache entry invalidated"),
            Err(e) => warn!(key = %key, error = %e, "cache invalidation failed"),
        }
    }
}
