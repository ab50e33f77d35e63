mod auth;
mod cache;
mod config;
mod error;
mod extract;
mod handlers;
mod models;
mod rest;
mod services;
mod store;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    auth::{TokenIssuer, TokenValidator},
    cache::{Cache, RedisCache},
    config::Config,
    services::{MessageService, UserService},
    store::{SqliteMessageStore, SqliteUserStore},
};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub messages: Arc<MessageService>,
    pub tokens: Arc<TokenValidator>,
    pub api_key: Arc<str>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env()?;

    let pool = store::connect(
        &config.database_url,
        config.db_max_connections,
        config.db_acquire_timeout,
    )
    .await?;

    let cache: Option<Arc<dyn Cache>> = match &config.redis_url {
        Some(url) => {
            let redis = RedisCache::connect(url).await?;
            tracing::info!("user cache enabled (redis)");
            Some(Arc::new(redis))
        }
        None => {
            tracing::info!("REDIS_URL not set, user reads go straight to the database");
            None
        }
    };
    if config.payment_api_key.is_none() {
        tracing::warn!("PAYMENT_API_KEY not set, payment provider calls are disabled");
    }

    let users = UserService::new(
        Arc::new(SqliteUserStore::new(pool.clone())),
        cache,
        TokenIssuer::new(&config.jwt_secret)?,
    )
    .with_cache_ttl(config.cache_ttl)
    .with_cache_timeout(config.cache_timeout);

    let app_state = AppState {
        users: Arc::new(users),
        messages: Arc::new(MessageService::new(Arc::new(SqliteMessageStore::new(
            pool.clone(),
        )))),
        tokens: Arc::new(TokenValidator::new(&config.jwt_secret)?),
        api_key: Arc::from(config.api_key.as_str()),
    };

    let app = rest::router(app_state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("REST API listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "messenger=debug,tower_http=info".into()),
    );
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format == "json");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
