use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{auth, messages, users, webhook},
    AppState,
};

async fn health() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/login", post(auth::login))
        .route("/users", post(auth::register).get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/messages",
            post(messages::create_message).get(messages::list_messages),
        )
        .route(
            "/messages/:id",
            get(messages::get_message)
                .put(messages::update_message)
                .delete(messages::delete_message),
        )
        .route("/webhooks/membership", post(webhook::membership))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        auth::{TokenIssuer, TokenKind, TokenValidator},
        cache::{user_key, InMemoryCache},
        services::{MessageService, UserService},
        store::{sqlite::memory_pool, SqliteMessageStore, SqliteUserStore},
    };

    const SECRET: &str = "router-secret";
    const API_KEY: &str = "hook-key";

    async fn app() -> (Router, Arc<InMemoryCache>) {
        let pool = memory_pool().await;
        let cache = Arc::new(InMemoryCache::new());
        let users = UserService::new(
            Arc::new(SqliteUserStore::new(pool.clone())),
            Some(cache.clone()),
            TokenIssuer::new(SECRET).unwrap(),
        );
        let state = AppState {
            users: Arc::new(users),
            messages: Arc::new(MessageService::new(Arc::new(SqliteMessageStore::new(pool)))),
            tokens: Arc::new(TokenValidator::new(SECRET).unwrap()),
            api_key: Arc::from(API_KEY),
        };
        (router(state), cache)
    }

    fn request(method: Method, uri: &str, body: Option<Value>, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn signup_and_login(app: &Router, email: &str, password: &str) -> (String, String) {
        let creds = json!({ "email": email, "password": password });
        let (status, _) = send(app, request(Method::POST, "/users", Some(creds.clone()), None)).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(app, request(Method::POST, "/login", Some(creds), None)).await;
        assert_eq!(status, StatusCode::OK);
        (
            body["id"].as_str().unwrap().to_string(),
            body["access_token"].as_str().unwrap().to_string(),
        )
    }

    #[tokio::test]
    async fn signup_login_and_read() {
        let (app, cache) = app().await;
        let creds = json!({ "email": "a@x.com", "password": "secret1" });

        let (status, created) =
            send(&app, request(Method::POST, "/users", Some(creds.clone()), None)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created.get("password_hash").is_none());
        let id = created["id"].as_str().unwrap().to_string();

        let (status, login) = send(&app, request(Method::POST, "/login", Some(creds.clone()), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(login["membership"], false);
        assert!(!login["access_token"].as_str().unwrap().is_empty());
        assert!(!login["refresh_token"].as_str().unwrap().is_empty());

        let (status, again) = send(&app, request(Method::POST, "/users", Some(creds), None)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(again["error"], "user already exists");

        let (status, user) = send(&app, request(Method::GET, &format!("/users/{id}"), None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["email"], "a@x.com");
        assert!(cache.contains(&user_key(&id)));
    }

    #[tokio::test]
    async fn login_failures_look_alike() {
        let (app, _) = app().await;
        signup_and_login(&app, "a@x.com", "secret1").await;

        let (wrong_pw_status, wrong_pw) = send(
            &app,
            request(Method::POST, "/login", Some(json!({ "email": "a@x.com", "password": "nope" })), None),
        )
        .await;
        let (unknown_status, unknown) = send(
            &app,
            request(Method::POST, "/login", Some(json!({ "email": "b@x.com", "password": "nope" })), None),
        )
        .await;

        assert_eq!(wrong_pw_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_pw, unknown);
    }

    #[tokio::test]
    async fn protected_routes_want_an_access_token() {
        let (app, _) = app().await;
        let (id, access) = signup_and_login(&app, "a@x.com", "secret1").await;
        let update = json!({ "email": "b@x.com", "password": "secret2" });
        let uri = format!("/users/{id}");

        let (status, body) = send(&app, request(Method::PUT, &uri, Some(update.clone()), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid or expired token");

        let refresh = TokenIssuer::new(SECRET)
            .unwrap()
            .issue_refresh_token(&id)
            .unwrap();
        let (status, refresh_body) = send(
            &app,
            request(Method::PUT, &uri, Some(update.clone()), Some(&format!("Bearer {refresh}"))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(refresh_body, body);

        let expired = TokenIssuer::new(SECRET)
            .unwrap()
            .issue_at(TokenKind::Access, &id, Utc::now() - Duration::hours(3))
            .unwrap();
        let (status, _) = send(
            &app,
            request(Method::PUT, &uri, Some(update.clone()), Some(&format!("Bearer {expired}"))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, updated) = send(
            &app,
            request(Method::PUT, &uri, Some(update), Some(&format!("Bearer {access}"))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["email"], "b@x.com");
    }

    #[tokio::test]
    async fn users_cannot_touch_each_other() {
        let (app, _) = app().await;
        let (alice, _) = signup_and_login(&app, "a@x.com", "secret1").await;
        let (_, bob_token) = signup_and_login(&app, "b@x.com", "secret2").await;

        let (status, _) = send(
            &app,
            request(
                Method::DELETE,
                &format!("/users/{alice}"),
                None,
                Some(&format!("Bearer {bob_token}")),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn delete_clears_cache() {
        let (app, cache) = app().await;
        let (id, access) = signup_and_login(&app, "a@x.com", "secret1").await;
        let uri = format!("/users/{id}");

        send(&app, request(Method::GET, &uri, None, None)).await;
        assert!(cache.contains(&user_key(&id)));

        let (status, _) = send(
            &app,
            request(Method::DELETE, &uri, None, Some(&format!("Bearer {access}"))),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(!cache.contains(&user_key(&id)));

        let (status, _) = send(&app, request(Method::GET, &uri, None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn membership_webhook() {
        let (app, _) = app().await;
        let (id, _) = signup_and_login(&app, "a@x.com", "secret1").await;
        let event = json!({ "event": "membership_status_updated", "user_id": id });

        let (status, _) = send(
            &app,
            request(Method::POST, "/webhooks/membership", Some(event.clone()), Some("ApiKey wrong")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            request(Method::POST, "/webhooks/membership", Some(event.clone()), Some("ApiKey hook-kez")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            request(
                Method::POST,
                "/webhooks/membership",
                Some(json!({ "event": "something_else", "user_id": id })),
                Some(&format!("ApiKey {API_KEY}")),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            request(
                Method::POST,
                "/webhooks/membership",
                Some(event),
                Some(&format!("ApiKey {API_KEY}")),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, user) = send(&app, request(Method::GET, &format!("/users/{id}"), None, None)).await;
        assert_eq!(user["membership"], true);
    }

    #[tokio::test]
    async fn message_lifecycle() {
        let (app, _) = app().await;
        let (_, alice) = signup_and_login(&app, "a@x.com", "secret1").await;
        let (_, bob) = signup_and_login(&app, "b@x.com", "secret2").await;
        let alice = format!("Bearer {alice}");
        let bob = format!("Bearer {bob}");

        let (status, _) = send(
            &app,
            request(Method::POST, "/messages", Some(json!({ "body": "hello" })), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            request(Method::POST, "/messages", Some(json!({ "body": "  " })), Some(&alice)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, created) = send(
            &app,
            request(Method::POST, "/messages", Some(json!({ "body": "hello" })), Some(&alice)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/messages/{}", created["id"].as_str().unwrap());

        let (status, _) = send(
            &app,
            request(Method::PUT, &uri, Some(json!({ "body": "hijack" })), Some(&bob)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, edited) = send(
            &app,
            request(Method::PUT, &uri, Some(json!({ "body": "edited" })), Some(&alice)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["body"], "edited");

        let (_, listed) = send(&app, request(Method::GET, "/messages", None, None)).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, request(Method::DELETE, &uri, None, Some(&alice))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, request(Method::GET, &uri, None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
