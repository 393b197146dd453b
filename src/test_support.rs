use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::app::build_app;
use crate::config::{AppConfig, GameRules, JwtConfig, StoreBackend};
use crate::state::AppState;

pub fn test_config() -> AppConfig {
    AppConfig {
        store: StoreBackend::Memory,
        jwt: JwtConfig {
            secret: "test".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        },
        games: GameRules::default(),
    }
}

pub fn test_app() -> Router {
    build_app(AppState::in_memory(test_config()))
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    authorization: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(auth) = authorization {
        req = req.header(header::AUTHORIZATION, auth);
    }
    let req = match body {
        Some(json) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

/// Registers a user and returns `(authorization header, user id)`.
pub async fn register(app: &Router, name: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "email": format!("{name}@example.com"),
            "password": "password123",
            "displayName": name,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {name}: {body}");
    let token = body["accessToken"].as_str().unwrap();
    let id = body["user"]["id"].as_str().unwrap();
    (bearer(token), id.to_string())
}
