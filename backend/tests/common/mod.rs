//! Helpers for driving the router in-process.
//!
//! Each integration test file compiles this module separately, so helpers
//! used by only one of them would otherwise warn.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use backend::identity::SharedSecretVerifier;
use backend::store::MemoryTaskStore;
use backend::{router, AppConfig, AppState};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";

pub fn test_config(client_url: &str) -> AppConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("AUTH_MODE", "shared_secret"),
        ("AUTH_SHARED_SECRET", SECRET),
        ("STORAGE_MODE", "memory"),
        ("CLIENT_URL", client_url),
        ("STATIC_DIR", "/nonexistent/planner-static"),
    ]);
    AppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()))
        .expect("test configuration is valid")
}

pub fn test_app() -> Router {
    test_app_with_origins("")
}

pub fn test_app_with_origins(client_url: &str) -> Router {
    let state = AppState::new(
        Arc::new(MemoryTaskStore::new()),
        Arc::new(SharedSecretVerifier::new(SECRET)),
        test_config(client_url),
    );
    router(state)
}

#[derive(Serialize)]
struct Claims<'a> {
    sub: &'a str,
    email: String,
    exp: i64,
}

fn mint(uid: &str, exp_offset: i64) -> String {
    let claims = Claims {
        sub: uid,
        email: format!("{uid}@example.com"),
        exp: chrono::Utc::now().timestamp() + exp_offset,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn token_for(uid: &str) -> String {
    mint(uid, 3600)
}

pub fn expired_token_for(uid: &str) -> String {
    mint(uid, -3600)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub async fn send_request(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send_request(app, request).await
}

/// Creates a task as `uid` and returns its id.
pub async fn create_task(app: &Router, uid: &str, body: Value) -> String {
    let response = call(app, Method::POST, "/api/tasks", Some(&token_for(uid)), Some(body)).await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body["data"]["id"].as_str().unwrap().to_string()
}
