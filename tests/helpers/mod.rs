#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header as header_is, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use emotitask::auth::provider::AuthClient;
use emotitask::auth::IdentityGate;
use emotitask::chat::ChatAdvisor;
use emotitask::config::AppConfig;
use emotitask::data::DataAccess;
use emotitask::routes::{self, AppState};
use emotitask::store::memory::MemoryStore;
use emotitask::store::remote::RestClient;
use emotitask::store::Store;

pub const TOKEN_A: &str = "token-a";
pub const TOKEN_B: &str = "token-b";
pub const USER_A: &str = "user-a";
pub const USER_B: &str = "user-b";

pub fn state(store: Store, gate: IdentityGate) -> AppState {
    AppState {
        config: Arc::new(AppConfig::default()),
        data: DataAccess::new(store),
        gate: Arc::new(gate),
        advisor: ChatAdvisor::new(None),
        auth: None,
    }
}

/// Router over a fresh in-memory store where every request is the placeholder user.
pub fn placeholder_app() -> Router {
    let memory = MemoryStore::new(1_000);
    routes::router(state(Store::memory(&memory), IdentityGate::placeholder()))
}

/// Identity provider mock that knows two users, one per token.
pub async fn identity_provider() -> MockServer {
    let server = MockServer::start().await;
    for (token, user) in [(TOKEN_A, USER_A), (TOKEN_B, USER_B)] {
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header_is("authorization", format!("Bearer {token}").as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": user, "email": format!("{user}@example.com")})),
            )
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "invalid JWT"})))
        .mount(&server)
        .await;
    server
}

pub fn provider_gate(server: &MockServer) -> IdentityGate {
    IdentityGate::provider(AuthClient::new(&server.uri(), "anon").unwrap())
}

/// Router over an in-memory store with real token verification against `server`.
pub fn multi_user_app(server: &MockServer) -> Router {
    let memory = MemoryStore::new(1_000);
    routes::router(state(Store::memory(&memory), provider_gate(server)))
}

/// Router over the remote store and identity provider, both served by `server`.
pub fn remote_app(server: &MockServer) -> Router {
    let client = RestClient::new(&server.uri(), "service").unwrap();
    routes::router(state(Store::remote(client), provider_gate(server)))
}

/// Like [`remote_app`], but credential-less requests are the development user.
#[cfg(debug_assertions)]
pub fn dev_remote_app(server: &MockServer) -> Router {
    let client = RestClient::new(&server.uri(), "service").unwrap();
    let gate = provider_gate(server).with_dev_bypass(true);
    routes::router(state(Store::remote(client), gate))
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send one request and return the status with the JSON body (`Null` when empty).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub fn report_task() -> Value {
    json!({
        "title": "Write report",
        "priority": "High",
        "scheduled_date": "2025-01-10T09:00:00Z"
    })
}
