//! HTTP surface: the axum router, shared state and the authenticated-user
//! extractor. Entity handlers live in one submodule per resource.

pub mod auth;
pub mod chat;
pub mod goals;
pub mod projects;
pub mod tasks;

use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, Query, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::provider::AuthClient;
use crate::auth::{AuthError, Identity, IdentityGate};
use crate::chat::ChatAdvisor;
use crate::config::AppConfig;
use crate::data::DataAccess;
use crate::error::ApiError;

/// Everything a handler can reach. Cloned per request; all fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub data: DataAccess,
    pub gate: Arc<IdentityGate>,
    pub advisor: ChatAdvisor,
    /// Sign up / sign in client; `None` when the anon key is missing.
    pub auth: Option<AuthClient>,
}

impl AppState {
    pub fn new(config: AppConfig, data: DataAccess) -> anyhow::Result<Self> {
        let gate = IdentityGate::from_config(&config)?;
        let advisor = ChatAdvisor::from_config(&config);
        let auth = if config.auth_configured() {
            Some(AuthClient::new(
                &config.supabase.url,
                &config.supabase.anon_key,
            )?)
        } else {
            None
        };
        Ok(Self {
            config: Arc::new(config),
            data,
            gate: Arc::new(gate),
            advisor,
            auth,
        })
    }
}

/// Token from an `Authorization: Bearer <token>` header. Anything else counts
/// as no credential.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// The caller, resolved by the identity gate before the handler runs.
pub struct AuthUser {
    pub identity: Identity,
    pub token: Option<String>,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.identity.id
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = bearer_token(&parts.headers);
        let identity = state.gate.resolve(token).await.map_err(|e| match e {
            AuthError::MissingCredential => ApiError::Unauthorized("Authorization header required".into()),
            other => {
                tracing::debug!(error = %other, "credential rejected");
                ApiError::Unauthorized("Invalid authentication token".into())
            }
        })?;
        Ok(AuthUser {
            identity,
            token: token.map(str::to_string),
        })
    }
}

/// `Json` whose rejection is an [`ApiError`], so malformed bodies still get a
/// `{"detail"}` response.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// `Query` with an [`ApiError`] rejection.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, ApiError> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(ApiQuery(value))
    }
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "EmotiTask API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "supabase_configured": state.config.auth_configured(),
        "store_backend": state.data.backend(),
        "openai_configured": state.advisor.uses_llm()
    }))
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::routes())
        .merge(tasks::routes())
        .merge(projects::routes())
        .merge(goals::routes())
        .merge(chat::routes());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&headers("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("abc")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn list_responses_share_one_shape() {
        assert_eq!(
            serde_json::to_value(tasks::TaskList::from(Vec::new())).unwrap(),
            json!({"tasks": [], "total": 0})
        );
        assert_eq!(
            serde_json::to_value(projects::ProjectList::from(Vec::new())).unwrap(),
            json!({"projects": [], "total": 0})
        );
        assert_eq!(
            serde_json::to_value(goals::GoalList::from(Vec::new())).unwrap(),
            json!({"goals": [], "total": 0})
        );
    }
}
