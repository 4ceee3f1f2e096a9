use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{ApiJson, AppState, AuthUser};
use crate::auth::provider::{AuthClient, ProviderUser, Session};
use crate::auth::AuthError;
use crate::error::ApiError;
use crate::models::{ProfilePatch, UserProfile};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Token response for sign up and sign in.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: ProviderUser,
}

impl From<Session> for TokenResponse {
    fn from(session: Session) -> Self {
        Self {
            access_token: session.access_token,
            token_type: session.token_type,
            expires_in: session.expires_in,
            user: session.user,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/signout", post(sign_out))
        .route("/auth/profile", get(get_profile).put(update_profile))
        .route("/auth/me", get(me))
}

/// Just enough to reject obvious typos before a provider round trip.
fn plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && domain.contains('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn provider(state: &AppState) -> Result<&AuthClient, ApiError> {
    state.auth.as_ref().ok_or_else(|| AuthError::NotConfigured.into())
}

async fn sign_up(
    State(state): State<AppState>,
    ApiJson(creds): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    if !plausible_email(&creds.email) {
        return Err(ApiError::BadRequest("Invalid email address".into()));
    }
    if creds.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let outcome = provider(&state)?
        .sign_up(&creds.email, &creds.password)
        .await?;

    // The account exists either way; a missing profile is created on first read.
    if let Err(e) = state.data.profile(&outcome.user.id).await {
        tracing::warn!(user = %outcome.user.id, error = %e, "profile creation after sign up failed");
    }
    tracing::info!(user = %outcome.user.id, "user signed up");

    let response = match outcome.session {
        Some(session) => session.into(),
        // Email confirmation pending: no token yet.
        None => TokenResponse {
            access_token: String::new(),
            token_type: "bearer".into(),
            expires_in: 3600,
            user: outcome.user,
        },
    };
    Ok((StatusCode::CREATED, Json(response)))
}

async fn sign_in(
    State(state): State<AppState>,
    ApiJson(creds): ApiJson<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    let session = provider(&state)?
        .sign_in(&creds.email, &creds.password)
        .await
        .map_err(|e| match e {
            AuthError::Rejected { message, .. } => ApiError::Unauthorized(message),
            other => other.into(),
        })?;
    tracing::info!(user = %session.user.id, "user signed in");
    Ok(Json(session.into()))
}

async fn sign_out(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    if let (Some(client), Some(token)) = (state.auth.as_ref(), user.token.as_deref()) {
        client.sign_out(token).await?;
    }
    Ok(Json(json!({ "message": "Successfully signed out" })))
}

async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.data.profile(user.id()).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.data.update_profile(user.id(), &patch).await?))
}

async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<Value>, ApiError> {
    let profile = state.data.find_profile(user.id()).await?;
    Ok(Json(json!({
        "user": user.identity,
        "profile": profile
    })))
}
