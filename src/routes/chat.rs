use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use super::{ApiJson, AppState, AuthUser};
use crate::chat::{ChatMessage, ChatReply};
use crate::error::ApiError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat/message", post(send_message))
        .route("/chat/suggestions", get(suggestions))
}

async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(message): ApiJson<ChatMessage>,
) -> Result<Json<ChatReply>, ApiError> {
    let reply = state
        .advisor
        .respond(&state.data, user.id(), &message)
        .await?;
    Ok(Json(reply))
}

async fn suggestions(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let suggestions = state.advisor.suggestions(&state.data, user.id()).await?;
    Ok(Json(json!({ "suggestions": suggestions })))
}
