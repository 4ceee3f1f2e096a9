use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::{ApiJson, ApiQuery, AppState, AuthUser};
use crate::error::ApiError;
use crate::models::{Goal, GoalPatch, NewGoal};

#[derive(Debug, Serialize)]
pub struct GoalList {
    pub goals: Vec<Goal>,
    pub total: usize,
}

impl From<Vec<Goal>> for GoalList {
    fn from(goals: Vec<Goal>) -> Self {
        Self {
            total: goals.len(),
            goals,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProgressQuery {
    progress: f64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/goals", get(list_goals).post(create_goal))
        .route("/goals/", get(list_goals).post(create_goal))
        .route(
            "/goals/{id}",
            get(get_goal).put(update_goal).delete(delete_goal),
        )
        .route("/goals/{id}/progress", patch(set_progress))
}

async fn create_goal(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(fields): ApiJson<NewGoal>,
) -> Result<(StatusCode, Json<Goal>), ApiError> {
    let goal = state.data.create_goal(user.id(), fields).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn list_goals(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<GoalList>, ApiError> {
    Ok(Json(state.data.list_goals(user.id()).await?.into()))
}

async fn get_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Goal>, ApiError> {
    state
        .data
        .get_goal(user.id(), &id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Goal"))
}

async fn update_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<GoalPatch>,
) -> Result<Json<Goal>, ApiError> {
    state
        .data
        .update_goal(user.id(), &id, &patch)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Goal"))
}

async fn set_progress(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<ProgressQuery>,
) -> Result<Json<Goal>, ApiError> {
    state
        .data
        .set_goal_progress(user.id(), &id, query.progress)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Goal"))
}

async fn delete_goal(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.data.delete_goal(user.id(), &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Goal"))
    }
}
