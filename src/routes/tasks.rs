use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Serialize;

use super::{ApiJson, AppState, AuthUser};
use crate::error::ApiError;
use crate::models::{NewTask, Task, TaskPatch};

#[derive(Debug, Serialize)]
pub struct TaskList {
    pub tasks: Vec<Task>,
    pub total: usize,
}

impl From<Vec<Task>> for TaskList {
    fn from(tasks: Vec<Task>) -> Self {
        Self {
            total: tasks.len(),
            tasks,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/", get(list_tasks).post(create_task))
        .route(
            "/tasks/{id}",
            get(get_task)
                .put(update_task)
                .patch(update_task)
                .delete(delete_task),
        )
        .route("/tasks/{id}/complete", patch(toggle_task))
}

async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(fields): ApiJson<NewTask>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let task = state.data.create_task(user.id(), fields).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<TaskList>, ApiError> {
    Ok(Json(state.data.list_tasks(user.id()).await?.into()))
}

async fn get_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    state
        .data
        .get_task(user.id(), &id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Task"))
}

async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    state
        .data
        .update_task(user.id(), &id, &patch)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Task"))
}

async fn toggle_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    state
        .data
        .toggle_task(user.id(), &id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Task"))
}

async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.data.delete_task(user.id(), &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Task"))
    }
}
