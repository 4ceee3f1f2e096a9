use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use super::tasks::TaskList;
use super::{ApiJson, AppState, AuthUser};
use crate::error::ApiError;
use crate::models::{NewProject, Project, ProjectPatch};

#[derive(Debug, Serialize)]
pub struct ProjectList {
    pub projects: Vec<Project>,
    pub total: usize,
}

impl From<Vec<Project>> for ProjectList {
    fn from(projects: Vec<Project>) -> Self {
        Self {
            total: projects.len(),
            projects,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/", get(list_projects).post(create_project))
        .route(
            "/projects/{id}",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/projects/{id}/tasks", get(project_tasks))
}

async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(fields): ApiJson<NewProject>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state.data.create_project(user.id(), fields).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProjectList>, ApiError> {
    Ok(Json(state.data.list_projects(user.id()).await?.into()))
}

async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Project>, ApiError> {
    state
        .data
        .get_project(user.id(), &id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Project"))
}

async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProjectPatch>,
) -> Result<Json<Project>, ApiError> {
    state
        .data
        .update_project(user.id(), &id, &patch)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Project"))
}

async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.data.delete_project(user.id(), &id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Project"))
    }
}

async fn project_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TaskList>, ApiError> {
    state
        .data
        .project_tasks(user.id(), &id)
        .await?
        .map(|tasks| Json(tasks.into()))
        .ok_or(ApiError::NotFound("Project"))
}
