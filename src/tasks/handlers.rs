use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;
use tracing::instrument;

use crate::{
    auth::{dto::MessageResponse, extractors::CurrentSession},
    error::{AppError, AppResult},
    state::AppState,
    tasks::{
        dto::{CreateTaskRequest, ListTasksQuery, TaskDraft, TaskResponse, UpdateTaskRequest},
        repo_types::{TaskFilter, TaskPatch},
        services::parse_task_id,
    },
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route(
            "/api/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
}

#[instrument(skip(state, query))]
pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
    WithRejection(Query(query), _): WithRejection<Query<ListTasksQuery>, AppError>,
) -> AppResult<Json<Vec<TaskResponse>>> {
    let filter = TaskFilter::try_from(query)?;
    let tasks = state.tasks.list(identity.user_id, &filter).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
    Path(id): Path<String>,
) -> AppResult<Json<TaskResponse>> {
    let task_id = parse_task_id(&id)?;
    let task = state.tasks.get(identity.user_id, task_id).await?;
    Ok(Json(task.into()))
}

#[instrument(skip(state, body))]
pub async fn create_task(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
    WithRejection(Json(body), _): WithRejection<Json<CreateTaskRequest>, AppError>,
) -> AppResult<(StatusCode, Json<TaskResponse>)> {
    let draft = TaskDraft::try_from(body)?;
    let task = state.tasks.create(identity.user_id, draft).await?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

#[instrument(skip(state, body))]
pub async fn update_task(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
    Path(id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateTaskRequest>, AppError>,
) -> AppResult<Json<TaskResponse>> {
    let task_id = parse_task_id(&id)?;
    let patch = TaskPatch::try_from(body)?;
    let task = state.tasks.update(identity.user_id, task_id, patch).await?;
    Ok(Json(task.into()))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    CurrentSession(identity): CurrentSession,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let task_id = parse_task_id(&id)?;
    state.tasks.delete(identity.user_id, task_id).await?;
    Ok(Json(MessageResponse {
        message: "Task deleted successfully",
    }))
}
