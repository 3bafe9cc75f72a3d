//! services/api/src/web/tasks.rs
//!
//! Handlers for the daily to-do list.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_buddy_core::domain::{Priority, Task};
use study_buddy_core::ports::TaskSort;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{port_error, state::AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize)]
pub struct ListTasksQuery {
    /// Restrict the list to tasks due on this date.
    pub due_on: Option<NaiveDate>,
    /// "priority" (default) or "due_date".
    pub sort: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    /// "low", "medium" or "high".
    #[schema(value_type = String)]
    pub priority: Priority,
    pub due_date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    pub title: String,
    #[schema(value_type = String)]
    pub priority: Priority,
    pub due_date: NaiveDate,
    pub is_done: bool,
}

#[derive(Serialize, ToSchema)]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    #[schema(value_type = String)]
    pub priority: Priority,
    pub due_date: NaiveDate,
    pub is_done: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            title: t.title,
            priority: t.priority,
            due_date: t.due_date,
            is_done: t.is_done,
            created_at: t.created_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /tasks - List tasks, optionally filtered to one day
#[utoipa::path(
    get,
    path = "/tasks",
    params(
        ("due_on" = Option<String>, Query, description = "Only tasks due on this date (YYYY-MM-DD)"),
        ("sort" = Option<String>, Query, description = "Sort order: priority or due_date")
    ),
    responses(
        (status = 200, description = "Task list", body = [TaskResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<ListTasksQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sort = match query.sort.as_deref() {
        Some("due_date") => TaskSort::DueDate,
        _ => TaskSort::Priority,
    };
    let tasks = state
        .db
        .list_tasks(user_id, query.due_on, sort)
        .await
        .map_err(port_error)?;
    let response: Vec<TaskResponse> = tasks.into_iter().map(TaskResponse::from).collect();
    Ok(Json(response))
}

/// POST /tasks - Create a task
#[utoipa::path(
    post,
    path = "/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }
    let task = state
        .db
        .create_task(user_id, req.title.trim(), req.priority, req.due_date)
        .await
        .map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

/// PUT /tasks/{id} - Update a task, including marking it done
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    request_body = UpdateTaskRequest,
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task updated", body = TaskResponse),
        (status = 404, description = "Task not found"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.title.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Title is required".to_string()));
    }
    let task = state
        .db
        .update_task(
            user_id,
            task_id,
            req.title.trim(),
            req.priority,
            req.due_date,
            req.is_done,
        )
        .await
        .map_err(port_error)?;
    Ok(Json(TaskResponse::from(task)))
}

/// DELETE /tasks/{id} - Delete a task
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    params(("id" = Uuid, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn delete_task_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .delete_task(user_id, task_id)
        .await
        .map_err(port_error)?;
    Ok(StatusCode::NO_CONTENT)
}
