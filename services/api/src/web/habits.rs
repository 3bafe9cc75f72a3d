//! services/api/src/web/habits.rs
//!
//! Habit CRUD and per-day habit logs. A log is upserted: posting twice for
//! the same habit and date overwrites the earlier entry.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_buddy_core::domain::{Habit, HabitLog};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{port_error, state::AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct HabitRequest {
    pub name: String,
    pub target_value: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct HabitResponse {
    pub id: Uuid,
    pub name: String,
    pub target_value: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<Habit> for HabitResponse {
    fn from(h: Habit) -> Self {
        Self {
            id: h.id,
            name: h.name,
            target_value: h.target_value,
            created_at: h.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct HabitLogRequest {
    pub date: NaiveDate,
    pub completed: bool,
    pub note: Option<String>,
    pub mood: Option<String>,
    pub current_value: Option<i32>,
}

#[derive(Serialize, ToSchema)]
pub struct HabitLogResponse {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub date: NaiveDate,
    pub completed: bool,
    pub note: Option<String>,
    pub mood: Option<String>,
    pub current_value: Option<i32>,
}

impl From<HabitLog> for HabitLogResponse {
    fn from(l: HabitLog) -> Self {
        Self {
            id: l.id,
            habit_id: l.habit_id,
            date: l.date,
            completed: l.completed,
            note: l.note,
            mood: l.mood,
            current_value: l.current_value,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /habits - List the user's habits
#[utoipa::path(
    get,
    path = "/habits",
    responses(
        (status = 200, description = "Habit list", body = [HabitResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_habits_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let habits = state.db.list_habits(user_id).await.map_err(port_error)?;
    let response: Vec<HabitResponse> = habits.into_iter().map(HabitResponse::from).collect();
    Ok(Json(response))
}

/// POST /habits - Create a habit
#[utoipa::path(
    post,
    path = "/habits",
    request_body = HabitRequest,
    responses(
        (status = 201, description = "Habit created", body = HabitResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create_habit_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<HabitRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Habit name is required".to_string()));
    }
    let habit = state
        .db
        .create_habit(user_id, req.name.trim(), req.target_value)
        .await
        .map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(HabitResponse::from(habit))))
}

/// PUT /habits/{id} - Rename a habit or change its target
#[utoipa::path(
    put,
    path = "/habits/{id}",
    request_body = HabitRequest,
    params(("id" = Uuid, Path, description = "Habit id")),
    responses(
        (status = 200, description = "Habit updated", body = HabitResponse),
        (status = 404, description = "Habit not found"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_habit_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(habit_id): Path<Uuid>,
    Json(req): Json<HabitRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Habit name is required".to_string()));
    }
    let habit = state
        .db
        .update_habit(user_id, habit_id, req.name.trim(), req.target_value)
        .await
        .map_err(port_error)?;
    Ok(Json(HabitResponse::from(habit)))
}

/// DELETE /habits/{id} - Delete a habit and its logs
#[utoipa::path(
    delete,
    path = "/habits/{id}",
    params(("id" = Uuid, Path, description = "Habit id")),
    responses(
        (status = 204, description = "Habit deleted"),
        (status = 404, description = "Habit not found"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn delete_habit_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(habit_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .delete_habit(user_id, habit_id)
        .await
        .map_err(port_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /habits/logs - All of the user's habit logs, newest first
#[utoipa::path(
    get,
    path = "/habits/logs",
    responses(
        (status = 200, description = "Habit logs", body = [HabitLogResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_habit_logs_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let logs = state.db.list_habit_logs(user_id).await.map_err(port_error)?;
    let response: Vec<HabitLogResponse> = logs.into_iter().map(HabitLogResponse::from).collect();
    Ok(Json(response))
}

/// PUT /habits/{id}/logs - Upsert the log entry for one day
#[utoipa::path(
    put,
    path = "/habits/{id}/logs",
    request_body = HabitLogRequest,
    params(("id" = Uuid, Path, description = "Habit id")),
    responses(
        (status = 200, description = "Log written", body = HabitLogResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn upsert_habit_log_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(habit_id): Path<Uuid>,
    Json(req): Json<HabitLogRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let log = HabitLog {
        id: Uuid::new_v4(),
        habit_id,
        user_id,
        date: req.date,
        completed: req.completed,
        note: req.note,
        mood: req.mood,
        current_value: req.current_value,
    };
    let written = state.db.upsert_habit_log(&log).await.map_err(port_error)?;
    Ok(Json(HabitLogResponse::from(written)))
}
