//! services/api/src/web/pomodoro.rs
//!
//! Persistence endpoints for completed Pomodoro intervals. The countdown
//! itself runs client-side; the service only records what finished.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_buddy_core::domain::{IntervalKind, PomodoroSession};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{port_error, state::AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RecordIntervalRequest {
    /// "focus", "short_break" or "long_break".
    #[schema(value_type = String)]
    pub kind: IntervalKind,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct IntervalResponse {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub kind: IntervalKind,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl From<PomodoroSession> for IntervalResponse {
    fn from(s: PomodoroSession) -> Self {
        Self {
            id: s.id,
            kind: s.kind,
            started_at: s.started_at,
            ended_at: s.ended_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct FocusCountResponse {
    pub completed_focus_sessions: i64,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /pomodoro/sessions - Record a completed interval
#[utoipa::path(
    post,
    path = "/pomodoro/sessions",
    request_body = RecordIntervalRequest,
    responses(
        (status = 201, description = "Interval recorded", body = IntervalResponse),
        (status = 400, description = "Invalid interval bounds"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn record_interval_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<RecordIntervalRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.ended_at < req.started_at {
        return Err((
            StatusCode::BAD_REQUEST,
            "Interval end must not precede its start".to_string(),
        ));
    }

    let session = state
        .db
        .create_pomodoro_session(user_id, req.kind, req.started_at, req.ended_at)
        .await
        .map_err(port_error)?;

    // Focus minutes roll into the daily statistics row, best-effort.
    if session.kind == IntervalKind::Focus {
        let minutes = ((session.ended_at - session.started_at).num_seconds() / 60) as i32;
        if minutes > 0 {
            let today = session.ended_at.date_naive();
            if let Err(e) = state.db.add_focus_minutes(user_id, today, minutes).await {
                warn!("Failed to update focus statistics: {:?}", e);
            }
        }
    }

    Ok((StatusCode::CREATED, Json(IntervalResponse::from(session))))
}

/// GET /pomodoro/sessions - List recorded intervals, newest first
#[utoipa::path(
    get,
    path = "/pomodoro/sessions",
    responses(
        (status = 200, description = "Recorded intervals", body = [IntervalResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_intervals_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sessions = state
        .db
        .list_pomodoro_sessions(user_id)
        .await
        .map_err(port_error)?;
    let response: Vec<IntervalResponse> =
        sessions.into_iter().map(IntervalResponse::from).collect();
    Ok(Json(response))
}

/// GET /pomodoro/focus-count - Lifetime completed-focus counter
#[utoipa::path(
    get,
    path = "/pomodoro/focus-count",
    responses(
        (status = 200, description = "Completed focus session count", body = FocusCountResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn focus_count_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let count = state
        .db
        .count_focus_sessions(user_id)
        .await
        .map_err(port_error)?;
    Ok(Json(FocusCountResponse {
        completed_focus_sessions: count,
    }))
}
