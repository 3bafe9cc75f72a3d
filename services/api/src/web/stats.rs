//! services/api/src/web/stats.rs
//!
//! Read endpoint for the per-day activity rollup. The counters are
//! written by the pomodoro and flashcard handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{port_error, state::AppState};

#[derive(Deserialize)]
pub struct StatsQuery {
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub date: NaiveDate,
    pub focus_time_minutes: i32,
    pub reviewed_flashcards: i32,
}

/// GET /statistics - Daily focus and review counters
#[utoipa::path(
    get,
    path = "/statistics",
    params(("date" = Option<String>, Query, description = "Day to read (YYYY-MM-DD), default today")),
    responses(
        (status = 200, description = "Counters for the day", body = StatsResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let stats = state
        .db
        .get_statistics(user_id, date)
        .await
        .map_err(port_error)?;
    Ok(Json(StatsResponse {
        date: stats.date,
        focus_time_minutes: stats.focus_time_minutes,
        reviewed_flashcards: stats.reviewed_flashcards,
    }))
}
