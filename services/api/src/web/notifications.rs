//! services/api/src/web/notifications.rs
//!
//! Dashboard notifications. The suggestion sweep writes them; these
//! handlers read and dismiss them.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use study_buddy_core::domain::Notification;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{port_error, state::AppState};

#[derive(Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub set_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            message: n.message,
            set_id: n.set_id,
            created_at: n.created_at,
        }
    }
}

/// GET /notifications - Unread notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "Unread notifications", body = [NotificationResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_notifications_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let notifications = state
        .db
        .list_unread_notifications(user_id)
        .await
        .map_err(port_error)?;
    let response: Vec<NotificationResponse> = notifications
        .into_iter()
        .map(NotificationResponse::from)
        .collect();
    Ok(Json(response))
}

/// POST /notifications/{id}/read - Mark a notification read
#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Marked read"),
        (status = 404, description = "Notification not found"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn mark_read_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .mark_notification_read(user_id, notification_id)
        .await
        .map_err(port_error)?;
    Ok(StatusCode::NO_CONTENT)
}
