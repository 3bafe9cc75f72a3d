//! services/api/src/web/planner.rs
//!
//! The AI study-plan generator. Topics are validated before any network
//! call; the generated plan is only persisted once the adapter has
//! accepted the model's output shape.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_buddy_core::domain::{StudyPlan, StudyPlanItem, StudyTopic};
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::{port_error, state::AppState};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct GeneratePlanRequest {
    pub name: String,
    #[schema(value_type = Vec<Object>)]
    pub topics: Vec<StudyTopic>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePlanItemsRequest {
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<StudyPlanItem>,
}

#[derive(Serialize, ToSchema)]
pub struct PlanResponse {
    pub id: Uuid,
    pub name: String,
    pub subject: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub recommended_minutes: Option<i32>,
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<StudyPlanItem>,
    pub created_at: DateTime<Utc>,
}

impl From<StudyPlan> for PlanResponse {
    fn from(p: StudyPlan) -> Self {
        Self {
            id: p.id,
            name: p.name,
            subject: p.subject,
            deadline: p.deadline,
            recommended_minutes: p.recommended_minutes,
            items: p.items,
            created_at: p.created_at,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /plans/generate - Generate and persist a study plan
///
/// Topic validation happens before the LLM is contacted; a malformed
/// model response fails the request and persists nothing.
#[utoipa::path(
    post,
    path = "/plans/generate",
    request_body = GeneratePlanRequest,
    responses(
        (status = 201, description = "Plan generated and stored", body = PlanResponse),
        (status = 422, description = "A topic failed validation"),
        (status = 502, description = "The model returned unusable output"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn generate_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(req): Json<GeneratePlanRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.name.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "Plan name is required".to_string(),
        ));
    }
    if req.topics.is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "At least one topic is required".to_string(),
        ));
    }
    for topic in &req.topics {
        topic
            .validate()
            .map_err(|msg| (StatusCode::UNPROCESSABLE_ENTITY, msg))?;
    }

    let items = state
        .plan_adapter
        .generate_plan(&req.topics)
        .await
        .map_err(|e| {
            error!("Plan generation failed: {:?}", e);
            port_error(e)
        })?;

    let subject = req.topics.first().map(|t| t.title.clone());
    let deadline = req.topics.iter().map(|t| t.end_date).max();
    let recommended_minutes: i32 = req.topics.iter().map(|t| t.daily_time_minutes).sum();

    let plan = state
        .db
        .create_study_plan(
            user_id,
            req.name.trim(),
            subject.as_deref(),
            deadline,
            Some(recommended_minutes),
            &items,
        )
        .await
        .map_err(port_error)?;

    Ok((StatusCode::CREATED, Json(PlanResponse::from(plan))))
}

/// GET /plans - List stored plans, newest first
#[utoipa::path(
    get,
    path = "/plans",
    responses(
        (status = 200, description = "Stored plans", body = [PlanResponse]),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_plans_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let plans = state
        .db
        .list_study_plans(user_id)
        .await
        .map_err(port_error)?;
    let response: Vec<PlanResponse> = plans.into_iter().map(PlanResponse::from).collect();
    Ok(Json(response))
}

/// PUT /plans/{id}/items - Replace a plan's day entries after editing
#[utoipa::path(
    put,
    path = "/plans/{id}/items",
    request_body = UpdatePlanItemsRequest,
    params(("id" = Uuid, Path, description = "Plan id")),
    responses(
        (status = 204, description = "Items replaced"),
        (status = 404, description = "Plan not found"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn update_plan_items_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(plan_id): Path<Uuid>,
    Json(req): Json<UpdatePlanItemsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .update_plan_items(user_id, plan_id, &req.items)
        .await
        .map_err(port_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /plans/{id} - Delete a stored plan
#[utoipa::path(
    delete,
    path = "/plans/{id}",
    params(("id" = Uuid, Path, description = "Plan id")),
    responses(
        (status = 204, description = "Plan deleted"),
        (status = 404, description = "Plan not found"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn delete_plan_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(plan_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    state
        .db
        .delete_study_plan(user_id, plan_id)
        .await
        .map_err(port_error)?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use study_buddy_core::domain::*;
    use study_buddy_core::ports::*;

    /// A plan adapter stub that returns a fixed result.
    struct StubPlanner {
        result: Result<Vec<StudyPlanItem>, String>,
    }

    #[async_trait]
    impl PlanGenerationService for StubPlanner {
        async fn generate_plan(&self, _topics: &[StudyTopic]) -> PortResult<Vec<StudyPlanItem>> {
            match &self.result {
                Ok(items) => Ok(items.clone()),
                Err(msg) => Err(PortError::GenerationFailed(msg.clone())),
            }
        }
    }

    struct StubCards;

    #[async_trait]
    impl CardGenerationService for StubCards {
        async fn generate_cards(
            &self,
            _topic: &str,
            _language: &str,
        ) -> PortResult<Vec<GeneratedCard>> {
            unimplemented!("not exercised by planner tests")
        }
    }

    /// A database stub that only records plan writes. Everything else is
    /// unreachable from the planner handlers under test.
    struct StubDb {
        created_plans: Mutex<Vec<Vec<StudyPlanItem>>>,
    }

    impl StubDb {
        fn new() -> Self {
            Self {
                created_plans: Mutex::new(Vec::new()),
            }
        }

        fn created(&self) -> Vec<Vec<StudyPlanItem>> {
            self.created_plans.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DatabaseService for StubDb {
        async fn create_study_plan(
            &self,
            user_id: Uuid,
            name: &str,
            subject: Option<&str>,
            deadline: Option<NaiveDate>,
            recommended_minutes: Option<i32>,
            items: &[StudyPlanItem],
        ) -> PortResult<StudyPlan> {
            self.created_plans.lock().unwrap().push(items.to_vec());
            Ok(StudyPlan {
                id: Uuid::new_v4(),
                user_id,
                name: name.to_string(),
                subject: subject.map(str::to_string),
                deadline,
                recommended_minutes,
                progress_minutes: Some(0),
                items: items.to_vec(),
                created_at: Utc::now(),
            })
        }

        // None of the remaining port methods are reachable from the
        // planner handlers.
        async fn create_user_with_email(&self, _: &str, _: &str) -> PortResult<User> {
            unimplemented!()
        }
        async fn get_user_by_email(&self, _: &str) -> PortResult<UserCredentials> {
            unimplemented!()
        }
        async fn get_user(&self, _: Uuid) -> PortResult<User> {
            unimplemented!()
        }
        async fn create_auth_session(
            &self,
            _: &str,
            _: Uuid,
            _: DateTime<Utc>,
        ) -> PortResult<()> {
            unimplemented!()
        }
        async fn validate_auth_session(&self, _: &str) -> PortResult<Uuid> {
            unimplemented!()
        }
        async fn delete_auth_session(&self, _: &str) -> PortResult<()> {
            unimplemented!()
        }
        async fn list_tasks(
            &self,
            _: Uuid,
            _: Option<NaiveDate>,
            _: TaskSort,
        ) -> PortResult<Vec<Task>> {
            unimplemented!()
        }
        async fn create_task(
            &self,
            _: Uuid,
            _: &str,
            _: Priority,
            _: NaiveDate,
        ) -> PortResult<Task> {
            unimplemented!()
        }
        async fn update_task(
            &self,
            _: Uuid,
            _: Uuid,
            _: &str,
            _: Priority,
            _: NaiveDate,
            _: bool,
        ) -> PortResult<Task> {
            unimplemented!()
        }
        async fn delete_task(&self, _: Uuid, _: Uuid) -> PortResult<()> {
            unimplemented!()
        }
        async fn list_sets_with_counts(&self, _: Uuid) -> PortResult<Vec<(FlashcardSet, i64)>> {
            unimplemented!()
        }
        async fn create_set_with_cards(
            &self,
            _: Uuid,
            _: &str,
            _: &[NewCard],
        ) -> PortResult<FlashcardSet> {
            unimplemented!()
        }
        async fn delete_set(&self, _: Uuid, _: Uuid) -> PortResult<()> {
            unimplemented!()
        }
        async fn list_cards_for_set(&self, _: Uuid, _: Uuid) -> PortResult<Vec<Flashcard>> {
            unimplemented!()
        }
        async fn get_card(&self, _: Uuid, _: Uuid) -> PortResult<Flashcard> {
            unimplemented!()
        }
        async fn create_card(&self, _: Uuid, _: Uuid, _: &NewCard) -> PortResult<Flashcard> {
            unimplemented!()
        }
        async fn delete_card(&self, _: Uuid, _: Uuid) -> PortResult<()> {
            unimplemented!()
        }
        async fn update_card_review(
            &self,
            _: Uuid,
            _: Uuid,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> PortResult<()> {
            unimplemented!()
        }
        async fn create_study_session(
            &self,
            _: Uuid,
            _: Uuid,
            _: i32,
            _: i32,
        ) -> PortResult<StudySession> {
            unimplemented!()
        }
        async fn list_study_sessions_since(
            &self,
            _: DateTime<Utc>,
        ) -> PortResult<Vec<StudySession>> {
            unimplemented!()
        }
        async fn get_set_name(&self, _: Uuid) -> PortResult<String> {
            unimplemented!()
        }
        async fn create_pomodoro_session(
            &self,
            _: Uuid,
            _: IntervalKind,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> PortResult<PomodoroSession> {
            unimplemented!()
        }
        async fn list_pomodoro_sessions(&self, _: Uuid) -> PortResult<Vec<PomodoroSession>> {
            unimplemented!()
        }
        async fn count_focus_sessions(&self, _: Uuid) -> PortResult<i64> {
            unimplemented!()
        }
        async fn list_study_plans(&self, _: Uuid) -> PortResult<Vec<StudyPlan>> {
            unimplemented!()
        }
        async fn update_plan_items(
            &self,
            _: Uuid,
            _: Uuid,
            _: &[StudyPlanItem],
        ) -> PortResult<()> {
            unimplemented!()
        }
        async fn delete_study_plan(&self, _: Uuid, _: Uuid) -> PortResult<()> {
            unimplemented!()
        }
        async fn list_habits(&self, _: Uuid) -> PortResult<Vec<Habit>> {
            unimplemented!()
        }
        async fn create_habit(&self, _: Uuid, _: &str, _: Option<i32>) -> PortResult<Habit> {
            unimplemented!()
        }
        async fn update_habit(
            &self,
            _: Uuid,
            _: Uuid,
            _: &str,
            _: Option<i32>,
        ) -> PortResult<Habit> {
            unimplemented!()
        }
        async fn delete_habit(&self, _: Uuid, _: Uuid) -> PortResult<()> {
            unimplemented!()
        }
        async fn list_habit_logs(&self, _: Uuid) -> PortResult<Vec<HabitLog>> {
            unimplemented!()
        }
        async fn upsert_habit_log(&self, _: &HabitLog) -> PortResult<HabitLog> {
            unimplemented!()
        }
        async fn list_unread_notifications(&self, _: Uuid) -> PortResult<Vec<Notification>> {
            unimplemented!()
        }
        async fn mark_notification_read(&self, _: Uuid, _: Uuid) -> PortResult<()> {
            unimplemented!()
        }
        async fn create_notification(
            &self,
            _: Uuid,
            _: &str,
            _: &str,
            _: Option<Uuid>,
            _: Option<Uuid>,
        ) -> PortResult<Notification> {
            unimplemented!()
        }
        async fn notification_exists_for_session(
            &self,
            _: Uuid,
            _: &str,
            _: Uuid,
        ) -> PortResult<bool> {
            unimplemented!()
        }
        async fn add_focus_minutes(&self, _: Uuid, _: NaiveDate, _: i32) -> PortResult<()> {
            unimplemented!()
        }
        async fn add_reviewed_flashcards(&self, _: Uuid, _: NaiveDate, _: i32) -> PortResult<()> {
            unimplemented!()
        }
        async fn get_statistics(&self, _: Uuid, _: NaiveDate) -> PortResult<DailyStatistics> {
            unimplemented!()
        }
    }

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            database_url: "postgres://unused".to_string(),
            log_level: tracing::Level::INFO,
            llm_api_key: None,
            llm_api_base: "http://localhost".to_string(),
            plan_model: "test".to_string(),
            card_model: "test".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
            suggestion_interval_secs: 3600,
        })
    }

    fn state_with(
        db: Arc<StubDb>,
        planner: StubPlanner,
    ) -> Arc<AppState> {
        Arc::new(AppState {
            db: db.clone(),
            config: test_config(),
            plan_adapter: Arc::new(planner),
            card_adapter: Arc::new(StubCards),
        })
    }

    fn topic() -> StudyTopic {
        StudyTopic {
            title: "Algebra".to_string(),
            goal: "Pass the exam".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            daily_time_minutes: 30,
        }
    }

    fn items(n: usize) -> Vec<StudyPlanItem> {
        (0..n)
            .map(|i| StudyPlanItem {
                date: format!("2024-01-0{}", i + 1),
                task: format!("Day {} work", i + 1),
                topic: "Algebra".to_string(),
                duration: "30 min".to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn well_formed_generation_is_persisted() {
        let db = Arc::new(StubDb::new());
        let state = state_with(
            db.clone(),
            StubPlanner {
                result: Ok(items(3)),
            },
        );

        let result = generate_plan_handler(
            State(state),
            Extension(Uuid::new_v4()),
            Json(GeneratePlanRequest {
                name: "Exam prep".to_string(),
                topics: vec![topic()],
            }),
        )
        .await;

        assert!(result.is_ok());
        let created = db.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].len(), 3);
    }

    #[tokio::test]
    async fn malformed_generation_persists_nothing() {
        let db = Arc::new(StubDb::new());
        let state = state_with(
            db.clone(),
            StubPlanner {
                result: Err("malformed plan JSON".to_string()),
            },
        );

        let err = generate_plan_handler(
            State(state),
            Extension(Uuid::new_v4()),
            Json(GeneratePlanRequest {
                name: "Exam prep".to_string(),
                topics: vec![topic()],
            }),
        )
        .await
        .err()
        .expect("generation failure must propagate");

        assert_eq!(err.0, StatusCode::BAD_GATEWAY);
        assert!(db.created().is_empty());
    }

    #[tokio::test]
    async fn invalid_topic_is_rejected_before_generation() {
        let db = Arc::new(StubDb::new());
        let state = state_with(
            db.clone(),
            StubPlanner {
                result: Ok(items(1)),
            },
        );

        let mut bad = topic();
        bad.daily_time_minutes = 0;

        let err = generate_plan_handler(
            State(state),
            Extension(Uuid::new_v4()),
            Json(GeneratePlanRequest {
                name: "Exam prep".to_string(),
                topics: vec![bad],
            }),
        )
        .await
        .err()
        .expect("validation failure must propagate");

        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(db.created().is_empty());
    }
}
