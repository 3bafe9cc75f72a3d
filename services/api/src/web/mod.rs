//! services/api/src/web/mod.rs
//!
//! HTTP layer: handlers, auth middleware, shared state, and the master
//! OpenAPI definition.

pub mod auth;
pub mod flashcards;
pub mod habits;
pub mod middleware;
pub mod notifications;
pub mod planner;
pub mod pomodoro;
pub mod state;
pub mod stats;
pub mod tasks;

pub use middleware::require_auth;

use axum::http::StatusCode;
use study_buddy_core::ports::PortError;
use utoipa::OpenApi;

/// Maps a port failure to the HTTP response tuple every handler returns.
pub fn port_error(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::GenerationFailed(msg) => (StatusCode::BAD_GATEWAY, msg),
        PortError::Unexpected(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal error occurred".to_string(),
        ),
    }
}

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        tasks::list_tasks_handler,
        tasks::create_task_handler,
        tasks::update_task_handler,
        tasks::delete_task_handler,
        flashcards::list_sets_handler,
        flashcards::create_set_handler,
        flashcards::delete_set_handler,
        flashcards::list_cards_handler,
        flashcards::due_queue_handler,
        flashcards::create_card_handler,
        flashcards::delete_card_handler,
        flashcards::grade_card_handler,
        flashcards::finish_session_handler,
        flashcards::generate_cards_handler,
        pomodoro::record_interval_handler,
        pomodoro::list_intervals_handler,
        pomodoro::focus_count_handler,
        planner::generate_plan_handler,
        planner::list_plans_handler,
        planner::update_plan_items_handler,
        planner::delete_plan_handler,
        habits::list_habits_handler,
        habits::create_habit_handler,
        habits::update_habit_handler,
        habits::delete_habit_handler,
        habits::list_habit_logs_handler,
        habits::upsert_habit_log_handler,
        notifications::list_notifications_handler,
        notifications::mark_read_handler,
        stats::get_stats_handler,
    ),
    components(
        schemas(
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            tasks::CreateTaskRequest,
            tasks::UpdateTaskRequest,
            tasks::TaskResponse,
            flashcards::NewCardRequest,
            flashcards::CreateSetRequest,
            flashcards::SetResponse,
            flashcards::CardResponse,
            flashcards::GradeRequest,
            flashcards::GradeResponse,
            flashcards::FinishSessionRequest,
            flashcards::FinishSessionResponse,
            flashcards::GenerateCardsRequest,
            flashcards::GeneratedCardResponse,
            pomodoro::RecordIntervalRequest,
            pomodoro::IntervalResponse,
            pomodoro::FocusCountResponse,
            planner::GeneratePlanRequest,
            planner::UpdatePlanItemsRequest,
            planner::PlanResponse,
            habits::HabitRequest,
            habits::HabitResponse,
            habits::HabitLogRequest,
            habits::HabitLogResponse,
            notifications::NotificationResponse,
            stats::StatsResponse,
        )
    ),
    tags(
        (name = "Study Buddy API", description = "Pomodoro timers, flashcard review, daily tasks, habits, and AI study plans.")
    )
)]
pub struct ApiDoc;
