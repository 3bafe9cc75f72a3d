//! crates/study_buddy_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{
    DailyStatistics, Flashcard, FlashcardSet, GeneratedCard, Habit, HabitLog, IntervalKind,
    Notification, PomodoroSession, Priority, StudyPlan, StudyPlanItem, StudySession, StudyTopic,
    Task, User, UserCredentials,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// How a task list should be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSort {
    Priority,
    DueDate,
}

/// Fields of a flashcard set's card written at authoring time.
#[derive(Debug, Clone)]
pub struct NewCard {
    pub question: String,
    pub answer: String,
    pub image_url: Option<String>,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Auth ---
    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Tasks ---
    async fn list_tasks(
        &self,
        user_id: Uuid,
        due_on: Option<NaiveDate>,
        sort: TaskSort,
    ) -> PortResult<Vec<Task>>;

    async fn create_task(
        &self,
        user_id: Uuid,
        title: &str,
        priority: Priority,
        due_date: NaiveDate,
    ) -> PortResult<Task>;

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        title: &str,
        priority: Priority,
        due_date: NaiveDate,
        is_done: bool,
    ) -> PortResult<Task>;

    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> PortResult<()>;

    // --- Flashcard sets and cards ---
    async fn list_sets_with_counts(&self, user_id: Uuid) -> PortResult<Vec<(FlashcardSet, i64)>>;

    /// Creates the set and all of its cards in a single transaction so a
    /// partial failure cannot leave an orphaned set behind.
    async fn create_set_with_cards(
        &self,
        user_id: Uuid,
        name: &str,
        cards: &[NewCard],
    ) -> PortResult<FlashcardSet>;

    /// Deletes the set's cards and then the set itself, transactionally.
    async fn delete_set(&self, user_id: Uuid, set_id: Uuid) -> PortResult<()>;

    async fn list_cards_for_set(&self, user_id: Uuid, set_id: Uuid) -> PortResult<Vec<Flashcard>>;

    async fn get_card(&self, user_id: Uuid, card_id: Uuid) -> PortResult<Flashcard>;

    async fn create_card(
        &self,
        user_id: Uuid,
        set_id: Uuid,
        card: &NewCard,
    ) -> PortResult<Flashcard>;

    async fn delete_card(&self, user_id: Uuid, card_id: Uuid) -> PortResult<()>;

    async fn update_card_review(
        &self,
        user_id: Uuid,
        card_id: Uuid,
        last_reviewed_at: DateTime<Utc>,
        next_review_at: DateTime<Utc>,
    ) -> PortResult<()>;

    // --- Review sessions (persisted outcomes) ---
    async fn create_study_session(
        &self,
        user_id: Uuid,
        set_id: Uuid,
        correct: i32,
        incorrect: i32,
    ) -> PortResult<StudySession>;

    async fn list_study_sessions_since(
        &self,
        since: DateTime<Utc>,
    ) -> PortResult<Vec<StudySession>>;

    async fn get_set_name(&self, set_id: Uuid) -> PortResult<String>;

    // --- Pomodoro sessions ---
    async fn create_pomodoro_session(
        &self,
        user_id: Uuid,
        kind: IntervalKind,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> PortResult<PomodoroSession>;

    async fn list_pomodoro_sessions(&self, user_id: Uuid) -> PortResult<Vec<PomodoroSession>>;

    async fn count_focus_sessions(&self, user_id: Uuid) -> PortResult<i64>;

    // --- Study plans ---
    async fn create_study_plan(
        &self,
        user_id: Uuid,
        name: &str,
        subject: Option<&str>,
        deadline: Option<NaiveDate>,
        recommended_minutes: Option<i32>,
        items: &[StudyPlanItem],
    ) -> PortResult<StudyPlan>;

    async fn list_study_plans(&self, user_id: Uuid) -> PortResult<Vec<StudyPlan>>;

    async fn update_plan_items(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        items: &[StudyPlanItem],
    ) -> PortResult<()>;

    async fn delete_study_plan(&self, user_id: Uuid, plan_id: Uuid) -> PortResult<()>;

    // --- Habits ---
    async fn list_habits(&self, user_id: Uuid) -> PortResult<Vec<Habit>>;

    async fn create_habit(
        &self,
        user_id: Uuid,
        name: &str,
        target_value: Option<i32>,
    ) -> PortResult<Habit>;

    async fn update_habit(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        name: &str,
        target_value: Option<i32>,
    ) -> PortResult<Habit>;

    /// Deletes the habit's logs and then the habit itself, transactionally.
    async fn delete_habit(&self, user_id: Uuid, habit_id: Uuid) -> PortResult<()>;

    async fn list_habit_logs(&self, user_id: Uuid) -> PortResult<Vec<HabitLog>>;

    async fn upsert_habit_log(&self, log: &HabitLog) -> PortResult<HabitLog>;

    // --- Notifications ---
    async fn list_unread_notifications(&self, user_id: Uuid) -> PortResult<Vec<Notification>>;

    async fn mark_notification_read(&self, user_id: Uuid, notification_id: Uuid)
        -> PortResult<()>;

    async fn create_notification(
        &self,
        user_id: Uuid,
        kind: &str,
        message: &str,
        set_id: Option<Uuid>,
        session_id: Option<Uuid>,
    ) -> PortResult<Notification>;

    async fn notification_exists_for_session(
        &self,
        user_id: Uuid,
        kind: &str,
        session_id: Uuid,
    ) -> PortResult<bool>;

    // --- Daily statistics rollup ---
    async fn add_focus_minutes(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        minutes: i32,
    ) -> PortResult<()>;

    async fn add_reviewed_flashcards(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        count: i32,
    ) -> PortResult<()>;

    async fn get_statistics(&self, user_id: Uuid, date: NaiveDate)
        -> PortResult<DailyStatistics>;
}

#[async_trait]
pub trait PlanGenerationService: Send + Sync {
    /// Generates a day-by-day study plan for the given topics. The
    /// implementation must validate the returned shape and fail with
    /// `PortError::GenerationFailed` on malformed or empty output.
    async fn generate_plan(&self, topics: &[StudyTopic]) -> PortResult<Vec<StudyPlanItem>>;
}

#[async_trait]
pub trait CardGenerationService: Send + Sync {
    /// Generates flashcard question/answer pairs for a topic in the
    /// given language.
    async fn generate_cards(&self, topic: &str, language: &str) -> PortResult<Vec<GeneratedCard>>;
}
