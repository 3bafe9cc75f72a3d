//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Queries are runtime-checked (`query_as` + `bind`) so the crate builds
//! without a live database.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use study_buddy_core::domain::{
    DailyStatistics, Flashcard, FlashcardSet, Habit, HabitLog, IntervalKind, Notification,
    PomodoroSession, Priority, StudyPlan, StudyPlanItem, StudySession, Task, User, UserCredentials,
};
use study_buddy_core::ports::{DatabaseService, NewCard, PortError, PortResult, TaskSort};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        other => PortError::Unexpected(other.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    email: Option<String>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct AuthSessionRecord {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct TaskRecord {
    id: Uuid,
    user_id: Uuid,
    title: String,
    priority: String,
    due_date: NaiveDate,
    is_done: bool,
    created_at: DateTime<Utc>,
}
impl TaskRecord {
    fn to_domain(self) -> PortResult<Task> {
        let priority = self.priority.parse::<Priority>().map_err(PortError::Unexpected)?;
        Ok(Task {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            priority,
            due_date: self.due_date,
            is_done: self.is_done,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct SetRecord {
    id: Uuid,
    user_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}
impl SetRecord {
    fn to_domain(self) -> FlashcardSet {
        FlashcardSet {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct SetWithCountRecord {
    id: Uuid,
    user_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    card_count: i64,
}

#[derive(FromRow)]
struct CardRecord {
    id: Uuid,
    user_id: Uuid,
    set_id: Uuid,
    question: String,
    answer: String,
    image_url: Option<String>,
    last_reviewed_at: Option<DateTime<Utc>>,
    next_review_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}
impl CardRecord {
    fn to_domain(self) -> Flashcard {
        Flashcard {
            id: self.id,
            user_id: self.user_id,
            set_id: self.set_id,
            question: self.question,
            answer: self.answer,
            image_url: self.image_url,
            last_reviewed_at: self.last_reviewed_at,
            next_review_at: self.next_review_at,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct StudySessionRecord {
    id: Uuid,
    user_id: Uuid,
    set_id: Uuid,
    correct: i32,
    incorrect: i32,
    created_at: DateTime<Utc>,
}
impl StudySessionRecord {
    fn to_domain(self) -> StudySession {
        StudySession {
            id: self.id,
            user_id: self.user_id,
            set_id: self.set_id,
            correct: self.correct,
            incorrect: self.incorrect,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct PomodoroRecord {
    id: Uuid,
    user_id: Uuid,
    session_type: String,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}
impl PomodoroRecord {
    fn to_domain(self) -> PortResult<PomodoroSession> {
        let kind = self
            .session_type
            .parse::<IntervalKind>()
            .map_err(PortError::Unexpected)?;
        Ok(PomodoroSession {
            id: self.id,
            user_id: self.user_id,
            kind,
            started_at: self.start_time,
            ended_at: self.end_time,
        })
    }
}

#[derive(FromRow)]
struct PlanRecord {
    id: Uuid,
    user_id: Uuid,
    name: String,
    subject: Option<String>,
    deadline: Option<NaiveDate>,
    recommended_minutes: Option<i32>,
    progress_minutes: Option<i32>,
    plan_text: serde_json::Value,
    created_at: DateTime<Utc>,
}
impl PlanRecord {
    fn to_domain(self) -> PortResult<StudyPlan> {
        let items: Vec<StudyPlanItem> = serde_json::from_value(self.plan_text)
            .map_err(|e| PortError::Unexpected(format!("corrupt plan_text column: {}", e)))?;
        Ok(StudyPlan {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            subject: self.subject,
            deadline: self.deadline,
            recommended_minutes: self.recommended_minutes,
            progress_minutes: self.progress_minutes,
            items,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct HabitRecord {
    id: Uuid,
    user_id: Uuid,
    name: String,
    target_value: Option<i32>,
    created_at: DateTime<Utc>,
}
impl HabitRecord {
    fn to_domain(self) -> Habit {
        Habit {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            target_value: self.target_value,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct HabitLogRecord {
    id: Uuid,
    habit_id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
    completed: bool,
    note: Option<String>,
    mood: Option<String>,
    current_value: Option<i32>,
}
impl HabitLogRecord {
    fn to_domain(self) -> HabitLog {
        HabitLog {
            id: self.id,
            habit_id: self.habit_id,
            user_id: self.user_id,
            date: self.date,
            completed: self.completed,
            note: self.note,
            mood: self.mood,
            current_value: self.current_value,
        }
    }
}

#[derive(FromRow)]
struct NotificationRecord {
    id: Uuid,
    user_id: Uuid,
    #[sqlx(rename = "type")]
    kind: String,
    message: String,
    set_id: Option<Uuid>,
    session_id: Option<Uuid>,
    read: bool,
    created_at: DateTime<Utc>,
}
impl NotificationRecord {
    fn to_domain(self) -> Notification {
        Notification {
            id: self.id,
            user_id: self.user_id,
            kind: self.kind,
            message: self.message,
            set_id: self.set_id,
            session_id: self.session_id,
            read: self.read,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct StatisticsRecord {
    user_id: Uuid,
    date: NaiveDate,
    focus_time_minutes: i32,
    reviewed_flashcards: i32,
}
impl StatisticsRecord {
    fn to_domain(self) -> DailyStatistics {
        DailyStatistics {
            user_id: self.user_id,
            date: self.date,
            focus_time_minutes: self.focus_time_minutes,
            reviewed_flashcards: self.reviewed_flashcards,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Auth ---

    async fn create_user_with_email(
        &self,
        email: &str,
        hashed_password: &str,
    ) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, email, hashed_password) VALUES ($1, $2, $3)
             RETURNING user_id, email",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("User with email {} not found", email)))?;
        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, email FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("User {} not found", user_id)))?;
        Ok(record.to_domain())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let record = sqlx::query_as::<_, AuthSessionRecord>(
            "SELECT user_id, expires_at FROM auth_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|_| PortError::Unauthorized)?;
        if record.expires_at <= Utc::now() {
            // Expired rows are dead weight; reap them as they are seen.
            sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
                .bind(session_id)
                .execute(&self.pool)
                .await
                .ok();
            return Err(PortError::Unauthorized);
        }
        Ok(record.user_id)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    // --- Tasks ---

    async fn list_tasks(
        &self,
        user_id: Uuid,
        due_on: Option<NaiveDate>,
        sort: TaskSort,
    ) -> PortResult<Vec<Task>> {
        let order = match sort {
            TaskSort::Priority => {
                "CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END, due_date"
            }
            TaskSort::DueDate => "due_date, created_at",
        };
        let records = match due_on {
            Some(date) => {
                let sql = format!(
                    "SELECT id, user_id, title, priority, due_date, is_done, created_at
                     FROM tasks WHERE user_id = $1 AND due_date = $2 ORDER BY {}",
                    order
                );
                sqlx::query_as::<_, TaskRecord>(&sql)
                    .bind(user_id)
                    .bind(date)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                let sql = format!(
                    "SELECT id, user_id, title, priority, due_date, is_done, created_at
                     FROM tasks WHERE user_id = $1 ORDER BY {}",
                    order
                );
                sqlx::query_as::<_, TaskRecord>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn create_task(
        &self,
        user_id: Uuid,
        title: &str,
        priority: Priority,
        due_date: NaiveDate,
    ) -> PortResult<Task> {
        let record = sqlx::query_as::<_, TaskRecord>(
            "INSERT INTO tasks (user_id, title, priority, due_date) VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, title, priority, due_date, is_done, created_at",
        )
        .bind(user_id)
        .bind(title)
        .bind(priority.as_str())
        .bind(due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: Uuid,
        title: &str,
        priority: Priority,
        due_date: NaiveDate,
        is_done: bool,
    ) -> PortResult<Task> {
        let record = sqlx::query_as::<_, TaskRecord>(
            "UPDATE tasks SET title = $1, priority = $2, due_date = $3, is_done = $4
             WHERE id = $5 AND user_id = $6
             RETURNING id, user_id, title, priority, due_date, is_done, created_at",
        )
        .bind(title)
        .bind(priority.as_str())
        .bind(due_date)
        .bind(is_done)
        .bind(task_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Task {} not found", task_id)))?;
        record.to_domain()
    }

    async fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Task {} not found", task_id)));
        }
        Ok(())
    }

    // --- Flashcard sets and cards ---

    async fn list_sets_with_counts(&self, user_id: Uuid) -> PortResult<Vec<(FlashcardSet, i64)>> {
        let records = sqlx::query_as::<_, SetWithCountRecord>(
            "SELECT s.id, s.user_id, s.name, s.created_at,
                    COUNT(f.id) AS card_count
             FROM flashcard_sets s
             LEFT JOIN flashcards f ON f.set_id = s.id
             WHERE s.user_id = $1
             GROUP BY s.id, s.user_id, s.name, s.created_at
             ORDER BY s.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records
            .into_iter()
            .map(|r| {
                (
                    FlashcardSet {
                        id: r.id,
                        user_id: r.user_id,
                        name: r.name,
                        created_at: r.created_at,
                    },
                    r.card_count,
                )
            })
            .collect())
    }

    async fn create_set_with_cards(
        &self,
        user_id: Uuid,
        name: &str,
        cards: &[NewCard],
    ) -> PortResult<FlashcardSet> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let set = sqlx::query_as::<_, SetRecord>(
            "INSERT INTO flashcard_sets (user_id, name) VALUES ($1, $2)
             RETURNING id, user_id, name, created_at",
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;
        for card in cards {
            sqlx::query(
                "INSERT INTO flashcards (user_id, set_id, question, answer, image_url)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(user_id)
            .bind(set.id)
            .bind(&card.question)
            .bind(&card.answer)
            .bind(&card.image_url)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(set.to_domain())
    }

    async fn delete_set(&self, user_id: Uuid, set_id: Uuid) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("DELETE FROM flashcards WHERE user_id = $1 AND set_id = $2")
            .bind(user_id)
            .bind(set_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        let result = sqlx::query("DELETE FROM flashcard_sets WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(set_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Set {} not found", set_id)));
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn list_cards_for_set(&self, user_id: Uuid, set_id: Uuid) -> PortResult<Vec<Flashcard>> {
        let records = sqlx::query_as::<_, CardRecord>(
            "SELECT id, user_id, set_id, question, answer, image_url,
                    last_reviewed_at, next_review_at, created_at
             FROM flashcards WHERE user_id = $1 AND set_id = $2
             ORDER BY created_at ASC",
        )
        .bind(user_id)
        .bind(set_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_card(&self, user_id: Uuid, card_id: Uuid) -> PortResult<Flashcard> {
        let record = sqlx::query_as::<_, CardRecord>(
            "SELECT id, user_id, set_id, question, answer, image_url,
                    last_reviewed_at, next_review_at, created_at
             FROM flashcards WHERE user_id = $1 AND id = $2",
        )
        .bind(user_id)
        .bind(card_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Flashcard {} not found", card_id)))?;
        Ok(record.to_domain())
    }

    async fn create_card(
        &self,
        user_id: Uuid,
        set_id: Uuid,
        card: &NewCard,
    ) -> PortResult<Flashcard> {
        let record = sqlx::query_as::<_, CardRecord>(
            "INSERT INTO flashcards (user_id, set_id, question, answer, image_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, user_id, set_id, question, answer, image_url,
                       last_reviewed_at, next_review_at, created_at",
        )
        .bind(user_id)
        .bind(set_id)
        .bind(&card.question)
        .bind(&card.answer)
        .bind(&card.image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn delete_card(&self, user_id: Uuid, card_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM flashcards WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(card_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Flashcard {} not found",
                card_id
            )));
        }
        Ok(())
    }

    async fn update_card_review(
        &self,
        user_id: Uuid,
        card_id: Uuid,
        last_reviewed_at: DateTime<Utc>,
        next_review_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE flashcards SET last_reviewed_at = $1, next_review_at = $2
             WHERE user_id = $3 AND id = $4",
        )
        .bind(last_reviewed_at)
        .bind(next_review_at)
        .bind(user_id)
        .bind(card_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Flashcard {} not found",
                card_id
            )));
        }
        Ok(())
    }

    // --- Review sessions ---

    async fn create_study_session(
        &self,
        user_id: Uuid,
        set_id: Uuid,
        correct: i32,
        incorrect: i32,
    ) -> PortResult<StudySession> {
        let record = sqlx::query_as::<_, StudySessionRecord>(
            "INSERT INTO flashcard_study_sessions (user_id, set_id, correct, incorrect)
             VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, set_id, correct, incorrect, created_at",
        )
        .bind(user_id)
        .bind(set_id)
        .bind(correct)
        .bind(incorrect)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_study_sessions_since(
        &self,
        since: DateTime<Utc>,
    ) -> PortResult<Vec<StudySession>> {
        let records = sqlx::query_as::<_, StudySessionRecord>(
            "SELECT id, user_id, set_id, correct, incorrect, created_at
             FROM flashcard_study_sessions WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_set_name(&self, set_id: Uuid) -> PortResult<String> {
        let record = sqlx::query_as::<_, (String,)>(
            "SELECT name FROM flashcard_sets WHERE id = $1",
        )
        .bind(set_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Set {} not found", set_id)))?;
        Ok(record.0)
    }

    // --- Pomodoro sessions ---

    async fn create_pomodoro_session(
        &self,
        user_id: Uuid,
        kind: IntervalKind,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> PortResult<PomodoroSession> {
        let record = sqlx::query_as::<_, PomodoroRecord>(
            "INSERT INTO pomodoro_sessions (user_id, session_type, start_time, end_time)
             VALUES ($1, $2, $3, $4)
             RETURNING id, user_id, session_type, start_time, end_time",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(started_at)
        .bind(ended_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn list_pomodoro_sessions(&self, user_id: Uuid) -> PortResult<Vec<PomodoroSession>> {
        let records = sqlx::query_as::<_, PomodoroRecord>(
            "SELECT id, user_id, session_type, start_time, end_time
             FROM pomodoro_sessions WHERE user_id = $1 ORDER BY start_time DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn count_focus_sessions(&self, user_id: Uuid) -> PortResult<i64> {
        let record = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM pomodoro_sessions WHERE user_id = $1 AND session_type = 'focus'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.0)
    }

    // --- Study plans ---

    async fn create_study_plan(
        &self,
        user_id: Uuid,
        name: &str,
        subject: Option<&str>,
        deadline: Option<NaiveDate>,
        recommended_minutes: Option<i32>,
        items: &[StudyPlanItem],
    ) -> PortResult<StudyPlan> {
        let items_json = serde_json::to_value(items)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let record = sqlx::query_as::<_, PlanRecord>(
            "INSERT INTO study_plan
                 (user_id, name, subject, deadline, recommended_minutes, progress_minutes, plan_text)
             VALUES ($1, $2, $3, $4, $5, 0, $6)
             RETURNING id, user_id, name, subject, deadline, recommended_minutes,
                       progress_minutes, plan_text, created_at",
        )
        .bind(user_id)
        .bind(name)
        .bind(subject)
        .bind(deadline)
        .bind(recommended_minutes)
        .bind(items_json)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn list_study_plans(&self, user_id: Uuid) -> PortResult<Vec<StudyPlan>> {
        let records = sqlx::query_as::<_, PlanRecord>(
            "SELECT id, user_id, name, subject, deadline, recommended_minutes,
                    progress_minutes, plan_text, created_at
             FROM study_plan WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_plan_items(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        items: &[StudyPlanItem],
    ) -> PortResult<()> {
        let items_json = serde_json::to_value(items)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let result = sqlx::query(
            "UPDATE study_plan SET plan_text = $1 WHERE user_id = $2 AND id = $3",
        )
        .bind(items_json)
        .bind(user_id)
        .bind(plan_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Plan {} not found", plan_id)));
        }
        Ok(())
    }

    async fn delete_study_plan(&self, user_id: Uuid, plan_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM study_plan WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(plan_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Plan {} not found", plan_id)));
        }
        Ok(())
    }

    // --- Habits ---

    async fn list_habits(&self, user_id: Uuid) -> PortResult<Vec<Habit>> {
        let records = sqlx::query_as::<_, HabitRecord>(
            "SELECT id, user_id, name, target_value, created_at
             FROM habits WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_habit(
        &self,
        user_id: Uuid,
        name: &str,
        target_value: Option<i32>,
    ) -> PortResult<Habit> {
        let record = sqlx::query_as::<_, HabitRecord>(
            "INSERT INTO habits (user_id, name, target_value) VALUES ($1, $2, $3)
             RETURNING id, user_id, name, target_value, created_at",
        )
        .bind(user_id)
        .bind(name)
        .bind(target_value)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn update_habit(
        &self,
        user_id: Uuid,
        habit_id: Uuid,
        name: &str,
        target_value: Option<i32>,
    ) -> PortResult<Habit> {
        let record = sqlx::query_as::<_, HabitRecord>(
            "UPDATE habits SET name = $1, target_value = $2
             WHERE id = $3 AND user_id = $4
             RETURNING id, user_id, name, target_value, created_at",
        )
        .bind(name)
        .bind(target_value)
        .bind(habit_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, format!("Habit {} not found", habit_id)))?;
        Ok(record.to_domain())
    }

    async fn delete_habit(&self, user_id: Uuid, habit_id: Uuid) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        sqlx::query("DELETE FROM habit_logs WHERE habit_id = $1 AND user_id = $2")
            .bind(habit_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        let result = sqlx::query("DELETE FROM habits WHERE id = $1 AND user_id = $2")
            .bind(habit_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Habit {} not found", habit_id)));
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn list_habit_logs(&self, user_id: Uuid) -> PortResult<Vec<HabitLog>> {
        let records = sqlx::query_as::<_, HabitLogRecord>(
            "SELECT id, habit_id, user_id, date, completed, note, mood, current_value
             FROM habit_logs WHERE user_id = $1 ORDER BY date DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn upsert_habit_log(&self, log: &HabitLog) -> PortResult<HabitLog> {
        let record = sqlx::query_as::<_, HabitLogRecord>(
            "INSERT INTO habit_logs
                 (id, habit_id, user_id, date, completed, note, mood, current_value)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (habit_id, date) DO UPDATE SET
                 completed = EXCLUDED.completed,
                 note = EXCLUDED.note,
                 mood = EXCLUDED.mood,
                 current_value = EXCLUDED.current_value
             RETURNING id, habit_id, user_id, date, completed, note, mood, current_value",
        )
        .bind(log.id)
        .bind(log.habit_id)
        .bind(log.user_id)
        .bind(log.date)
        .bind(log.completed)
        .bind(&log.note)
        .bind(&log.mood)
        .bind(log.current_value)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    // --- Notifications ---

    async fn list_unread_notifications(&self, user_id: Uuid) -> PortResult<Vec<Notification>> {
        let records = sqlx::query_as::<_, NotificationRecord>(
            "SELECT id, user_id, type, message, set_id, session_id, read, created_at
             FROM notifications WHERE user_id = $1 AND read = FALSE
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE user_id = $1 AND id = $2",
        )
        .bind(user_id)
        .bind(notification_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Notification {} not found",
                notification_id
            )));
        }
        Ok(())
    }

    async fn create_notification(
        &self,
        user_id: Uuid,
        kind: &str,
        message: &str,
        set_id: Option<Uuid>,
        session_id: Option<Uuid>,
    ) -> PortResult<Notification> {
        let record = sqlx::query_as::<_, NotificationRecord>(
            "INSERT INTO notifications (user_id, type, message, set_id, session_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, user_id, type, message, set_id, session_id, read, created_at",
        )
        .bind(user_id)
        .bind(kind)
        .bind(message)
        .bind(set_id)
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn notification_exists_for_session(
        &self,
        user_id: Uuid,
        kind: &str,
        session_id: Uuid,
    ) -> PortResult<bool> {
        let record = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM notifications
             WHERE user_id = $1 AND type = $2 AND session_id = $3",
        )
        .bind(user_id)
        .bind(kind)
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.0 > 0)
    }

    // --- Daily statistics rollup ---

    async fn add_focus_minutes(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        minutes: i32,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO statistics (user_id, date, focus_time_minutes)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, date) DO UPDATE SET
                 focus_time_minutes = statistics.focus_time_minutes + EXCLUDED.focus_time_minutes",
        )
        .bind(user_id)
        .bind(date)
        .bind(minutes)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn add_reviewed_flashcards(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        count: i32,
    ) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO statistics (user_id, date, reviewed_flashcards)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id, date) DO UPDATE SET
                 reviewed_flashcards = statistics.reviewed_flashcards + EXCLUDED.reviewed_flashcards",
        )
        .bind(user_id)
        .bind(date)
        .bind(count)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(())
    }

    async fn get_statistics(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> PortResult<DailyStatistics> {
        let record = sqlx::query_as::<_, StatisticsRecord>(
            "SELECT user_id, date, focus_time_minutes, reviewed_flashcards
             FROM statistics WHERE user_id = $1 AND date = $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(match record {
            Some(r) => r.to_domain(),
            // No row yet simply means no activity today.
            None => DailyStatistics {
                user_id,
                date,
                focus_time_minutes: 0,
                reviewed_flashcards: 0,
            },
        })
    }
}
