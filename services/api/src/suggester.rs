//! services/api/src/suggester.rs
//!
//! Hourly background sweep that turns poor review outcomes into
//! "repeat this set" notifications. A session qualifies when it finished
//! within the last 24 hours with more than one incorrect answer; each
//! session produces at most one notification, ever.

use chrono::{Duration, Utc};
use std::sync::Arc;
use study_buddy_core::ports::{DatabaseService, PortResult};
use tracing::{error, info};

const SUGGESTION_KIND: &str = "repeat_suggestion";
const INCORRECT_THRESHOLD: i32 = 1;

/// One pass over recent review sessions. Returns how many notifications
/// were inserted.
pub async fn run_sweep(db: &dyn DatabaseService) -> PortResult<usize> {
    let since = Utc::now() - Duration::hours(24);
    let sessions = db.list_study_sessions_since(since).await?;

    let mut inserted = 0;
    for session in sessions {
        if session.incorrect <= INCORRECT_THRESHOLD {
            continue;
        }
        if db
            .notification_exists_for_session(session.user_id, SUGGESTION_KIND, session.id)
            .await?
        {
            continue;
        }

        let set_name = db.get_set_name(session.set_id).await?;
        let message = format!(
            "You missed {} cards in \"{}\". Worth another pass.",
            session.incorrect, set_name
        );
        db.create_notification(
            session.user_id,
            SUGGESTION_KIND,
            &message,
            Some(session.set_id),
            Some(session.id),
        )
        .await?;
        inserted += 1;
    }
    Ok(inserted)
}

/// Spawns the sweep loop. Runs until the process exits; a failed pass is
/// logged and the next tick proceeds normally.
pub fn spawn(db: Arc<dyn DatabaseService>, interval_secs: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            match run_sweep(db.as_ref()).await {
                Ok(0) => {}
                Ok(n) => info!("Suggestion sweep inserted {} notification(s)", n),
                Err(e) => error!("Suggestion sweep failed: {:?}", e),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate};
    use std::sync::Mutex;
    use study_buddy_core::domain::*;
    use study_buddy_core::ports::*;
    use uuid::Uuid;

    struct CreatedNotification {
        user_id: Uuid,
        kind: String,
        message: String,
        session_id: Option<Uuid>,
    }

    /// A database stub exposing a fixed batch of review sessions and
    /// remembering every notification the sweep writes.
    struct StubDb {
        sessions: Vec<StudySession>,
        set_name: String,
        notifications: Mutex<Vec<CreatedNotification>>,
    }

    impl StubDb {
        fn new(sessions: Vec<StudySession>) -> Self {
            Self {
                sessions,
                set_name: "Biology".to_string(),
                notifications: Mutex::new(Vec::new()),
            }
        }

        fn notification_count(&self) -> usize {
            self.notifications.lock().unwrap().len()
        }
    }

    fn session(incorrect: i32) -> StudySession {
        StudySession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            set_id: Uuid::new_v4(),
            correct: 5,
            incorrect,
            created_at: Utc::now() - Duration::hours(1),
        }
    }

    #[async_trait]
    impl DatabaseService for StubDb {
        async fn list_study_sessions_since(
            &self,
            _since: DateTime<Utc>,
        ) -> PortResult<Vec<StudySession>> {
            Ok(self.sessions.clone())
        }

        async fn get_set_name(&self, _set_id: Uuid) -> PortResult<String> {
            Ok(self.set_name.clone())
        }

        async fn create_notification(
            &self,
            user_id: Uuid,
            kind: &str,
            message: &str,
            set_id: Option<Uuid>,
            session_id: Option<Uuid>,
        ) -> PortResult<Notification> {
            self.notifications.lock().unwrap().push(CreatedNotification {
                user_id,
                kind: kind.to_string(),
                message: message.to_string(),
                session_id,
            });
            Ok(Notification {
                id: Uuid::new_v4(),
                user_id,
                kind: kind.to_string(),
                message: message.to_string(),
                set_id,
                session_id,
                read: false,
                created_at: Utc::now(),
            })
        }

        async fn notification_exists_for_session(
            &self,
            user_id: Uuid,
            kind: &str,
            session_id: Uuid,
        ) -> PortResult<bool> {
            Ok(self.notifications.lock().unwrap().iter().any(|n| {
                n.user_id == user_id && n.kind == kind && n.session_id == Some(session_id)
            }))
        }

        // None of the remaining port methods are reachable from the sweep.
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
        async fn create_study_plan(
            &self,
            _: Uuid,
            _: &str,
            _: Option<&str>,
            _: Option<NaiveDate>,
            _: Option<i32>,
            _: &[StudyPlanItem],
        ) -> PortResult<StudyPlan> {
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

    #[tokio::test]
    async fn sessions_with_at_most_one_miss_are_skipped() {
        let db = StubDb::new(vec![session(0), session(1)]);
        let inserted = run_sweep(&db).await.unwrap();
        assert_eq!(inserted, 0);
        assert_eq!(db.notification_count(), 0);
    }

    #[tokio::test]
    async fn qualifying_session_is_suggested_exactly_once() {
        let bad = session(3);
        let db = StubDb::new(vec![session(1), bad.clone()]);

        let inserted = run_sweep(&db).await.unwrap();
        assert_eq!(inserted, 1);
        {
            let created = db.notifications.lock().unwrap();
            assert_eq!(created.len(), 1);
            assert_eq!(created[0].kind, "repeat_suggestion");
            assert_eq!(created[0].session_id, Some(bad.id));
            assert!(created[0].message.contains("Biology"));
            assert!(created[0].message.contains('3'));
        }

        // A later pass over the same sessions must not duplicate it.
        let inserted_again = run_sweep(&db).await.unwrap();
        assert_eq!(inserted_again, 0);
        assert_eq!(db.notification_count(), 1);
    }
}
