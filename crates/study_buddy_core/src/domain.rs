//! crates/study_buddy_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format,
//! except for `StudyPlanItem` which is the JSON shape stored in the plan
//! column and returned by the LLM.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// Represents a user - used throughout the app
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: Uuid,
    pub email: Option<String>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// Priority of a to-do task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("'{}' is not a valid priority", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single entry in the daily to-do list.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub priority: Priority,
    pub due_date: NaiveDate,
    pub is_done: bool,
    pub created_at: DateTime<Utc>,
}

/// A named collection of flashcards.
#[derive(Debug, Clone)]
pub struct FlashcardSet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A single flashcard. A card with no `next_review_at` is immediately due.
#[derive(Debug, Clone)]
pub struct Flashcard {
    pub id: Uuid,
    pub user_id: Uuid,
    pub set_id: Uuid,
    pub question: String,
    pub answer: String,
    pub image_url: Option<String>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The persisted outcome of one finished review session over a set.
#[derive(Debug, Clone)]
pub struct StudySession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub set_id: Uuid,
    pub correct: i32,
    pub incorrect: i32,
    pub created_at: DateTime<Utc>,
}

/// Which interval of the Pomodoro cycle a persisted session covered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    Focus,
    ShortBreak,
    LongBreak,
}

impl IntervalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalKind::Focus => "focus",
            IntervalKind::ShortBreak => "short_break",
            IntervalKind::LongBreak => "long_break",
        }
    }
}

impl FromStr for IntervalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "focus" => Ok(IntervalKind::Focus),
            "short_break" => Ok(IntervalKind::ShortBreak),
            "long_break" => Ok(IntervalKind::LongBreak),
            other => Err(format!("'{}' is not a valid interval kind", other)),
        }
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed Pomodoro interval. Created when an interval completes,
/// never mutated afterwards.
#[derive(Debug, Clone)]
pub struct PomodoroSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: IntervalKind,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// One topic the user wants a study plan for.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StudyTopic {
    pub title: String,
    pub goal: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_time_minutes: i32,
}

impl StudyTopic {
    /// Rejects a topic before any network or store call is made.
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("topic title is required".to_string());
        }
        if self.goal.trim().is_empty() {
            return Err("topic goal is required".to_string());
        }
        if self.daily_time_minutes <= 0 {
            return Err("daily study time must be positive".to_string());
        }
        if self.start_date > self.end_date {
            return Err("start date must not be after end date".to_string());
        }
        Ok(())
    }
}

/// One day of a generated study plan. This is the exact JSON shape the
/// LLM must return and the shape stored in the `plan_text` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlanItem {
    pub date: String,
    pub task: String,
    pub topic: String,
    pub duration: String,
}

/// A persisted, possibly user-edited study plan.
#[derive(Debug, Clone)]
pub struct StudyPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub subject: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub recommended_minutes: Option<i32>,
    pub progress_minutes: Option<i32>,
    pub items: Vec<StudyPlanItem>,
    pub created_at: DateTime<Utc>,
}

/// A question/answer pair produced by the card-generation LLM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCard {
    pub question: String,
    pub answer: String,
}

/// A dashboard notification, e.g. a suggestion to repeat a set.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub message: String,
    pub set_id: Option<Uuid>,
    pub session_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// A recurring habit tracked on the dashboard.
#[derive(Debug, Clone)]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub target_value: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// One day's log entry for a habit.
#[derive(Debug, Clone)]
pub struct HabitLog {
    pub id: Uuid,
    pub habit_id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub completed: bool,
    pub note: Option<String>,
    pub mood: Option<String>,
    pub current_value: Option<i32>,
}

/// Per-user, per-day rollup of activity counters.
#[derive(Debug, Clone)]
pub struct DailyStatistics {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub focus_time_minutes: i32,
    pub reviewed_flashcards: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn topic() -> StudyTopic {
        StudyTopic {
            title: "Algebra".to_string(),
            goal: "Pass the exam".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            daily_time_minutes: 30,
        }
    }

    #[test]
    fn valid_topic_passes_validation() {
        assert!(topic().validate().is_ok());
    }

    #[test]
    fn empty_title_is_rejected() {
        let mut t = topic();
        t.title = "   ".to_string();
        assert!(t.validate().is_err());
    }

    #[test]
    fn non_positive_daily_time_is_rejected() {
        let mut t = topic();
        t.daily_time_minutes = 0;
        assert!(t.validate().is_err());
    }

    #[test]
    fn start_after_end_is_rejected() {
        let mut t = topic();
        t.start_date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(t.validate().is_err());
    }

    #[test]
    fn interval_kind_round_trips_through_str() {
        for kind in [
            IntervalKind::Focus,
            IntervalKind::ShortBreak,
            IntervalKind::LongBreak,
        ] {
            assert_eq!(kind.as_str().parse::<IntervalKind>().unwrap(), kind);
        }
        assert!("nap".parse::<IntervalKind>().is_err());
    }
}
