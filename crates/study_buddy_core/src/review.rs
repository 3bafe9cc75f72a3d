//! crates/study_buddy_core/src/review.rs
//!
//! The flashcard review scheduler: selects due cards, walks them one at
//! a time, and computes each card's next-due instant from a fixed
//! interval table (10 minutes / 1 day / 4 days).
//!
//! All interval arithmetic is plain UTC wall-clock addition; "4 days"
//! means exactly 96 hours from the instant of grading.

use crate::domain::Flashcard;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The single canonical grading vocabulary. The interval table:
/// `Wrong` -> 10 minutes, `Good` -> 1 day, `Easy` -> 4 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewGrade {
    Wrong,
    Good,
    Easy,
}

impl ReviewGrade {
    /// How long until the card comes due again.
    pub fn interval(self) -> Duration {
        match self {
            ReviewGrade::Wrong => Duration::minutes(10),
            ReviewGrade::Good => Duration::hours(24),
            ReviewGrade::Easy => Duration::hours(96),
        }
    }

    /// Every grade except `Wrong` advances the correct tally.
    pub fn counts_as_correct(self) -> bool {
        !matches!(self, ReviewGrade::Wrong)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewGrade::Wrong => "wrong",
            ReviewGrade::Good => "good",
            ReviewGrade::Easy => "easy",
        }
    }
}

impl FromStr for ReviewGrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wrong" => Ok(ReviewGrade::Wrong),
            "good" => Ok(ReviewGrade::Good),
            "easy" => Ok(ReviewGrade::Easy),
            other => Err(format!("'{}' is not a valid review grade", other)),
        }
    }
}

impl fmt::Display for ReviewGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The instant a card graded `grade` at `now` comes due again.
pub fn next_review_at(grade: ReviewGrade, now: DateTime<Utc>) -> DateTime<Utc> {
    now + grade.interval()
}

/// Whether a card is due at `as_of`. An unset `next_review_at` means
/// the card has never been scheduled and is immediately due.
pub fn is_due(card: &Flashcard, as_of: DateTime<Utc>) -> bool {
    match card.next_review_at {
        None => true,
        Some(next) => next <= as_of,
    }
}

/// Selects the cards due at `as_of`, ordered ascending by
/// `next_review_at` with never-scheduled cards first.
pub fn build_queue(cards: Vec<Flashcard>, as_of: DateTime<Utc>) -> Vec<Flashcard> {
    let mut due: Vec<Flashcard> = cards.into_iter().filter(|c| is_due(c, as_of)).collect();
    due.sort_by_key(|c| c.next_review_at);
    due
}

/// No cards qualify for review. A reportable empty-state, not a fault.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("no cards are due for review")]
pub struct EmptyQueue;

/// The scheduling update produced by grading one card. The caller
/// persists this best-effort; a write failure must not block moving to
/// the next card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardReview {
    pub card_id: Uuid,
    pub last_reviewed_at: DateTime<Utc>,
    pub next_review_at: DateTime<Utc>,
}

/// Running tally of a review session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub correct: u32,
    pub total: u32,
}

/// A transient walk over the due-card queue. Complete when the current
/// index reaches the queue length; dropped on `Finish`.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    queue: Vec<Flashcard>,
    index: usize,
    correct: u32,
}

impl ReviewSession {
    /// Builds the session queue from the given cards. Fails with
    /// `EmptyQueue` when nothing is due at `as_of`.
    pub fn build(cards: Vec<Flashcard>, as_of: DateTime<Utc>) -> Result<Self, EmptyQueue> {
        let queue = build_queue(cards, as_of);
        if queue.is_empty() {
            return Err(EmptyQueue);
        }
        Ok(Self {
            queue,
            index: 0,
            correct: 0,
        })
    }

    /// The card currently shown, or `None` once the session is complete.
    pub fn current(&self) -> Option<&Flashcard> {
        self.queue.get(self.index)
    }

    pub fn is_complete(&self) -> bool {
        self.index == self.queue.len()
    }

    pub fn tally(&self) -> Tally {
        Tally {
            correct: self.correct,
            total: self.queue.len() as u32,
        }
    }

    /// Grades the current card, returning the scheduling update to
    /// persist. Returns `None` when the session is already complete.
    pub fn grade_current(&mut self, grade: ReviewGrade, now: DateTime<Utc>) -> Option<CardReview> {
        let card = self.queue.get(self.index)?;
        if grade.counts_as_correct() {
            self.correct += 1;
        }
        Some(CardReview {
            card_id: card.id,
            last_reviewed_at: now,
            next_review_at: next_review_at(grade, now),
        })
    }

    /// Moves the session forward by one card.
    pub fn advance(&mut self) {
        if self.index < self.queue.len() {
            self.index += 1;
        }
    }

    /// Restarts the walk from the beginning with a zeroed tally. Queue
    /// membership is not recomputed.
    pub fn restart(&mut self) {
        self.index = 0;
        self.correct = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn card(next_review_at: Option<DateTime<Utc>>) -> Flashcard {
        Flashcard {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            set_id: Uuid::new_v4(),
            question: "q".to_string(),
            answer: "a".to_string(),
            image_url: None,
            last_reviewed_at: None,
            next_review_at,
            created_at: t0(),
        }
    }

    #[test]
    fn interval_table_is_exact() {
        let now = t0();
        assert_eq!(
            next_review_at(ReviewGrade::Wrong, now),
            now + Duration::minutes(10)
        );
        assert_eq!(
            next_review_at(ReviewGrade::Good, now),
            now + Duration::hours(24)
        );
        // Grading at 2024-01-01T00:00:00Z with Easy yields 2024-01-05T00:00:00Z.
        assert_eq!(
            next_review_at(ReviewGrade::Easy, now),
            Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn unset_next_review_is_due_and_future_is_not() {
        let as_of = t0();
        let queue = build_queue(
            vec![
                card(None),
                card(Some(as_of + Duration::seconds(1))),
                card(Some(as_of)),
            ],
            as_of,
        );
        assert_eq!(queue.len(), 2);
        // Never-scheduled cards sort before scheduled ones.
        assert!(queue[0].next_review_at.is_none());
        assert_eq!(queue[1].next_review_at, Some(as_of));
    }

    #[test]
    fn empty_queue_is_reported() {
        let as_of = t0();
        let cards = vec![card(Some(as_of + Duration::hours(1)))];
        assert!(matches!(ReviewSession::build(cards, as_of), Err(EmptyQueue)));
    }

    #[test]
    fn session_of_three_completes_after_three_advances() {
        let as_of = t0();
        let mut session =
            ReviewSession::build(vec![card(None), card(None), card(None)], as_of).unwrap();
        assert_eq!(session.tally(), Tally { correct: 0, total: 3 });

        session.grade_current(ReviewGrade::Good, as_of).unwrap();
        session.advance();
        session.grade_current(ReviewGrade::Wrong, as_of).unwrap();
        session.advance();
        assert!(!session.is_complete());
        session.grade_current(ReviewGrade::Easy, as_of).unwrap();
        session.advance();

        assert!(session.is_complete());
        assert!(session.current().is_none());
        assert_eq!(session.tally(), Tally { correct: 2, total: 3 });
    }

    #[test]
    fn restart_resets_index_and_tally_without_requeueing() {
        let as_of = t0();
        let mut session =
            ReviewSession::build(vec![card(None), card(None), card(None)], as_of).unwrap();
        for _ in 0..3 {
            session.grade_current(ReviewGrade::Good, as_of).unwrap();
            session.advance();
        }
        assert!(session.is_complete());

        session.restart();
        assert!(!session.is_complete());
        assert_eq!(session.tally(), Tally { correct: 0, total: 3 });
        assert!(session.current().is_some());
    }

    #[test]
    fn wrong_grade_does_not_count_as_correct() {
        let as_of = t0();
        let mut session = ReviewSession::build(vec![card(None)], as_of).unwrap();
        let review = session.grade_current(ReviewGrade::Wrong, as_of).unwrap();
        assert_eq!(review.last_reviewed_at, as_of);
        assert_eq!(review.next_review_at, as_of + Duration::minutes(10));
        assert_eq!(session.tally().correct, 0);
    }

    #[test]
    fn grading_a_complete_session_is_a_no_op() {
        let as_of = t0();
        let mut session = ReviewSession::build(vec![card(None)], as_of).unwrap();
        session.advance();
        assert!(session.grade_current(ReviewGrade::Good, as_of).is_none());
    }
}
