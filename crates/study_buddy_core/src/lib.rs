pub mod domain;
pub mod pomodoro;
pub mod ports;
pub mod review;

pub use domain::{
    DailyStatistics, Flashcard, FlashcardSet, GeneratedCard, Habit, HabitLog, IntervalKind,
    Notification, PomodoroSession, Priority, StudyPlan, StudyPlanItem, StudySession, StudyTopic,
    Task, User, UserCredentials,
};
pub use pomodoro::{CompletedInterval, Phase, PomodoroConfig, PomodoroTimer, TimerError};
pub use ports::{
    CardGenerationService, DatabaseService, NewCard, PlanGenerationService, PortError, PortResult,
    TaskSort,
};
pub use review::{CardReview, EmptyQueue, ReviewGrade, ReviewSession, Tally};
