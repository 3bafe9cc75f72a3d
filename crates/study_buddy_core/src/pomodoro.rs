//! crates/study_buddy_core/src/pomodoro.rs
//!
//! The Pomodoro session controller: a single repeating work/break
//! countdown. The controller is pure - the caller drives it with
//! one-second `tick` calls and persists the `CompletedInterval` records
//! it emits. A failure to persist must never block or reverse a phase
//! transition, so emission is fire-and-forget from the controller's
//! point of view.

use crate::domain::IntervalKind;
use chrono::{DateTime, Duration, Utc};

/// How many completed work phases trigger a long break.
pub const SESSIONS_BEFORE_LONG_BREAK: u32 = 4;

/// Configured durations, in seconds, for each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PomodoroConfig {
    work_secs: u32,
    short_break_secs: u32,
    long_break_secs: u32,
}

impl PomodoroConfig {
    /// All durations must be positive.
    pub fn new(
        work_secs: u32,
        short_break_secs: u32,
        long_break_secs: u32,
    ) -> Result<Self, TimerError> {
        if work_secs == 0 || short_break_secs == 0 || long_break_secs == 0 {
            return Err(TimerError::InvalidDuration);
        }
        Ok(Self {
            work_secs,
            short_break_secs,
            long_break_secs,
        })
    }

    pub fn work_secs(&self) -> u32 {
        self.work_secs
    }

    pub fn short_break_secs(&self) -> u32 {
        self.short_break_secs
    }

    pub fn long_break_secs(&self) -> u32 {
        self.long_break_secs
    }
}

impl Default for PomodoroConfig {
    /// The classic 25 / 5 / 15 minute cycle.
    fn default() -> Self {
        Self {
            work_secs: 25 * 60,
            short_break_secs: 5 * 60,
            long_break_secs: 15 * 60,
        }
    }
}

/// The phase the countdown is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    fn interval_kind(self) -> IntervalKind {
        match self {
            Phase::Work => IntervalKind::Focus,
            Phase::ShortBreak => IntervalKind::ShortBreak,
            Phase::LongBreak => IntervalKind::LongBreak,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimerError {
    #[error("durations must be positive")]
    InvalidDuration,
    #[error("skip is only valid during a break")]
    NotInBreak,
}

/// A finished interval, ready to be persisted as a session record.
///
/// `started_at` is the wall-clock instant the countdown was last
/// started, so a paused-and-resumed interval reports its actual bounds
/// rather than the nominal duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedInterval {
    pub kind: IntervalKind,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// The transient countdown state for the active session. Not persisted
/// mid-flight; only the `CompletedInterval` records it emits are.
#[derive(Debug, Clone)]
pub struct PomodoroTimer {
    config: PomodoroConfig,
    phase: Phase,
    seconds_remaining: u32,
    cycles_completed: u32,
    running: bool,
    started_at: Option<DateTime<Utc>>,
}

impl PomodoroTimer {
    pub fn new(config: PomodoroConfig) -> Self {
        Self {
            config,
            phase: Phase::Work,
            seconds_remaining: config.work_secs,
            cycles_completed: 0,
            running: false,
            started_at: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn cycles_completed(&self) -> u32 {
        self.cycles_completed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds the current phase was configured with.
    pub fn phase_duration(&self) -> u32 {
        match self.phase {
            Phase::Work => self.config.work_secs,
            Phase::ShortBreak => self.config.short_break_secs,
            Phase::LongBreak => self.config.long_break_secs,
        }
    }

    /// Start/Pause toggle. Does not reset `seconds_remaining`. The start
    /// instant is recorded on the first start of an interval so the
    /// persisted record reflects wall-clock bounds.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        if !self.running && self.started_at.is_none() {
            self.started_at = Some(now);
        }
        self.running = !self.running;
    }

    /// Sets the countdown back to the configured duration of the current
    /// phase. Never changes the phase or the completed-cycle count.
    pub fn reset(&mut self) {
        self.running = false;
        self.seconds_remaining = self.phase_duration();
        self.started_at = None;
    }

    /// Forces an immediate return to `Work` with the full work duration.
    /// Only valid in a break phase; no session record is emitted for the
    /// skipped remainder.
    pub fn skip_break(&mut self) -> Result<(), TimerError> {
        if self.phase == Phase::Work {
            return Err(TimerError::NotInBreak);
        }
        self.phase = Phase::Work;
        self.seconds_remaining = self.config.work_secs;
        self.running = false;
        self.started_at = None;
        Ok(())
    }

    /// Swaps in a new configuration. An in-flight countdown is not
    /// rescaled while running; the remaining time is updated only when
    /// the timer is idle.
    pub fn apply_config(&mut self, config: PomodoroConfig) {
        self.config = config;
        if !self.running {
            self.seconds_remaining = self.phase_duration();
        }
    }

    /// One one-second decrement. Returns the completed interval record
    /// when the countdown reaches zero and the phase transitions.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<CompletedInterval> {
        if !self.running {
            return None;
        }
        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining > 0 {
            return None;
        }

        let completed_kind = self.phase.interval_kind();
        let nominal = Duration::seconds(i64::from(self.phase_duration()));
        let started_at = self.started_at.unwrap_or(now - nominal);

        match self.phase {
            Phase::Work => {
                self.cycles_completed += 1;
                if self.cycles_completed % SESSIONS_BEFORE_LONG_BREAK == 0 {
                    self.phase = Phase::LongBreak;
                } else {
                    self.phase = Phase::ShortBreak;
                }
            }
            Phase::ShortBreak | Phase::LongBreak => {
                self.phase = Phase::Work;
            }
        }
        self.seconds_remaining = self.phase_duration();
        self.running = false;
        self.started_at = None;

        Some(CompletedInterval {
            kind: completed_kind,
            started_at,
            ended_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn small_config() -> PomodoroConfig {
        PomodoroConfig::new(3, 2, 5).unwrap()
    }

    /// Runs the current phase to completion, returning the emitted record.
    fn run_phase(timer: &mut PomodoroTimer, start: DateTime<Utc>) -> CompletedInterval {
        timer.toggle(start);
        let mut now = start;
        loop {
            now += Duration::seconds(1);
            if let Some(completed) = timer.tick(now) {
                return completed;
            }
        }
    }

    #[test]
    fn zero_durations_are_rejected() {
        assert_eq!(
            PomodoroConfig::new(0, 5, 15),
            Err(TimerError::InvalidDuration)
        );
        assert_eq!(
            PomodoroConfig::new(25, 0, 15),
            Err(TimerError::InvalidDuration)
        );
    }

    #[test]
    fn long_break_every_fourth_work_phase() {
        let mut timer = PomodoroTimer::new(small_config());
        let mut now = t0();
        for cycle in 1..=SESSIONS_BEFORE_LONG_BREAK {
            let completed = run_phase(&mut timer, now);
            assert_eq!(completed.kind, IntervalKind::Focus);
            if cycle == SESSIONS_BEFORE_LONG_BREAK {
                assert_eq!(timer.phase(), Phase::LongBreak);
            } else {
                assert_eq!(timer.phase(), Phase::ShortBreak);
            }
            now = completed.ended_at;
            let break_record = run_phase(&mut timer, now);
            if cycle == SESSIONS_BEFORE_LONG_BREAK {
                assert_eq!(break_record.kind, IntervalKind::LongBreak);
            } else {
                assert_eq!(break_record.kind, IntervalKind::ShortBreak);
            }
            assert_eq!(timer.phase(), Phase::Work);
            now = break_record.ended_at;
        }
        assert_eq!(timer.cycles_completed(), SESSIONS_BEFORE_LONG_BREAK);
    }

    #[test]
    fn completed_record_carries_wall_clock_bounds() {
        let mut timer = PomodoroTimer::new(small_config());
        let start = t0();
        let completed = run_phase(&mut timer, start);
        assert_eq!(completed.started_at, start);
        assert_eq!(completed.ended_at, start + Duration::seconds(3));
        assert!(completed.ended_at >= completed.started_at);
    }

    #[test]
    fn pause_does_not_reset_remaining_time() {
        let mut timer = PomodoroTimer::new(small_config());
        let mut now = t0();
        timer.toggle(now);
        now += Duration::seconds(1);
        assert!(timer.tick(now).is_none());
        timer.toggle(now); // pause
        assert!(!timer.is_running());
        assert_eq!(timer.seconds_remaining(), 2);
        assert!(timer.tick(now).is_none()); // ticking while paused is a no-op
        assert_eq!(timer.seconds_remaining(), 2);
    }

    #[test]
    fn paused_and_resumed_interval_keeps_original_start() {
        let mut timer = PomodoroTimer::new(small_config());
        let start = t0();
        timer.toggle(start);
        let mut now = start + Duration::seconds(1);
        timer.tick(now);
        timer.toggle(now); // pause
        now += Duration::seconds(30);
        timer.toggle(now); // resume; start instant must not move
        now += Duration::seconds(1);
        timer.tick(now);
        now += Duration::seconds(1);
        let completed = timer.tick(now).expect("phase should complete");
        assert_eq!(completed.started_at, start);
        assert_eq!(completed.ended_at, now);
    }

    #[test]
    fn reset_never_changes_phase_or_cycles() {
        let mut timer = PomodoroTimer::new(small_config());
        let mut now = t0();
        let completed = run_phase(&mut timer, now);
        now = completed.ended_at;
        assert_eq!(timer.phase(), Phase::ShortBreak);

        timer.toggle(now);
        now += Duration::seconds(1);
        timer.tick(now);
        timer.reset();
        assert_eq!(timer.phase(), Phase::ShortBreak);
        assert_eq!(timer.cycles_completed(), 1);
        assert_eq!(timer.seconds_remaining(), 2);
        assert!(!timer.is_running());
    }

    #[test]
    fn skip_break_is_an_error_in_work_phase() {
        let mut timer = PomodoroTimer::new(small_config());
        assert_eq!(timer.skip_break(), Err(TimerError::NotInBreak));
    }

    #[test]
    fn skip_break_returns_to_full_work_duration() {
        let mut timer = PomodoroTimer::new(small_config());
        let completed = run_phase(&mut timer, t0());
        assert_eq!(timer.phase(), Phase::ShortBreak);
        timer.toggle(completed.ended_at);
        timer.tick(completed.ended_at + Duration::seconds(1));

        timer.skip_break().unwrap();
        assert_eq!(timer.phase(), Phase::Work);
        assert_eq!(timer.seconds_remaining(), 3);
        assert!(!timer.is_running());
    }

    #[test]
    fn config_change_is_deferred_while_running() {
        let mut timer = PomodoroTimer::new(small_config());
        timer.toggle(t0());
        timer.apply_config(PomodoroConfig::new(10, 2, 5).unwrap());
        // Still counting down the old duration.
        assert_eq!(timer.seconds_remaining(), 3);

        timer.toggle(t0()); // pause -> idle
        timer.apply_config(PomodoroConfig::new(10, 2, 5).unwrap());
        assert_eq!(timer.seconds_remaining(), 10);
    }
}
