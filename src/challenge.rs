//! Daily challenge progression
//!
//! [`ChallengeState`] is a plain value owned by the caller. Every operation
//! that depends on the calendar takes the relevant date explicitly, so streak
//! and day-rollover behavior is fully deterministic.
//!
//! Lifecycle: inactive → active (start) → completed (day 75 finished).
//! Completed is terminal until [`ChallengeState::reset`].

use crate::error::ChallengeError;
use crate::targets::{self, DailyTargets, CHALLENGE_DAYS};
use crate::types::{Baselines, DailyProgress, ExerciseType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Persistence key format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date key
pub fn parse_date(s: &str) -> Result<NaiveDate, ChallengeError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| ChallengeError::DateParseError(format!("{}: {}", s, e)))
}

/// Format a date as its `YYYY-MM-DD` key
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Coarse lifecycle state of the challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Inactive,
    Active,
    Completed,
}

/// The process-wide challenge aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeState {
    pub is_active: bool,
    pub start_date: Option<NaiveDate>,
    /// Current challenge day (1-75)
    pub current_day: u32,
    pub baselines: Baselines,
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_days_completed: u32,
    /// Per-date progress, keyed by `YYYY-MM-DD` when serialized
    #[serde(default)]
    pub daily_progress: BTreeMap<NaiveDate, DailyProgress>,
    pub last_completed_date: Option<NaiveDate>,
    pub challenge_completed: bool,
}

impl Default for ChallengeState {
    fn default() -> Self {
        Self {
            is_active: false,
            start_date: None,
            current_day: 1,
            baselines: Baselines::default(),
            current_streak: 0,
            best_streak: 0,
            total_days_completed: 0,
            daily_progress: BTreeMap::new(),
            last_completed_date: None,
            challenge_completed: false,
        }
    }
}

/// What a `complete_exercise` call changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub date: NaiveDate,
    pub exercise: ExerciseType,
    /// Every exercise for `date` is now done
    pub all_completed: bool,
    /// This call finished the day and updated streak/total counters
    pub day_counted: bool,
    /// This call finished day 75
    pub challenge_completed: bool,
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_days_completed: u32,
}

/// Read-only overview of the challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeSummary {
    pub status: ChallengeStatus,
    pub start_date: Option<NaiveDate>,
    pub current_day: u32,
    pub days_remaining: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub total_days_completed: u32,
    /// Share of the 75 days fully completed (0-100)
    pub completion_percentage: f64,
    pub targets: DailyTargets,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub today: Option<DailyProgress>,
}

impl ChallengeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ChallengeStatus {
        if self.challenge_completed {
            ChallengeStatus::Completed
        } else if self.is_active {
            ChallengeStatus::Active
        } else {
            ChallengeStatus::Inactive
        }
    }

    /// Begin a fresh challenge on `today` with the given day-1 baselines
    pub fn start_challenge(
        &mut self,
        baselines: Baselines,
        today: NaiveDate,
    ) -> Result<(), ChallengeError> {
        if self.challenge_completed {
            warn!("start requested for a completed challenge");
            return Err(ChallengeError::ChallengeCompleted);
        }
        baselines.validate()?;

        *self = Self {
            is_active: true,
            start_date: Some(today),
            current_day: 1,
            baselines,
            ..Self::default()
        };
        self.daily_progress
            .insert(today, DailyProgress::new(today, 1, &baselines));

        info!(start_date = %format_date(today), "challenge started");
        Ok(())
    }

    /// Record one exercise as done for `date`.
    ///
    /// Creates the day's record from the current day and baselines if it does
    /// not exist. Streak and total counters change at most once per date: only
    /// on the call that completes the last outstanding exercise.
    pub fn complete_exercise(
        &mut self,
        date: NaiveDate,
        exercise: ExerciseType,
        actual_count: u32,
    ) -> Result<CompletionOutcome, ChallengeError> {
        self.ensure_active()?;

        let progress = self.ensure_progress(date, self.current_day);
        let was_completed = progress.all_completed;
        progress.mark_completed(exercise, actual_count);
        let all_completed = progress.all_completed;
        let record_day = progress.day;

        debug!(
            date = %format_date(date),
            exercise = %exercise,
            actual = actual_count,
            "exercise completed"
        );

        let mut outcome = CompletionOutcome {
            date,
            exercise,
            all_completed,
            day_counted: false,
            challenge_completed: false,
            current_streak: self.current_streak,
            best_streak: self.best_streak,
            total_days_completed: self.total_days_completed,
        };

        if all_completed && !was_completed && self.last_completed_date != Some(date) {
            self.record_completed_day(date);
            outcome.day_counted = true;

            if record_day >= CHALLENGE_DAYS && !self.challenge_completed {
                self.challenge_completed = true;
                outcome.challenge_completed = true;
                info!(
                    total_days = self.total_days_completed,
                    best_streak = self.best_streak,
                    "75-day challenge completed"
                );
            }

            outcome.current_streak = self.current_streak;
            outcome.best_streak = self.best_streak;
            outcome.total_days_completed = self.total_days_completed;
        }

        Ok(outcome)
    }

    fn record_completed_day(&mut self, date: NaiveDate) {
        self.total_days_completed += 1;

        let continues = self.current_streak == 0
            || self
                .last_completed_date
                .and_then(|last| last.succ_opt())
                .is_some_and(|next| next == date);
        self.current_streak = if continues {
            self.current_streak + 1
        } else {
            1
        };
        self.best_streak = self.best_streak.max(self.current_streak);
        self.last_completed_date = Some(date);

        info!(
            date = %format_date(date),
            streak = self.current_streak,
            best_streak = self.best_streak,
            total_days = self.total_days_completed,
            "day completed"
        );
    }

    /// Move to the next challenge day (capped at 75) and create its record.
    ///
    /// Returns the calendar date of the new current day.
    pub fn advance_day(&mut self) -> Result<NaiveDate, ChallengeError> {
        self.ensure_active()?;

        self.current_day = self.current_day.saturating_add(1).min(CHALLENGE_DAYS);
        let date = self
            .date_for_day(self.current_day)
            .ok_or(ChallengeError::ChallengeInactive)?;
        self.ensure_progress(date, self.current_day);

        info!(day = self.current_day, date = %format_date(date), "advanced to next day");
        Ok(date)
    }

    /// Replace the baselines; today's record (if any) is regenerated from the
    /// current day and its partial completion discarded.
    pub fn update_baselines(
        &mut self,
        baselines: Baselines,
        today: NaiveDate,
    ) -> Result<(), ChallengeError> {
        self.ensure_active()?;
        baselines.validate()?;
        self.baselines = baselines;

        let day = self.current_day;
        if let Some(existing) = self.daily_progress.get_mut(&today) {
            *existing = DailyProgress::new(today, day, &baselines);
            info!(date = %format_date(today), "today's targets regenerated from new baselines");
        }
        Ok(())
    }

    /// Recompute the current day from elapsed calendar days since the start.
    ///
    /// Also creates today's record if it is missing. Returns the synced day.
    pub fn sync_current_day(&mut self, today: NaiveDate) -> Result<u32, ChallengeError> {
        self.ensure_active()?;
        let start = self.start_date.ok_or(ChallengeError::ChallengeInactive)?;

        let elapsed = (today - start).num_days().max(0);
        let day = u32::try_from(elapsed + 1).unwrap_or(CHALLENGE_DAYS);
        self.current_day = targets::clamp_day(day);
        self.ensure_progress(today, self.current_day);

        debug!(day = self.current_day, today = %format_date(today), "current day synced");
        Ok(self.current_day)
    }

    /// Return to the initial inactive state
    pub fn reset(&mut self) {
        info!("challenge reset");
        *self = Self::default();
    }

    pub fn progress_for(&self, date: NaiveDate) -> Option<&DailyProgress> {
        self.daily_progress.get(&date)
    }

    /// Calendar date of a challenge day, if the challenge has started
    pub fn date_for_day(&self, day: u32) -> Option<NaiveDate> {
        let start = self.start_date?;
        start.checked_add_days(chrono::Days::new(u64::from(targets::clamp_day(day) - 1)))
    }

    /// Targets for the current day
    pub fn current_targets(&self) -> DailyTargets {
        targets::daily_targets(&self.baselines, self.current_day)
    }

    pub fn summary(&self, today: NaiveDate) -> ChallengeSummary {
        ChallengeSummary {
            status: self.status(),
            start_date: self.start_date,
            current_day: self.current_day,
            days_remaining: CHALLENGE_DAYS.saturating_sub(self.current_day),
            current_streak: self.current_streak,
            best_streak: self.best_streak,
            total_days_completed: self.total_days_completed,
            completion_percentage: f64::from(self.total_days_completed) / f64::from(CHALLENGE_DAYS)
                * 100.0,
            targets: self.current_targets(),
            today: self.daily_progress.get(&today).cloned(),
        }
    }

    /// A completed challenge is terminal until `reset`
    fn ensure_active(&self) -> Result<(), ChallengeError> {
        if self.challenge_completed {
            warn!("operation rejected: challenge already completed");
            Err(ChallengeError::ChallengeCompleted)
        } else if self.is_active {
            Ok(())
        } else {
            warn!("operation rejected: challenge is not active");
            Err(ChallengeError::ChallengeInactive)
        }
    }

    fn ensure_progress(&mut self, date: NaiveDate, day: u32) -> &mut DailyProgress {
        let baselines = self.baselines;
        self.daily_progress
            .entry(date)
            .or_insert_with(|| DailyProgress::new(date, day, &baselines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn baselines() -> Baselines {
        Baselines {
            pushups: 10,
            squats: 20,
            situps: 15,
            planks: 30,
        }
    }

    fn started(on: &str) -> ChallengeState {
        let mut state = ChallengeState::new();
        state.start_challenge(baselines(), date(on)).unwrap();
        state
    }

    fn complete_day(state: &mut ChallengeState, on: NaiveDate) -> CompletionOutcome {
        let mut last = None;
        for exercise in ExerciseType::ALL {
            last = Some(state.complete_exercise(on, exercise, 99).unwrap());
        }
        last.unwrap()
    }

    #[test]
    fn test_start_creates_day_one() {
        let state = started("2024-03-01");

        assert_eq!(state.status(), ChallengeStatus::Active);
        assert_eq!(state.current_day, 1);
        let today = state.progress_for(date("2024-03-01")).unwrap();
        assert_eq!(today.day, 1);
        assert_eq!(today.exercise(ExerciseType::Pushups).unwrap().target, 10);
        assert_eq!(today.exercise(ExerciseType::Planks).unwrap().target, 30);
    }

    #[test]
    fn test_start_rejects_zero_baseline() {
        let mut state = ChallengeState::new();
        let bad = Baselines {
            planks: 0,
            ..baselines()
        };
        assert!(state.start_challenge(bad, date("2024-03-01")).is_err());
        assert_eq!(state.status(), ChallengeStatus::Inactive);
    }

    #[test]
    fn test_day_counted_only_when_all_exercises_done() {
        let mut state = started("2024-03-01");
        let d = date("2024-03-01");

        let partial = state.complete_exercise(d, ExerciseType::Pushups, 10).unwrap();
        assert!(!partial.all_completed);
        assert!(!partial.day_counted);
        assert_eq!(state.total_days_completed, 0);

        let outcome = complete_day(&mut state, d);
        assert!(outcome.all_completed);
        assert!(outcome.day_counted);
        assert_eq!(state.total_days_completed, 1);
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.best_streak, 1);
        assert_eq!(state.last_completed_date, Some(d));
    }

    #[test]
    fn test_completion_is_idempotent() {
        let mut state = started("2024-03-01");
        let d = date("2024-03-01");
        complete_day(&mut state, d);

        let again = state.complete_exercise(d, ExerciseType::Squats, 50).unwrap();
        assert!(again.all_completed);
        assert!(!again.day_counted);
        assert_eq!(state.total_days_completed, 1);
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.best_streak, 1);

        complete_day(&mut state, d);
        assert_eq!(state.total_days_completed, 1);
    }

    #[test]
    fn test_consecutive_days_extend_streak() {
        let mut state = started("2024-03-01");
        for (i, day) in ["2024-03-01", "2024-03-02", "2024-03-03"].iter().enumerate() {
            let outcome = complete_day(&mut state, date(day));
            assert_eq!(outcome.current_streak, i as u32 + 1);
            state.advance_day().unwrap();
        }
        assert_eq!(state.best_streak, 3);
    }

    #[test]
    fn test_skipped_day_resets_streak() {
        let mut state = started("2024-03-01");
        complete_day(&mut state, date("2024-03-01"));
        complete_day(&mut state, date("2024-03-02"));
        assert_eq!(state.current_streak, 2);

        let outcome = complete_day(&mut state, date("2024-03-04"));
        assert_eq!(outcome.current_streak, 1);
        assert_eq!(state.best_streak, 2);
        assert!(state.current_streak <= state.best_streak);
    }

    #[test]
    fn test_streak_follows_completed_date_not_wall_clock() {
        // Back-filling yesterday's record the day after still continues the streak
        let mut state = started("2024-03-01");
        complete_day(&mut state, date("2024-03-01"));
        let outcome = complete_day(&mut state, date("2024-03-02"));
        assert_eq!(outcome.current_streak, 2);
    }

    #[test]
    fn test_missing_record_created_lazily() {
        let mut state = started("2024-03-01");
        state.current_day = 4;
        let d = date("2024-03-04");
        assert!(state.progress_for(d).is_none());

        state.complete_exercise(d, ExerciseType::Situps, 18).unwrap();
        let record = state.progress_for(d).unwrap();
        assert_eq!(record.day, 4);
        assert_eq!(record.exercise(ExerciseType::Situps).unwrap().target, 18);
        assert_eq!(record.exercise(ExerciseType::Situps).unwrap().actual, Some(18));
        assert!(!record.exercise(ExerciseType::Pushups).unwrap().completed);
    }

    #[test]
    fn test_advance_day_caps_at_75() {
        let mut state = started("2024-01-01");
        for _ in 0..100 {
            state.advance_day().unwrap();
        }
        assert_eq!(state.current_day, 75);

        let last = date("2024-01-01") + chrono::Days::new(74);
        let record = state.progress_for(last).unwrap();
        assert_eq!(record.day, 75);
        assert_eq!(record.exercise(ExerciseType::Pushups).unwrap().target, 84);
        assert_eq!(record.exercise(ExerciseType::Planks).unwrap().target, 400);
    }

    #[test]
    fn test_challenge_completes_once_on_day_75() {
        let mut state = started("2024-01-01");
        for _ in 0..74 {
            state.advance_day().unwrap();
        }
        let last = state.date_for_day(75).unwrap();

        let mut flips = 0;
        for exercise in ExerciseType::ALL {
            let outcome = state.complete_exercise(last, exercise, 100).unwrap();
            if outcome.challenge_completed {
                flips += 1;
            }
        }
        assert_eq!(flips, 1);
        assert_eq!(state.status(), ChallengeStatus::Completed);

        assert!(matches!(
            state.complete_exercise(last, ExerciseType::Pushups, 100),
            Err(ChallengeError::ChallengeCompleted)
        ));
        assert!(state.challenge_completed);
    }

    #[test]
    fn test_completed_challenge_rejects_further_updates() {
        let mut state = started("2024-01-01");
        for _ in 0..74 {
            state.advance_day().unwrap();
        }
        let last = state.date_for_day(75).unwrap();
        complete_day(&mut state, last);
        assert_eq!(
            (
                state.total_days_completed,
                state.current_streak,
                state.best_streak,
                state.current_day
            ),
            (1, 1, 1, 75)
        );
        let before = state.clone();

        let next = last.succ_opt().unwrap();
        assert!(matches!(state.advance_day(), Err(ChallengeError::ChallengeCompleted)));
        for exercise in ExerciseType::ALL {
            assert!(matches!(
                state.complete_exercise(next, exercise, 100),
                Err(ChallengeError::ChallengeCompleted)
            ));
        }
        assert!(matches!(
            state.update_baselines(Baselines { pushups: 50, ..baselines() }, last),
            Err(ChallengeError::ChallengeCompleted)
        ));
        assert!(matches!(
            state.sync_current_day(next),
            Err(ChallengeError::ChallengeCompleted)
        ));

        assert_eq!(state, before);
        assert!(state.progress_for(last).unwrap().all_completed);
        assert_eq!(state.status(), ChallengeStatus::Completed);
    }

    #[test]
    fn test_advance_day_saturates_out_of_range_day() {
        let mut state = started("2024-01-01");
        state.current_day = u32::MAX;

        let advanced_to = state.advance_day().unwrap();
        assert_eq!(state.current_day, 75);
        assert_eq!(advanced_to, state.date_for_day(75).unwrap());
    }

    #[test]
    fn test_completed_challenge_is_terminal_until_reset() {
        let mut state = started("2024-01-01");
        state.current_day = 75;
        complete_day(&mut state, date("2024-03-15"));
        assert_eq!(state.status(), ChallengeStatus::Completed);

        assert!(matches!(
            state.start_challenge(baselines(), date("2024-04-01")),
            Err(ChallengeError::ChallengeCompleted)
        ));

        state.reset();
        assert_eq!(state, ChallengeState::default());
        assert!(state.start_challenge(baselines(), date("2024-04-01")).is_ok());
    }

    #[test]
    fn test_update_baselines_regenerates_today() {
        let mut state = started("2024-03-01");
        let d = date("2024-03-01");
        state.complete_exercise(d, ExerciseType::Pushups, 10).unwrap();

        let new = Baselines {
            pushups: 25,
            ..baselines()
        };
        state.update_baselines(new, d).unwrap();

        let record = state.progress_for(d).unwrap();
        let pushups = record.exercise(ExerciseType::Pushups).unwrap();
        assert_eq!(pushups.target, 25);
        assert!(!pushups.completed);
        assert_eq!(pushups.actual, None);
        assert_eq!(state.baselines, new);
    }

    #[test]
    fn test_update_baselines_leaves_other_days() {
        let mut state = started("2024-03-01");
        let first = date("2024-03-01");
        let second = state.advance_day().unwrap();

        state
            .update_baselines(Baselines { squats: 50, ..baselines() }, second)
            .unwrap();

        assert_eq!(
            state.progress_for(first).unwrap().exercise(ExerciseType::Squats).unwrap().target,
            20
        );
        assert_eq!(
            state.progress_for(second).unwrap().exercise(ExerciseType::Squats).unwrap().target,
            51
        );
    }

    #[test]
    fn test_sync_current_day() {
        let mut state = started("2024-03-01");

        assert_eq!(state.sync_current_day(date("2024-03-10")).unwrap(), 10);
        assert_eq!(state.progress_for(date("2024-03-10")).unwrap().day, 10);

        assert_eq!(state.sync_current_day(date("2024-12-31")).unwrap(), 75);
        assert_eq!(state.sync_current_day(date("2024-02-01")).unwrap(), 1);
    }

    #[test]
    fn test_inactive_challenge_rejects_operations() {
        let mut state = ChallengeState::new();
        let d = date("2024-03-01");

        assert!(matches!(
            state.complete_exercise(d, ExerciseType::Pushups, 10),
            Err(ChallengeError::ChallengeInactive)
        ));
        assert!(state.advance_day().is_err());
        assert!(state.sync_current_day(d).is_err());
        assert!(matches!(
            state.update_baselines(baselines(), d),
            Err(ChallengeError::ChallengeInactive)
        ));
        assert_eq!(state.baselines, Baselines::default());
        assert!(state.daily_progress.is_empty());
    }

    #[test]
    fn test_summary() {
        let mut state = started("2024-03-01");
        complete_day(&mut state, date("2024-03-01"));
        let summary = state.summary(date("2024-03-01"));

        assert_eq!(summary.status, ChallengeStatus::Active);
        assert_eq!(summary.days_remaining, 74);
        assert_eq!(summary.total_days_completed, 1);
        assert!((summary.completion_percentage - 100.0 / 75.0).abs() < 1e-9);
        assert_eq!(summary.targets.pushups, 10);
        assert!(summary.today.unwrap().all_completed);
    }

    #[test]
    fn test_state_json_uses_date_keys() {
        let mut state = started("2024-03-01");
        complete_day(&mut state, date("2024-03-01"));

        let json = serde_json::to_value(&state).unwrap();
        assert!(json["daily_progress"]["2024-03-01"].is_object());
        assert_eq!(json["last_completed_date"], "2024-03-01");

        let restored: ChallengeState = serde_json::from_value(json).unwrap();
        assert_eq!(restored, state);
    }

    #[test]
    fn test_parse_date_errors() {
        assert!(matches!(
            parse_date("03/01/2024"),
            Err(ChallengeError::DateParseError(_))
        ));
        assert_eq!(format_date(date("2024-03-01")), "2024-03-01");
    }
}
