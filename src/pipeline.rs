//! Workout orchestration
//!
//! Drives a [`PoseFrameSource`] through the rep counter until the day's target
//! is reached, then hands the result to the challenge engine.
//!
//! Flow: PoseFrameSource → RepCounter → on_rep callback → WorkoutSummary →
//! ChallengeState::complete_exercise

use crate::challenge::{ChallengeState, CompletionOutcome};
use crate::config::EngineConfig;
use crate::error::ChallengeError;
use crate::reps::{CounterConfig, RepCounter};
use crate::source::{PoseFrameSource, SyntheticSource};
use crate::types::{ExerciseType, MeasureUnit};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Result of one workout run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub session_id: Uuid,
    pub exercise: ExerciseType,
    pub unit: MeasureUnit,
    /// Reps, or seconds for planks
    pub target: u32,
    pub achieved: u32,
    pub reached: bool,
    pub frames_processed: usize,
    /// Frames that satisfied the exercise's form check
    pub valid_frames: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Stateful runner owning the rep counter
#[derive(Debug, Clone, Default)]
pub struct WorkoutPipeline {
    counter: RepCounter,
}

impl WorkoutPipeline {
    pub fn new(config: CounterConfig) -> Self {
        Self {
            counter: RepCounter::new(config),
        }
    }

    pub fn counter(&self) -> &RepCounter {
        &self.counter
    }

    /// Run one exercise until `target` is reached or the source runs dry.
    ///
    /// `on_rep(count, feedback)` fires whenever the count grows: per rep for
    /// rep-counted exercises, per whole second of valid hold for planks. The
    /// session is stopped before returning.
    pub fn run<S, F>(
        &mut self,
        exercise: ExerciseType,
        target: u32,
        started_at: DateTime<Utc>,
        source: &mut S,
        mut on_rep: F,
    ) -> WorkoutSummary
    where
        S: PoseFrameSource + ?Sized,
        F: FnMut(u32, &str),
    {
        self.counter.start(exercise, started_at);
        info!(exercise = %exercise, goal = target, "workout started");

        let mut achieved = 0;
        let mut frames_processed = 0;
        let mut valid_frames = 0;
        let mut finished_at = started_at;
        let mut hold_ms: i64 = 0;
        let mut last_valid_at: Option<DateTime<Utc>> = None;

        while achieved < target {
            let Some(timed) = source.next_frame() else {
                debug!(exercise = %exercise, "frame source exhausted");
                break;
            };

            let outcome = match self.counter.process(exercise, &timed.frame, timed.at) {
                Ok(outcome) => outcome,
                Err(_) => break,
            };
            frames_processed += 1;
            finished_at = timed.at;

            if outcome.state.is_valid && !outcome.debounced {
                valid_frames += 1;
            }

            let count = match exercise.unit() {
                MeasureUnit::Reps => outcome.state.rep_count,
                MeasureUnit::Seconds => {
                    if outcome.state.is_valid {
                        if let Some(previous) = last_valid_at {
                            hold_ms += (timed.at - previous).num_milliseconds().max(0);
                        }
                        last_valid_at = Some(timed.at);
                    } else {
                        last_valid_at = None;
                    }
                    u32::try_from(hold_ms / 1000).unwrap_or(u32::MAX)
                }
            };

            if count > achieved {
                achieved = count;
                on_rep(achieved, &outcome.state.feedback);
            }
        }

        self.counter.stop(exercise);

        let reached = achieved >= target;
        info!(exercise = %exercise, achieved, goal = target, reached, "workout finished");

        WorkoutSummary {
            session_id: Uuid::new_v4(),
            exercise,
            unit: exercise.unit(),
            target,
            achieved,
            reached,
            frames_processed,
            valid_frames,
            started_at,
            finished_at,
        }
    }

    /// Record a finished workout; only workouts that reached their target
    /// complete the exercise for `date`.
    pub fn record(
        state: &mut ChallengeState,
        date: NaiveDate,
        summary: &WorkoutSummary,
    ) -> Result<Option<CompletionOutcome>, ChallengeError> {
        if !summary.reached {
            debug!(exercise = %summary.exercise, "target not reached, nothing recorded");
            return Ok(None);
        }
        state
            .complete_exercise(date, summary.exercise, summary.achieved)
            .map(Some)
    }
}

/// Frames a simulated workout may consume before giving up
fn simulation_frame_budget(config: &EngineConfig, target: u32) -> usize {
    let tick = config.simulation.tick_ms.max(1);
    let per_unit = (config.simulation.cycle_ms.max(1000) / tick).max(1) as usize;
    per_unit.saturating_mul(target as usize + 2).saturating_mul(2)
}

/// Run a workout against the synthetic frame source
pub fn simulate_workout(
    config: &EngineConfig,
    exercise: ExerciseType,
    target: u32,
    started_at: DateTime<Utc>,
) -> WorkoutSummary {
    let mut source = SyntheticSource::new(exercise, started_at, config.simulation)
        .with_max_frames(simulation_frame_budget(config, target));
    let mut pipeline = WorkoutPipeline::new(config.counter);
    pipeline.run(exercise, target, started_at, &mut source, |count, feedback| {
        debug!(exercise = %exercise, count, feedback, "progress");
    })
}
