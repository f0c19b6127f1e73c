//! Rep-counting phase state machine
//!
//! Holds at most one live session per exercise type and advances it one pose
//! frame at a time. Push-ups and squats count a rep on the way back up after
//! reaching depth; sit-ups count on the way back down after crunching up.
//! Planks never change phase and only report form validity.

use crate::error::ChallengeError;
use crate::reps::config::{CounterConfig, PlankThresholds, RepThresholds};
use crate::reps::measure::{self, RepProfile, PLANK_ADJUST_FEEDBACK, PLANK_GOOD_FEEDBACK};
use crate::reps::session::{ExerciseSessionState, FrameOutcome};
use crate::types::{ExerciseType, PoseFrame};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Rep counter for all four exercises
#[derive(Debug, Clone, Default)]
pub struct RepCounter {
    config: CounterConfig,
    sessions: BTreeMap<ExerciseType, ExerciseSessionState>,
}

impl RepCounter {
    pub fn new(config: CounterConfig) -> Self {
        Self {
            config,
            sessions: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &CounterConfig {
        &self.config
    }

    /// Start (or restart) the session for an exercise, replacing any live one
    pub fn start(&mut self, exercise: ExerciseType, now: DateTime<Utc>) -> &ExerciseSessionState {
        debug!(exercise = %exercise, "session started");
        let state = ExerciseSessionState::new(exercise, now);
        self.sessions.insert(exercise, state);
        &self.sessions[&exercise]
    }

    /// Discard the session; later frames are rejected until the next `start`
    pub fn stop(&mut self, exercise: ExerciseType) -> Option<ExerciseSessionState> {
        let stopped = self.sessions.remove(&exercise);
        if let Some(ref state) = stopped {
            debug!(exercise = %exercise, reps = state.rep_count, "session stopped");
        }
        stopped
    }

    pub fn is_active(&self, exercise: ExerciseType) -> bool {
        self.sessions.contains_key(&exercise)
    }

    pub fn session(&self, exercise: ExerciseType) -> Option<&ExerciseSessionState> {
        self.sessions.get(&exercise)
    }

    /// Feed one frame into the exercise's session.
    ///
    /// Frames must arrive in timestamp order. Returns
    /// `Err(SessionNotStarted)` without side effects if no session is live.
    pub fn process(
        &mut self,
        exercise: ExerciseType,
        frame: &PoseFrame,
        now: DateTime<Utc>,
    ) -> Result<FrameOutcome, ChallengeError> {
        let config = self.config;
        let Some(state) = self.sessions.get_mut(&exercise) else {
            warn!(exercise = %exercise, "frame received for exercise that is not started");
            return Err(ChallengeError::SessionNotStarted(exercise));
        };

        let outcome = match (config.rep_thresholds(exercise), RepProfile::for_exercise(exercise)) {
            (Some(thresholds), Some(profile)) => {
                process_rep_frame(state, thresholds, &profile, frame, now)
            }
            _ => process_plank_frame(state, &config.planks, frame),
        };

        Ok(outcome)
    }
}

fn process_rep_frame(
    state: &mut ExerciseSessionState,
    thresholds: &RepThresholds,
    profile: &RepProfile,
    frame: &PoseFrame,
    now: DateTime<Utc>,
) -> FrameOutcome {
    let elapsed_ms = state.millis_since_phase_change(now);
    if elapsed_ms < thresholds.debounce_ms {
        debug!(
            exercise = %state.exercise,
            elapsed_ms,
            debounce_ms = thresholds.debounce_ms,
            "frame ignored inside debounce window"
        );
        return FrameOutcome {
            state: state.clone(),
            reps_added: 0,
            transition: None,
            debounced: true,
            measurement: None,
        };
    }

    let measurement = measure::measure(state.exercise, frame);
    let valid = measurement.is_some_and(|value| thresholds.is_valid(value, frame.confidence));
    state.is_valid = valid;

    let mut reps_added = 0;
    let mut transition = None;

    if let (true, Some(value)) = (valid, measurement) {
        if state.current_phase != profile.entry_phase
            && profile.crosses_entry(value, thresholds.enter_threshold)
        {
            state.current_phase = profile.entry_phase;
            state.last_phase_change_at = now;
            state.feedback = profile.entry_feedback.to_string();
            transition = Some(profile.entry_phase);
        } else if state.current_phase == profile.entry_phase
            && profile.crosses_exit(value, thresholds.complete_threshold)
        {
            state.current_phase = profile.exit_phase;
            state.last_phase_change_at = now;
            state.rep_count += 1;
            state.feedback = profile.rep_feedback.to_string();
            transition = Some(profile.exit_phase);
            reps_added = 1;
        }
    }

    if let Some(phase) = transition {
        debug!(
            exercise = %state.exercise,
            phase = ?phase,
            reps = state.rep_count,
            angle = measurement.unwrap_or_default(),
            "phase transition"
        );
    }

    FrameOutcome {
        state: state.clone(),
        reps_added,
        transition,
        debounced: false,
        measurement,
    }
}

fn process_plank_frame(
    state: &mut ExerciseSessionState,
    thresholds: &PlankThresholds,
    frame: &PoseFrame,
) -> FrameOutcome {
    let measurement = measure::measure(state.exercise, frame);
    let valid = measurement.is_some_and(|error| thresholds.is_valid(error, frame.confidence));

    state.is_valid = valid;
    state.feedback = if valid {
        PLANK_GOOD_FEEDBACK
    } else {
        PLANK_ADJUST_FEEDBACK
    }
    .to_string();

    FrameOutcome {
        state: state.clone(),
        reps_added: 0,
        transition: None,
        debounced: false,
        measurement,
    }
}
