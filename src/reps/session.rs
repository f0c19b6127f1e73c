//! Live session state for one exercise

use crate::types::{ExercisePhase, ExerciseType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of the single live session for an exercise type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSessionState {
    pub exercise: ExerciseType,
    pub rep_count: u32,
    pub current_phase: ExercisePhase,
    pub last_phase_change_at: DateTime<Utc>,
    /// Whether the most recently processed frame satisfied the form predicate
    pub is_valid: bool,
    pub feedback: String,
    pub started_at: DateTime<Utc>,
}

impl ExerciseSessionState {
    pub fn new(exercise: ExerciseType, now: DateTime<Utc>) -> Self {
        Self {
            exercise,
            rep_count: 0,
            current_phase: ExercisePhase::Neutral,
            last_phase_change_at: now,
            is_valid: false,
            feedback: String::new(),
            started_at: now,
        }
    }

    /// Milliseconds since the last phase change (negative if `now` runs backwards)
    pub fn millis_since_phase_change(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_phase_change_at).num_milliseconds()
    }
}

/// Result of feeding one frame into a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameOutcome {
    /// Session state after the frame
    pub state: ExerciseSessionState,
    /// Reps credited by this frame (0 or 1)
    pub reps_added: u32,
    /// Phase entered by this frame, if any
    pub transition: Option<ExercisePhase>,
    /// The frame arrived inside the debounce window and was dropped
    pub debounced: bool,
    /// Measured angle (or plank alignment error); `None` for degenerate or dropped frames
    pub measurement: Option<f64>,
}
