//! seventyfive - On-device engine for a 75-day bodyweight fitness challenge
//!
//! Two halves share one set of types:
//!
//! - **Rep counting**: pose frames → joint angle / alignment measurement →
//!   per-exercise phase state machine → rep count and form feedback.
//! - **Daily challenge**: per-day targets from user baselines, per-exercise
//!   completion, streaks, day advancement and 75-day completion.
//!
//! Frames come from any [`PoseFrameSource`]; the challenge state is a plain
//! value the caller persists through a [`ChallengeStore`].

pub mod challenge;
pub mod config;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod reps;
pub mod source;
pub mod store;
pub mod targets;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use challenge::{
    format_date, parse_date, ChallengeState, ChallengeStatus, ChallengeSummary, CompletionOutcome,
};
pub use config::EngineConfig;
pub use error::ChallengeError;
pub use geometry::{angle, Point};
pub use pipeline::{simulate_workout, WorkoutPipeline, WorkoutSummary};
pub use reps::{CounterConfig, ExerciseSessionState, FrameOutcome, RepCounter};
pub use source::{PoseFrameSource, ScriptedSource, SyntheticSource, TimedFrame};
pub use store::{ChallengeStore, JsonFileStore, MemoryStore};
pub use targets::{daily_targets, DailyTargets, CHALLENGE_DAYS};
pub use types::{
    Baselines, DailyProgress, ExercisePhase, ExerciseProgress, ExerciseType, Keypoint,
    MeasureUnit, PoseFrame,
};

/// Engine version reported by the CLI and FFI
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
