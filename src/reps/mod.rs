//! Rep counting from pose frames
//!
//! Converts a stream of pose frames into discrete repetition counts and form
//! validity per exercise type.
//!
//! Pipeline: PoseFrame → measure (angle / alignment) → validity → phase state machine

pub mod config;
pub mod counter;
pub mod measure;
pub mod session;

pub use config::{CounterConfig, PlankThresholds, RepThresholds};
pub use counter::RepCounter;
pub use measure::RepProfile;
pub use session::{ExerciseSessionState, FrameOutcome};
