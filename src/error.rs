//! Error types for the challenge engine

use crate::types::ExerciseType;
use thiserror::Error;

/// Errors reported by the rep counter, challenge engine and persistence layer
#[derive(Debug, Error)]
pub enum ChallengeError {
    #[error("Exercise not started: {0}")]
    SessionNotStarted(ExerciseType),

    #[error("Challenge is not active")]
    ChallengeInactive,

    #[error("Challenge already completed; reset before starting again")]
    ChallengeCompleted,

    #[error("Invalid baseline: {0}")]
    InvalidBaseline(String),

    #[error("Unknown exercise: {0}")]
    UnknownExercise(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid TOML: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
