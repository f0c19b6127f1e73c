//! Per-exercise thresholds for the rep counter

use crate::error::ChallengeError;
use crate::types::ExerciseType;
use serde::{Deserialize, Serialize};

/// Thresholds for a rep-counted exercise.
///
/// `enter_threshold` moves the session into the exercise's working phase
/// (down for push-ups and squats, up for sit-ups); `complete_threshold` moves
/// it back out and credits one rep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepThresholds {
    pub enter_threshold: f64,
    pub complete_threshold: f64,
    /// Minimum time since the last phase change before another is accepted
    pub debounce_ms: i64,
    pub min_valid_angle: f64,
    pub max_valid_angle: f64,
    /// Whether the valid angle bounds themselves are accepted
    #[serde(default)]
    pub inclusive_bounds: bool,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

impl RepThresholds {
    pub fn pushups() -> Self {
        Self {
            enter_threshold: 110.0,
            complete_threshold: 150.0,
            debounce_ms: 800,
            min_valid_angle: 60.0,
            max_valid_angle: 180.0,
            inclusive_bounds: false,
            min_confidence: default_min_confidence(),
        }
    }

    pub fn squats() -> Self {
        Self {
            enter_threshold: 110.0,
            complete_threshold: 160.0,
            debounce_ms: 800,
            min_valid_angle: 80.0,
            max_valid_angle: 180.0,
            inclusive_bounds: false,
            min_confidence: default_min_confidence(),
        }
    }

    pub fn situps() -> Self {
        Self {
            enter_threshold: 40.0,
            complete_threshold: 20.0,
            debounce_ms: 800,
            min_valid_angle: 0.0,
            max_valid_angle: 90.0,
            inclusive_bounds: true,
            min_confidence: default_min_confidence(),
        }
    }

    /// Validity predicate: confident pose and a plausible angle
    pub fn is_valid(&self, angle: f64, confidence: f64) -> bool {
        let in_range = if self.inclusive_bounds {
            angle >= self.min_valid_angle && angle <= self.max_valid_angle
        } else {
            angle > self.min_valid_angle && angle < self.max_valid_angle
        };
        confidence > self.min_confidence && in_range
    }
}

/// Thresholds for the plank hold
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlankThresholds {
    /// Maximum |shoulderY − hipY| + |hipY − ankleY|, in pixels
    pub max_alignment_error: f64,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

impl Default for PlankThresholds {
    fn default() -> Self {
        Self {
            max_alignment_error: 50.0,
            min_confidence: default_min_confidence(),
        }
    }
}

impl PlankThresholds {
    pub fn is_valid(&self, alignment_error: f64, confidence: f64) -> bool {
        alignment_error < self.max_alignment_error && confidence > self.min_confidence
    }
}

/// Threshold table for every exercise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterConfig {
    #[serde(default = "RepThresholds::pushups")]
    pub pushups: RepThresholds,
    #[serde(default = "RepThresholds::squats")]
    pub squats: RepThresholds,
    #[serde(default = "RepThresholds::situps")]
    pub situps: RepThresholds,
    #[serde(default)]
    pub planks: PlankThresholds,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            pushups: RepThresholds::pushups(),
            squats: RepThresholds::squats(),
            situps: RepThresholds::situps(),
            planks: PlankThresholds::default(),
        }
    }
}

impl CounterConfig {
    /// Rep thresholds for an exercise; `None` for planks
    pub fn rep_thresholds(&self, exercise: ExerciseType) -> Option<&RepThresholds> {
        match exercise {
            ExerciseType::Pushups => Some(&self.pushups),
            ExerciseType::Squats => Some(&self.squats),
            ExerciseType::Situps => Some(&self.situps),
            ExerciseType::Planks => None,
        }
    }

    pub fn validate(&self) -> Result<(), ChallengeError> {
        for exercise in [ExerciseType::Pushups, ExerciseType::Squats] {
            if let Some(t) = self.rep_thresholds(exercise) {
                check_common(exercise, t)?;
                if t.enter_threshold >= t.complete_threshold {
                    return Err(ChallengeError::ConfigError(format!(
                        "{}: enter_threshold must be below complete_threshold",
                        exercise
                    )));
                }
            }
        }

        check_common(ExerciseType::Situps, &self.situps)?;
        if self.situps.enter_threshold <= self.situps.complete_threshold {
            return Err(ChallengeError::ConfigError(
                "situps: enter_threshold must be above complete_threshold".to_string(),
            ));
        }

        if self.planks.max_alignment_error <= 0.0 {
            return Err(ChallengeError::ConfigError(
                "planks: max_alignment_error must be positive".to_string(),
            ));
        }
        check_confidence(ExerciseType::Planks, self.planks.min_confidence)
    }
}

fn check_common(exercise: ExerciseType, t: &RepThresholds) -> Result<(), ChallengeError> {
    if t.debounce_ms <= 0 {
        return Err(ChallengeError::ConfigError(format!(
            "{}: debounce_ms must be positive",
            exercise
        )));
    }
    if t.min_valid_angle >= t.max_valid_angle {
        return Err(ChallengeError::ConfigError(format!(
            "{}: min_valid_angle must be below max_valid_angle",
            exercise
        )));
    }
    check_confidence(exercise, t.min_confidence)
}

fn check_confidence(exercise: ExerciseType, confidence: f64) -> Result<(), ChallengeError> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ChallengeError::ConfigError(format!(
            "{}: min_confidence must be within 0-1",
            exercise
        )));
    }
    Ok(())
}

fn default_min_confidence() -> f64 {
    0.7
}
