//! Core types for the challenge engine
//!
//! This module defines the data structures shared by the rep counter and the
//! daily challenge engine: pose frames, exercise identifiers, baselines and
//! per-day progress records.

use crate::error::ChallengeError;
use crate::targets;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The four exercises of the challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseType {
    Pushups,
    Squats,
    Situps,
    Planks,
}

impl ExerciseType {
    /// All exercises in the order they are presented for a day
    pub const ALL: [ExerciseType; 4] = [
        ExerciseType::Pushups,
        ExerciseType::Squats,
        ExerciseType::Situps,
        ExerciseType::Planks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseType::Pushups => "pushups",
            ExerciseType::Squats => "squats",
            ExerciseType::Situps => "situps",
            ExerciseType::Planks => "planks",
        }
    }

    /// Human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            ExerciseType::Pushups => "Push-ups",
            ExerciseType::Squats => "Squats",
            ExerciseType::Situps => "Sit-ups",
            ExerciseType::Planks => "Plank",
        }
    }

    /// Unit the exercise's target and actual count are measured in
    pub fn unit(&self) -> MeasureUnit {
        match self {
            ExerciseType::Planks => MeasureUnit::Seconds,
            _ => MeasureUnit::Reps,
        }
    }

    /// Whether the exercise is counted in repetitions (planks are held)
    pub fn is_rep_counted(&self) -> bool {
        self.unit() == MeasureUnit::Reps
    }
}

impl fmt::Display for ExerciseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseType {
    type Err = ChallengeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "pushups" | "pushup" => Ok(ExerciseType::Pushups),
            "squats" | "squat" => Ok(ExerciseType::Squats),
            "situps" | "situp" => Ok(ExerciseType::Situps),
            "planks" | "plank" => Ok(ExerciseType::Planks),
            _ => Err(ChallengeError::UnknownExercise(s.to_string())),
        }
    }
}

/// Unit of an exercise target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureUnit {
    Reps,
    Seconds,
}

impl MeasureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureUnit::Reps => "reps",
            MeasureUnit::Seconds => "seconds",
        }
    }
}

/// One anatomical landmark in a 2-D image frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    /// Detection confidence (0-1)
    pub confidence: f64,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, confidence: f64) -> Self {
        Self { x, y, confidence }
    }
}

/// A single detection tick: 13 named keypoints plus an overall confidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    pub nose: Keypoint,
    pub left_shoulder: Keypoint,
    pub right_shoulder: Keypoint,
    pub left_elbow: Keypoint,
    pub right_elbow: Keypoint,
    pub left_wrist: Keypoint,
    pub right_wrist: Keypoint,
    pub left_hip: Keypoint,
    pub right_hip: Keypoint,
    pub left_knee: Keypoint,
    pub right_knee: Keypoint,
    pub left_ankle: Keypoint,
    pub right_ankle: Keypoint,
    /// Overall pose confidence (0-1)
    pub confidence: f64,
}

/// Half-cycle of a repetition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExercisePhase {
    #[default]
    Neutral,
    Up,
    Down,
}

/// Day-1 targets chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baselines {
    pub pushups: u32,
    pub squats: u32,
    pub situps: u32,
    /// Plank hold in seconds
    pub planks: u32,
}

impl Default for Baselines {
    fn default() -> Self {
        Self {
            pushups: 10,
            squats: 15,
            situps: 10,
            planks: 30,
        }
    }
}

impl Baselines {
    pub fn get(&self, exercise: ExerciseType) -> u32 {
        match exercise {
            ExerciseType::Pushups => self.pushups,
            ExerciseType::Squats => self.squats,
            ExerciseType::Situps => self.situps,
            ExerciseType::Planks => self.planks,
        }
    }

    /// Every baseline must be at least one rep (or one second)
    pub fn validate(&self) -> Result<(), ChallengeError> {
        for exercise in ExerciseType::ALL {
            if self.get(exercise) == 0 {
                return Err(ChallengeError::InvalidBaseline(format!(
                    "{} baseline must be greater than zero",
                    exercise
                )));
            }
        }
        Ok(())
    }
}

/// Target and completion for one exercise on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseProgress {
    /// Required reps, or seconds for planks
    pub target: u32,
    pub completed: bool,
    /// Recorded count, in the exercise's unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<u32>,
}

/// Targets and completion status for all exercises on one calendar date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProgress {
    pub date: NaiveDate,
    /// Challenge day (1-75)
    pub day: u32,
    pub exercises: BTreeMap<ExerciseType, ExerciseProgress>,
    pub all_completed: bool,
}

impl DailyProgress {
    /// Build a fresh record with targets fixed from the baselines and day
    pub fn new(date: NaiveDate, day: u32, baselines: &Baselines) -> Self {
        let exercises = ExerciseType::ALL
            .iter()
            .map(|&exercise| {
                (
                    exercise,
                    ExerciseProgress {
                        target: targets::target_for(exercise, baselines.get(exercise), day),
                        completed: false,
                        actual: None,
                    },
                )
            })
            .collect();

        Self {
            date,
            day,
            exercises,
            all_completed: false,
        }
    }

    pub fn exercise(&self, exercise: ExerciseType) -> Option<&ExerciseProgress> {
        self.exercises.get(&exercise)
    }

    /// Mark one exercise completed and recompute `all_completed`
    pub fn mark_completed(&mut self, exercise: ExerciseType, actual: u32) {
        let entry = self.exercises.entry(exercise).or_insert(ExerciseProgress {
            target: 0,
            completed: false,
            actual: None,
        });
        entry.completed = true;
        entry.actual = Some(actual);
        self.refresh_all_completed();
    }

    /// Recompute `all_completed` from the per-exercise flags
    pub fn refresh_all_completed(&mut self) -> bool {
        self.all_completed = ExerciseType::ALL
            .iter()
            .all(|e| self.exercises.get(e).is_some_and(|p| p.completed));
        self.all_completed
    }

    /// Number of exercises completed so far
    pub fn completed_count(&self) -> usize {
        self.exercises.values().filter(|p| p.completed).count()
    }
}
