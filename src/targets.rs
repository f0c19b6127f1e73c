//! Daily target progression
//!
//! Every exercise gains one unit of difficulty per challenge day: one rep for
//! push-ups, squats and sit-ups, five seconds for planks.

use crate::types::{Baselines, ExerciseType};
use serde::{Deserialize, Serialize};

/// Length of the challenge in days
pub const CHALLENGE_DAYS: u32 = 75;

/// Seconds added to the plank hold per day
pub const PLANK_INCREMENT_SECONDS: u32 = 5;

/// Reps added per day for rep-counted exercises
pub const REP_INCREMENT: u32 = 1;

/// Daily increment for an exercise
pub fn increment_for(exercise: ExerciseType) -> u32 {
    match exercise {
        ExerciseType::Planks => PLANK_INCREMENT_SECONDS,
        _ => REP_INCREMENT,
    }
}

/// Target for an exercise on a given day.
///
/// Days are clamped to 1..=75 so an out-of-range day never produces a target
/// below the baseline or beyond the final day.
pub fn target_for(exercise: ExerciseType, baseline: u32, day: u32) -> u32 {
    let day = clamp_day(day);
    baseline.saturating_add((day - 1).saturating_mul(increment_for(exercise)))
}

/// Clamp a day number into the challenge range
pub fn clamp_day(day: u32) -> u32 {
    day.clamp(1, CHALLENGE_DAYS)
}

/// Targets for all four exercises on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTargets {
    pub day: u32,
    pub pushups: u32,
    pub squats: u32,
    pub situps: u32,
    pub planks: u32,
}

impl DailyTargets {
    pub fn get(&self, exercise: ExerciseType) -> u32 {
        match exercise {
            ExerciseType::Pushups => self.pushups,
            ExerciseType::Squats => self.squats,
            ExerciseType::Situps => self.situps,
            ExerciseType::Planks => self.planks,
        }
    }
}

pub fn daily_targets(baselines: &Baselines, day: u32) -> DailyTargets {
    let day = clamp_day(day);
    DailyTargets {
        day,
        pushups: target_for(ExerciseType::Pushups, baselines.pushups, day),
        squats: target_for(ExerciseType::Squats, baselines.squats, day),
        situps: target_for(ExerciseType::Situps, baselines.situps, day),
        planks: target_for(ExerciseType::Planks, baselines.planks, day),
    }
}

/// The full 75-day schedule
pub fn schedule(baselines: &Baselines) -> Vec<DailyTargets> {
    (1..=CHALLENGE_DAYS)
        .map(|day| daily_targets(baselines, day))
        .collect()
}
