//! Per-exercise measurements taken from a pose frame
//!
//! Each exercise watches a single number: the averaged elbow angle for
//! push-ups, the averaged knee angle for squats, the torso's elevation off
//! the floor for sit-ups and the body's vertical alignment error for planks.

use crate::geometry::{midpoint, try_angle, try_vertical_angle, Point};
use crate::types::{ExercisePhase, ExerciseType, PoseFrame};

/// How a rep-counted exercise moves through its phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepProfile {
    /// Phase entered when the working threshold is crossed (no rep credited)
    pub entry_phase: ExercisePhase,
    /// Phase entered when the rep completes
    pub exit_phase: ExercisePhase,
    /// True when the entry threshold is crossed from above (angle drops below it)
    pub enters_below: bool,
    pub entry_feedback: &'static str,
    pub rep_feedback: &'static str,
}

impl RepProfile {
    /// Profile for a rep-counted exercise; `None` for planks
    pub fn for_exercise(exercise: ExerciseType) -> Option<Self> {
        match exercise {
            ExerciseType::Pushups => Some(Self {
                entry_phase: ExercisePhase::Down,
                exit_phase: ExercisePhase::Up,
                enters_below: true,
                entry_feedback: "Good depth! Now push up",
                rep_feedback: "Great push-up! Keep going",
            }),
            ExerciseType::Squats => Some(Self {
                entry_phase: ExercisePhase::Down,
                exit_phase: ExercisePhase::Up,
                enters_below: true,
                entry_feedback: "Nice depth! Drive back up",
                rep_feedback: "Great squat! Keep it up",
            }),
            ExerciseType::Situps => Some(Self {
                entry_phase: ExercisePhase::Up,
                exit_phase: ExercisePhase::Down,
                enters_below: false,
                entry_feedback: "Good crunch! Lower back down",
                rep_feedback: "Great sit-up! Keep going",
            }),
            ExerciseType::Planks => None,
        }
    }

    pub fn crosses_entry(&self, value: f64, threshold: f64) -> bool {
        if self.enters_below {
            value < threshold
        } else {
            value > threshold
        }
    }

    pub fn crosses_exit(&self, value: f64, threshold: f64) -> bool {
        if self.enters_below {
            value > threshold
        } else {
            value < threshold
        }
    }
}

pub const PLANK_GOOD_FEEDBACK: &str = "Perfect plank form! Hold it steady";
pub const PLANK_ADJUST_FEEDBACK: &str = "Keep your body in a straight line";

/// Measure the exercise's tracked value, or `None` when the pose is degenerate
pub fn measure(exercise: ExerciseType, frame: &PoseFrame) -> Option<f64> {
    match exercise {
        ExerciseType::Pushups => elbow_angle(frame),
        ExerciseType::Squats => knee_angle(frame),
        ExerciseType::Situps => torso_angle(frame),
        ExerciseType::Planks => Some(alignment_error(frame)),
    }
}

/// Average of the left and right shoulder-elbow-wrist angles
pub fn elbow_angle(frame: &PoseFrame) -> Option<f64> {
    let left = try_angle(
        frame.left_shoulder.into(),
        frame.left_elbow.into(),
        frame.left_wrist.into(),
    )?;
    let right = try_angle(
        frame.right_shoulder.into(),
        frame.right_elbow.into(),
        frame.right_wrist.into(),
    )?;
    Some((left + right) / 2.0)
}

/// Average of the left and right hip-knee-ankle angles
pub fn knee_angle(frame: &PoseFrame) -> Option<f64> {
    let left = try_angle(
        frame.left_hip.into(),
        frame.left_knee.into(),
        frame.left_ankle.into(),
    )?;
    let right = try_angle(
        frame.right_hip.into(),
        frame.right_knee.into(),
        frame.right_ankle.into(),
    )?;
    Some((left + right) / 2.0)
}

/// Elevation of the hip→shoulder segment off the floor, in degrees.
///
/// This is `90 - θ` where `θ` is the torso's angle from vertical, so the
/// sit-up thresholds read as elevation: "up" means above the entry
/// threshold, and the rep is credited on the way back down. 0 is lying flat
/// and 90 is sitting upright. Shoulders below the hips give a negative value.
pub fn torso_angle(frame: &PoseFrame) -> Option<f64> {
    let (shoulders, hips, _) = body_midline(frame);
    try_vertical_angle(shoulders, hips).map(|from_vertical| 90.0 - from_vertical)
}

/// |shoulderY − hipY| + |hipY − ankleY| using left/right midpoints
pub fn alignment_error(frame: &PoseFrame) -> f64 {
    let (shoulders, hips, ankles) = body_midline(frame);
    (shoulders.y - hips.y).abs() + (hips.y - ankles.y).abs()
}

fn body_midline(frame: &PoseFrame) -> (Point, Point, Point) {
    (
        midpoint(frame.left_shoulder.into(), frame.right_shoulder.into()),
        midpoint(frame.left_hip.into(), frame.right_hip.into()),
        midpoint(frame.left_ankle.into(), frame.right_ankle.into()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Keypoint;

    fn kp(x: f64, y: f64) -> Keypoint {
        Keypoint::new(x, y, 0.9)
    }

    #[test]
    fn test_elbow_angle_averages_both_arms() {
        let frame = PoseFrame {
            // left arm straight (180°)
            left_shoulder: kp(0.0, 0.0),
            left_elbow: kp(10.0, 0.0),
            left_wrist: kp(20.0, 0.0),
            // right arm bent (90°)
            right_shoulder: kp(0.0, 0.0),
            right_elbow: kp(10.0, 0.0),
            right_wrist: kp(10.0, 10.0),
            confidence: 0.9,
            ..Default::default()
        };
        assert!((elbow_angle(&frame).unwrap() - 135.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_arm_is_none() {
        let frame = PoseFrame::default();
        assert_eq!(elbow_angle(&frame), None);
        assert_eq!(knee_angle(&frame), None);
        assert_eq!(torso_angle(&frame), None);
    }

    #[test]
    fn test_torso_angle_lying_and_sitting() {
        let lying = PoseFrame {
            left_shoulder: kp(0.0, 100.0),
            right_shoulder: kp(0.0, 100.0),
            left_hip: kp(100.0, 100.0),
            right_hip: kp(100.0, 100.0),
            ..Default::default()
        };
        assert!(torso_angle(&lying).unwrap().abs() < 1e-9);

        let upright = PoseFrame {
            left_shoulder: kp(100.0, 0.0),
            right_shoulder: kp(100.0, 0.0),
            left_hip: kp(100.0, 100.0),
            right_hip: kp(100.0, 100.0),
            ..Default::default()
        };
        assert!((torso_angle(&upright).unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_torso_angle_is_complement_of_vertical() {
        // torso leaning 30° off vertical
        let rad = 30f64.to_radians();
        let shoulder = kp(100.0 - 100.0 * rad.sin(), 100.0 - 100.0 * rad.cos());
        let frame = PoseFrame {
            left_shoulder: shoulder,
            right_shoulder: shoulder,
            left_hip: kp(100.0, 100.0),
            right_hip: kp(100.0, 100.0),
            ..Default::default()
        };
        assert!((torso_angle(&frame).unwrap() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_alignment_error() {
        let frame = PoseFrame {
            left_shoulder: kp(0.0, 200.0),
            right_shoulder: kp(0.0, 210.0),
            left_hip: kp(100.0, 220.0),
            right_hip: kp(100.0, 220.0),
            left_ankle: kp(200.0, 230.0),
            right_ankle: kp(200.0, 240.0),
            ..Default::default()
        };
        // shoulders 205, hips 220, ankles 235
        assert!((alignment_error(&frame) - 30.0).abs() < 1e-9);
        assert_eq!(measure(ExerciseType::Planks, &frame), Some(alignment_error(&frame)));
    }

    #[test]
    fn test_profiles() {
        let situps = RepProfile::for_exercise(ExerciseType::Situps).unwrap();
        assert!(situps.crosses_entry(45.0, 40.0));
        assert!(situps.crosses_exit(10.0, 20.0));

        let pushups = RepProfile::for_exercise(ExerciseType::Pushups).unwrap();
        assert!(pushups.crosses_entry(100.0, 110.0));
        assert!(pushups.crosses_exit(155.0, 150.0));

        assert!(RepProfile::for_exercise(ExerciseType::Planks).is_none());
    }
}
