//! Pose frame sources
//!
//! The rep counter never knows where frames come from. A camera-driven pose
//! model, a recorded session or a synthetic generator all implement
//! [`PoseFrameSource`].

use crate::geometry::Point;
use crate::types::{ExerciseType, Keypoint, PoseFrame};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f64::consts::PI;

/// Default pose confidence of synthesized frames
pub const DEFAULT_SYNTHETIC_CONFIDENCE: f64 = 0.9;

/// Upper bound on frames a synthetic source emits unless overridden
pub const DEFAULT_MAX_SYNTHETIC_FRAMES: usize = 100_000;

/// A pose frame stamped with its detection time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedFrame {
    pub at: DateTime<Utc>,
    pub frame: PoseFrame,
}

/// Supplies pose frames on each detection tick
pub trait PoseFrameSource {
    /// Next frame, or `None` once the source is exhausted
    fn next_frame(&mut self) -> Option<TimedFrame>;
}

/// Replays a fixed list of frames
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    frames: VecDeque<TimedFrame>,
}

impl ScriptedSource {
    pub fn new(frames: Vec<TimedFrame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    /// One synthesized frame per value, `interval_ms` apart starting at `start`
    pub fn from_values(
        exercise: ExerciseType,
        start: DateTime<Utc>,
        interval_ms: i64,
        values: &[f64],
    ) -> Self {
        let synthesizer = PoseSynthesizer::default();
        let frames = values
            .iter()
            .enumerate()
            .map(|(i, &value)| TimedFrame {
                at: start + Duration::milliseconds(interval_ms * i as i64),
                frame: synthesizer.frame_for(exercise, value),
            })
            .collect();
        Self::new(frames)
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl PoseFrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Option<TimedFrame> {
        self.frames.pop_front()
    }
}

/// Timing of the synthetic movement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Interval between detection ticks
    #[serde(default = "default_tick_ms")]
    pub tick_ms: i64,
    /// Duration of one full rep cycle (rest → peak → rest)
    #[serde(default = "default_cycle_ms")]
    pub cycle_ms: i64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            cycle_ms: default_cycle_ms(),
        }
    }
}

fn default_tick_ms() -> i64 {
    100
}

fn default_cycle_ms() -> i64 {
    2000
}

/// Deterministic generator sweeping an exercise between its rest and peak pose
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    exercise: ExerciseType,
    start: DateTime<Utc>,
    config: SimulationConfig,
    synthesizer: PoseSynthesizer,
    tick: usize,
    max_frames: usize,
}

impl SyntheticSource {
    pub fn new(exercise: ExerciseType, start: DateTime<Utc>, config: SimulationConfig) -> Self {
        Self {
            exercise,
            start,
            config,
            synthesizer: PoseSynthesizer::default(),
            tick: 0,
            max_frames: DEFAULT_MAX_SYNTHETIC_FRAMES,
        }
    }

    pub fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.synthesizer.confidence = confidence;
        self
    }

    /// (rest, peak) values of the measured quantity for an exercise
    pub fn sweep_range(exercise: ExerciseType) -> (f64, f64) {
        match exercise {
            ExerciseType::Pushups => (170.0, 90.0),
            ExerciseType::Squats => (170.0, 90.0),
            ExerciseType::Situps => (5.0, 60.0),
            ExerciseType::Planks => (10.0, 25.0),
        }
    }

    fn value_at(&self, elapsed_ms: i64) -> f64 {
        let (rest, peak) = Self::sweep_range(self.exercise);
        let cycle = self.config.cycle_ms.max(1);
        let position = (elapsed_ms % cycle) as f64 / cycle as f64;
        // 0 at rest, 1 at mid-cycle
        let depth = (1.0 - (2.0 * PI * position).cos()) / 2.0;
        rest + (peak - rest) * depth
    }
}

impl PoseFrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Option<TimedFrame> {
        if self.tick >= self.max_frames {
            return None;
        }
        let elapsed_ms = self.config.tick_ms * self.tick as i64;
        self.tick += 1;

        Some(TimedFrame {
            at: self.start + Duration::milliseconds(elapsed_ms),
            frame: self
                .synthesizer
                .frame_for(self.exercise, self.value_at(elapsed_ms)),
        })
    }
}

/// Builds keypoint geometry that measures to a requested value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSynthesizer {
    /// Image position the body is laid out around
    pub origin: Point,
    /// Length of each limb segment, in pixels
    pub segment: f64,
    pub confidence: f64,
}

impl Default for PoseSynthesizer {
    fn default() -> Self {
        Self {
            origin: Point::new(320.0, 240.0),
            segment: 80.0,
            confidence: DEFAULT_SYNTHETIC_CONFIDENCE,
        }
    }
}

impl PoseSynthesizer {
    /// Frame whose measured value for `exercise` equals `value`.
    ///
    /// Push-ups and squats take the joint angle, sit-ups the torso elevation
    /// and planks the alignment error in pixels.
    pub fn frame_for(&self, exercise: ExerciseType, value: f64) -> PoseFrame {
        match exercise {
            ExerciseType::Pushups => self.pushup_frame(value),
            ExerciseType::Squats => self.squat_frame(value),
            ExerciseType::Situps => self.situp_frame(value),
            ExerciseType::Planks => self.plank_frame(value),
        }
    }

    fn kp(&self, p: Point) -> Keypoint {
        Keypoint::new(p.x, p.y, self.confidence)
    }

    /// Returns (outer, inner) endpoints around `joint` enclosing `angle` degrees
    fn hinge(&self, joint: Point, angle: f64) -> (Point, Point) {
        let rad = angle.to_radians();
        let outer = Point::new(joint.x - self.segment, joint.y);
        let inner = Point::new(
            joint.x - self.segment * rad.cos(),
            joint.y + self.segment * rad.sin(),
        );
        (outer, inner)
    }

    fn pushup_frame(&self, elbow_angle: f64) -> PoseFrame {
        let o = self.origin;
        let s = self.segment;
        let left_elbow = Point::new(o.x, o.y);
        let right_elbow = Point::new(o.x, o.y + 10.0);
        let (left_shoulder, left_wrist) = self.hinge(left_elbow, elbow_angle);
        let (right_shoulder, right_wrist) = self.hinge(right_elbow, elbow_angle);

        PoseFrame {
            nose: self.kp(Point::new(left_shoulder.x - s * 0.5, left_shoulder.y)),
            left_shoulder: self.kp(left_shoulder),
            right_shoulder: self.kp(right_shoulder),
            left_elbow: self.kp(left_elbow),
            right_elbow: self.kp(right_elbow),
            left_wrist: self.kp(left_wrist),
            right_wrist: self.kp(right_wrist),
            left_hip: self.kp(Point::new(left_shoulder.x + 2.0 * s, left_shoulder.y)),
            right_hip: self.kp(Point::new(right_shoulder.x + 2.0 * s, right_shoulder.y)),
            left_knee: self.kp(Point::new(left_shoulder.x + 3.0 * s, left_shoulder.y)),
            right_knee: self.kp(Point::new(right_shoulder.x + 3.0 * s, right_shoulder.y)),
            left_ankle: self.kp(Point::new(left_shoulder.x + 4.0 * s, left_shoulder.y)),
            right_ankle: self.kp(Point::new(right_shoulder.x + 4.0 * s, right_shoulder.y)),
            confidence: self.confidence,
        }
    }

    fn squat_frame(&self, knee_angle: f64) -> PoseFrame {
        let o = self.origin;
        let s = self.segment;
        let left_knee = Point::new(o.x, o.y);
        let right_knee = Point::new(o.x + 10.0, o.y);
        let (left_hip, left_ankle) = self.hinge(left_knee, knee_angle);
        let (right_hip, right_ankle) = self.hinge(right_knee, knee_angle);

        PoseFrame {
            nose: self.kp(Point::new(left_hip.x, left_hip.y - 2.2 * s)),
            left_shoulder: self.kp(Point::new(left_hip.x, left_hip.y - 2.0 * s)),
            right_shoulder: self.kp(Point::new(right_hip.x, right_hip.y - 2.0 * s)),
            left_elbow: self.kp(Point::new(left_hip.x + 0.5 * s, left_hip.y - 1.5 * s)),
            right_elbow: self.kp(Point::new(right_hip.x + 0.5 * s, right_hip.y - 1.5 * s)),
            left_wrist: self.kp(Point::new(left_hip.x + s, left_hip.y - 1.5 * s)),
            right_wrist: self.kp(Point::new(right_hip.x + s, right_hip.y - 1.5 * s)),
            left_hip: self.kp(left_hip),
            right_hip: self.kp(right_hip),
            left_knee: self.kp(left_knee),
            right_knee: self.kp(right_knee),
            left_ankle: self.kp(left_ankle),
            right_ankle: self.kp(right_ankle),
            confidence: self.confidence,
        }
    }

    fn situp_frame(&self, elevation: f64) -> PoseFrame {
        let o = self.origin;
        let s = self.segment;
        let rad = elevation.to_radians();
        let hip = Point::new(o.x, o.y);
        // Torso extends to the left of the hips, legs to the right
        let shoulder = Point::new(hip.x - 2.0 * s * rad.cos(), hip.y - 2.0 * s * rad.sin());
        let knee = Point::new(hip.x + s, hip.y - 0.5 * s);
        let ankle = Point::new(hip.x + 2.0 * s, hip.y);

        PoseFrame {
            nose: self.kp(Point::new(
                shoulder.x - 0.3 * s * rad.cos(),
                shoulder.y - 0.3 * s * rad.sin(),
            )),
            left_shoulder: self.kp(shoulder),
            right_shoulder: self.kp(shoulder),
            left_elbow: self.kp(Point::new(shoulder.x + 0.3 * s, shoulder.y)),
            right_elbow: self.kp(Point::new(shoulder.x + 0.3 * s, shoulder.y)),
            left_wrist: self.kp(Point::new(shoulder.x + 0.6 * s, shoulder.y)),
            right_wrist: self.kp(Point::new(shoulder.x + 0.6 * s, shoulder.y)),
            left_hip: self.kp(hip),
            right_hip: self.kp(hip),
            left_knee: self.kp(knee),
            right_knee: self.kp(knee),
            left_ankle: self.kp(ankle),
            right_ankle: self.kp(ankle),
            confidence: self.confidence,
        }
    }

    fn plank_frame(&self, alignment_error: f64) -> PoseFrame {
        let o = self.origin;
        let s = self.segment;
        // Hips sag by half the error; shoulders and ankles stay level
        let sag = alignment_error / 2.0;
        let shoulder = Point::new(o.x - 2.0 * s, o.y);
        let hip = Point::new(o.x, o.y + sag);
        let knee = Point::new(o.x + s, o.y + sag / 2.0);
        let ankle = Point::new(o.x + 2.0 * s, o.y);

        PoseFrame {
            nose: self.kp(Point::new(shoulder.x - 0.5 * s, shoulder.y)),
            left_shoulder: self.kp(shoulder),
            right_shoulder: self.kp(shoulder),
            left_elbow: self.kp(Point::new(shoulder.x, shoulder.y + s)),
            right_elbow: self.kp(Point::new(shoulder.x, shoulder.y + s)),
            left_wrist: self.kp(Point::new(shoulder.x + 0.5 * s, shoulder.y + s)),
            right_wrist: self.kp(Point::new(shoulder.x + 0.5 * s, shoulder.y + s)),
            left_hip: self.kp(hip),
            right_hip: self.kp(hip),
            left_knee: self.kp(knee),
            right_knee: self.kp(knee),
            left_ankle: self.kp(ankle),
            right_ankle: self.kp(ankle),
            confidence: self.confidence,
        }
    }
}
