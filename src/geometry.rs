//! Joint angle geometry
//!
//! Angles are computed from three points using the dot product of the two
//! vectors meeting at the middle point: cos(θ) = (v1 · v2) / (|v1| × |v2|).

use crate::types::Keypoint;
use serde::{Deserialize, Serialize};

/// Vectors shorter than this are treated as zero-length
const MIN_VECTOR_LENGTH: f64 = 1e-9;

/// A 2-D point in image coordinates (y grows downwards)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<Keypoint> for Point {
    fn from(kp: Keypoint) -> Self {
        Self { x: kp.x, y: kp.y }
    }
}

impl From<&Keypoint> for Point {
    fn from(kp: &Keypoint) -> Self {
        Self { x: kp.x, y: kp.y }
    }
}

/// Midpoint of two points
pub fn midpoint(a: Point, b: Point) -> Point {
    Point {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

/// Angle at `b` formed by `b→a` and `b→c`, in degrees (0-180).
///
/// Returns `None` when either vector has zero length or an input is not finite.
pub fn try_angle(a: Point, b: Point, c: Point) -> Option<f64> {
    let v1 = (a.x - b.x, a.y - b.y);
    let v2 = (c.x - b.x, c.y - b.y);

    let dot = v1.0 * v2.0 + v1.1 * v2.1;
    let mag1 = (v1.0 * v1.0 + v1.1 * v1.1).sqrt();
    let mag2 = (v2.0 * v2.0 + v2.1 * v2.1).sqrt();

    if mag1.is_nan() || mag2.is_nan() || mag1 < MIN_VECTOR_LENGTH || mag2 < MIN_VECTOR_LENGTH {
        return None;
    }

    let cos_angle = dot / (mag1 * mag2);
    if !cos_angle.is_finite() {
        return None;
    }

    Some(cos_angle.clamp(-1.0, 1.0).acos().to_degrees())
}

/// Angle at `b` in degrees, or 0 for a degenerate pose
pub fn angle(a: Point, b: Point, c: Point) -> f64 {
    try_angle(a, b, c).unwrap_or(0.0)
}

/// Angle between the `bottom→top` segment and straight up, in degrees.
///
/// 0 means the segment is vertical; 90 means it is horizontal.
pub fn try_vertical_angle(top: Point, bottom: Point) -> Option<f64> {
    let above = Point::new(bottom.x, bottom.y - 1.0);
    try_angle(top, bottom, above)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_straight_line() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.5, 0.0);
        let c = Point::new(1.0, 0.0);
        assert!((angle(a, b, c) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_right_angle() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(0.5, 0.0);
        let c = Point::new(0.5, 0.5);
        assert!((angle(a, b, c) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_returns_zero() {
        let p = Point::new(3.0, 4.0);
        let q = Point::new(7.0, 1.0);
        assert_eq!(angle(p, p, q), 0.0);
        assert_eq!(angle(q, p, p), 0.0);
        assert_eq!(try_angle(p, p, q), None);
    }

    #[test]
    fn test_non_finite_input_is_degenerate() {
        let b = Point::new(0.0, 0.0);
        assert_eq!(angle(Point::new(f64::NAN, 1.0), b, Point::new(1.0, 0.0)), 0.0);
    }

    #[test]
    fn test_vertical_angle() {
        let hip = Point::new(100.0, 200.0);
        assert!((try_vertical_angle(Point::new(100.0, 100.0), hip).unwrap()).abs() < 1e-9);
        assert!((try_vertical_angle(Point::new(200.0, 200.0), hip).unwrap() - 90.0).abs() < 1e-9);
        assert_eq!(try_vertical_angle(hip, hip), None);
    }

    #[test]
    fn test_midpoint() {
        assert_eq!(
            midpoint(Point::new(0.0, 10.0), Point::new(4.0, 20.0)),
            Point::new(2.0, 15.0)
        );
    }

    fn coord() -> impl Strategy<Value = f64> {
        -1000.0f64..1000.0
    }

    fn point() -> impl Strategy<Value = Point> {
        (coord(), coord()).prop_map(|(x, y)| Point::new(x, y))
    }

    proptest! {
        #[test]
        fn prop_angle_is_symmetric(a in point(), b in point(), c in point()) {
            prop_assert_eq!(angle(a, b, c), angle(c, b, a));
        }

        #[test]
        fn prop_angle_in_range(a in point(), b in point(), c in point()) {
            let deg = angle(a, b, c);
            prop_assert!((0.0..=180.0).contains(&deg));
        }

        #[test]
        fn prop_coincident_points_yield_zero(a in point(), b in point()) {
            prop_assert_eq!(angle(b, b, a), 0.0);
            prop_assert_eq!(angle(a, b, b), 0.0);
        }
    }
}
