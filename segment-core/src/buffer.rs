//! Stroke buffering
//!
//! Converts a drawn stroke (ordered coordinate sequence) into a polygon by
//! buffering it with a radius: every segment becomes a capsule (a
//! rectangle with semicircular caps) and the capsules are unioned under
//! the non-zero rule.

use crate::planar;
use crate::polygon::{PolygonSet, Ring, POINT_EPSILON};
use kurbo::{Point, Vec2};
use std::f64::consts::PI;

/// Number of segments used to approximate each semicircular cap.
const CAP_SEGMENTS: usize = 12;

/// Counter-clockwise capsule ring around the segment from `a` to `b`.
fn capsule(a: Point, b: Point, radius: f64) -> Ring {
    let dir = (b - a).normalize();
    let angle = dir.atan2();
    let mut points = Vec::with_capacity(2 * CAP_SEGMENTS + 2);

    // Cap around `a`, sweeping through the direction opposite the stroke,
    // then cap around `b`, sweeping through the stroke direction.
    for i in 0..=CAP_SEGMENTS {
        let theta = angle + PI / 2.0 + PI * (i as f64) / (CAP_SEGMENTS as f64);
        points.push(a + Vec2::from_angle(theta) * radius);
    }
    for i in 0..=CAP_SEGMENTS {
        let theta = angle - PI / 2.0 + PI * (i as f64) / (CAP_SEGMENTS as f64);
        points.push(b + Vec2::from_angle(theta) * radius);
    }

    Ring::new(points)
}

/// Buffer a stroke by `radius`.
///
/// Returns the empty set for degenerate strokes (fewer than two distinct
/// points, or a non-positive radius); callers treat that as "discard".
pub fn buffer_stroke(points: &[Point], radius: f64) -> PolygonSet {
    if radius <= 0.0 {
        return PolygonSet::empty();
    }

    let mut rings = Vec::new();
    let mut prev: Option<Point> = None;
    for &p in points {
        if let Some(a) = prev {
            if (p - a).hypot() > POINT_EPSILON {
                rings.push(capsule(a, p, radius));
                prev = Some(p);
            }
        } else {
            prev = Some(p);
        }
    }

    if rings.is_empty() {
        return PolygonSet::empty();
    }

    planar::union_rings(&rings)
}
