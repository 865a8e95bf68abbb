//! Polygon set value type
//!
//! A `PolygonSet` is a (possibly empty) multi-polygon in a fixed projected
//! 2D coordinate space. Rings are stored open (the closing point is
//! implicit) and the normalized form keeps exteriors counter-clockwise and
//! holes clockwise, with component polygons disjoint. The empty set is a
//! first-class value, not a missing one.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Distance below which two coordinates are considered the same point.
pub const POINT_EPSILON: f64 = 1e-6;

/// Faces with an absolute area below this are treated as degenerate.
pub const AREA_EPSILON: f64 = 1e-6;

/// A closed ring of points. The first point is not repeated at the end.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ring {
    points: Vec<Point>,
}

impl Ring {
    /// Create a ring from a point sequence.
    ///
    /// Consecutive duplicate points and a trailing copy of the first point
    /// are dropped. Rings with fewer than 3 surviving points are valid
    /// values but have zero area and no interior.
    pub fn new(points: Vec<Point>) -> Self {
        let mut cleaned: Vec<Point> = Vec::with_capacity(points.len());
        for p in points {
            if let Some(last) = cleaned.last() {
                if (p - *last).hypot() <= POINT_EPSILON {
                    continue;
                }
            }
            cleaned.push(p);
        }
        while cleaned.len() > 1 {
            let first = cleaned[0];
            let last = *cleaned.last().unwrap();
            if (last - first).hypot() <= POINT_EPSILON {
                cleaned.pop();
            } else {
                break;
            }
        }
        Self { points: cleaned }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterate over the ring's segments, including the closing segment.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Signed area by the shoelace formula. Positive for counter-clockwise
    /// rings in a y-up coordinate space.
    pub fn signed_area(&self) -> f64 {
        let mut sum = 0.0;
        for (a, b) in self.segments() {
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Return a copy oriented counter-clockwise.
    pub fn oriented_ccw(&self) -> Ring {
        let mut ring = self.clone();
        if !ring.is_ccw() {
            ring.reverse();
        }
        ring
    }

    /// Return a copy oriented clockwise.
    pub fn oriented_cw(&self) -> Ring {
        let mut ring = self.clone();
        if ring.is_ccw() {
            ring.reverse();
        }
        ring
    }

    /// Even-odd point containment test with a half-open crossing rule, so
    /// points on a shared vertex are counted consistently.
    pub fn contains(&self, p: Point) -> bool {
        let mut inside = false;
        for (a, b) in self.segments() {
            if (a.y > p.y) != (b.y > p.y) {
                let t = (p.y - a.y) / (b.y - a.y);
                let x = a.x + t * (b.x - a.x);
                if x > p.x {
                    inside = !inside;
                }
            }
        }
        inside
    }

    pub fn bounding_box(&self) -> Rect {
        let mut iter = self.points.iter();
        let first = match iter.next() {
            Some(p) => *p,
            None => return Rect::ZERO,
        };
        let mut rect = Rect::from_points(first, first);
        for p in iter {
            rect = rect.union_pt(*p);
        }
        rect
    }

    /// A point strictly interior to the ring's even-odd region.
    ///
    /// Scans a horizontal line through the widest vertical gap between
    /// vertex y-values and returns the midpoint of the widest crossing
    /// span. Returns `None` for degenerate rings.
    pub fn interior_point(&self) -> Option<Point> {
        if self.points.len() < 3 || self.area() <= AREA_EPSILON {
            return None;
        }

        let mut ys: Vec<f64> = self.points.iter().map(|p| p.y).collect();
        ys.sort_by(|a, b| a.partial_cmp(b).unwrap());
        ys.dedup_by(|a, b| (*a - *b).abs() <= POINT_EPSILON);

        // Pick the scanline between the two vertex rows with the widest gap
        // so the line stays clear of vertices.
        let mut best_gap = 0.0;
        let mut scan_y = None;
        for pair in ys.windows(2) {
            let gap = pair[1] - pair[0];
            if gap > best_gap {
                best_gap = gap;
                scan_y = Some((pair[0] + pair[1]) / 2.0);
            }
        }
        let scan_y = scan_y?;

        let mut xs: Vec<f64> = Vec::new();
        for (a, b) in self.segments() {
            if (a.y > scan_y) != (b.y > scan_y) {
                let t = (scan_y - a.y) / (b.y - a.y);
                xs.push(a.x + t * (b.x - a.x));
            }
        }
        if xs.len() < 2 {
            return None;
        }
        xs.sort_by(|a, b| a.partial_cmp(b).unwrap());

        // Crossings pair up into interior spans. Take the widest one.
        let mut best_width = 0.0;
        let mut best_mid = None;
        for pair in xs.chunks(2) {
            if pair.len() < 2 {
                break;
            }
            let width = pair[1] - pair[0];
            if width > best_width {
                best_width = width;
                best_mid = Some(Point::new((pair[0] + pair[1]) / 2.0, scan_y));
            }
        }
        best_mid
    }
}

/// A single polygon: one exterior ring and zero or more hole rings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Polygon {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }

    /// All rings, exterior first.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        std::iter::once(&self.exterior).chain(self.holes.iter())
    }

    /// Even-odd containment across all rings: inside the exterior and
    /// inside an even number of holes.
    pub fn contains(&self, p: Point) -> bool {
        let mut inside = false;
        for ring in self.rings() {
            if ring.contains(p) {
                inside = !inside;
            }
        }
        inside
    }

    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(Ring::area).sum();
        (self.exterior.area() - holes).max(0.0)
    }

    pub fn bounding_box(&self) -> Rect {
        self.exterior.bounding_box()
    }

    /// Normalize ring orientations: exterior counter-clockwise, holes
    /// clockwise.
    pub fn normalize(&mut self) {
        if !self.exterior.is_ccw() {
            self.exterior.reverse();
        }
        for hole in &mut self.holes {
            if hole.is_ccw() {
                hole.reverse();
            }
        }
    }
}

/// A multi-polygon value. The unit of all layer algebra.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PolygonSet {
    polygons: Vec<Polygon>,
}

impl PolygonSet {
    /// The empty set. A valid, distinguishable value.
    pub fn empty() -> Self {
        Self {
            polygons: Vec::new(),
        }
    }

    pub fn from_polygons(polygons: Vec<Polygon>) -> Self {
        let mut set = Self { polygons };
        for polygon in &mut set.polygons {
            polygon.normalize();
        }
        set
    }

    /// A set consisting of a single hole-free polygon.
    pub fn from_ring(ring: Ring) -> Self {
        if ring.area() <= AREA_EPSILON {
            return Self::empty();
        }
        Self::from_polygons(vec![Polygon::new(ring, Vec::new())])
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn rings(&self) -> impl Iterator<Item = &Ring> {
        self.polygons.iter().flat_map(Polygon::rings)
    }

    pub fn contains(&self, p: Point) -> bool {
        self.polygons.iter().any(|polygon| polygon.contains(p))
    }

    pub fn area(&self) -> f64 {
        self.polygons.iter().map(Polygon::area).sum()
    }

    /// The set reduced to exterior rings only, discarding all holes.
    pub fn exterior(&self) -> PolygonSet {
        PolygonSet::from_polygons(
            self.polygons
                .iter()
                .map(|polygon| Polygon::new(polygon.exterior.clone(), Vec::new()))
                .collect(),
        )
    }

    pub fn bounding_box(&self) -> Rect {
        let mut iter = self.polygons.iter();
        let first = match iter.next() {
            Some(polygon) => polygon.bounding_box(),
            None => return Rect::ZERO,
        };
        iter.fold(first, |acc, polygon| acc.union(polygon.bounding_box()))
    }

    /// Union with another set.
    pub fn union(&self, other: &PolygonSet) -> PolygonSet {
        crate::planar::union(self, other)
    }

    /// This set minus another set.
    pub fn difference(&self, other: &PolygonSet) -> PolygonSet {
        crate::planar::difference(self, other)
    }

    /// The region common to both sets.
    pub fn intersection(&self, other: &PolygonSet) -> PolygonSet {
        crate::planar::intersection(self, other)
    }
}

/// 2D cross product of two vectors.
pub(crate) fn cross(a: Vec2, b: Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Ring {
        Ring::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    #[test]
    fn test_ring_area_and_orientation() {
        let ring = square(0.0, 0.0, 10.0, 10.0);
        assert!((ring.signed_area() - 100.0).abs() < 1e-9);
        assert!(ring.is_ccw());

        let mut reversed = ring.clone();
        reversed.reverse();
        assert!((reversed.signed_area() + 100.0).abs() < 1e-9);
        assert!(!reversed.is_ccw());
    }

    #[test]
    fn test_ring_dedupes_points() {
        let ring = Ring::new(vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 5.0),
            Point::new(0.0, 0.0),
        ]);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn test_ring_contains() {
        let ring = square(0.0, 0.0, 10.0, 10.0);
        assert!(ring.contains(Point::new(5.0, 5.0)));
        assert!(!ring.contains(Point::new(15.0, 5.0)));
        assert!(!ring.contains(Point::new(-1.0, -1.0)));
    }

    #[test]
    fn test_ring_interior_point() {
        let ring = square(0.0, 0.0, 10.0, 10.0);
        let p = ring.interior_point().unwrap();
        assert!(ring.contains(p));

        let degenerate = Ring::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert!(degenerate.interior_point().is_none());
    }

    #[test]
    fn test_polygon_with_hole() {
        let polygon = Polygon::new(
            square(0.0, 0.0, 10.0, 10.0),
            vec![square(3.0, 3.0, 7.0, 7.0).oriented_cw()],
        );
        assert!(polygon.contains(Point::new(1.0, 1.0)));
        assert!(!polygon.contains(Point::new(5.0, 5.0)));
        assert!((polygon.area() - 84.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_set() {
        let set = PolygonSet::empty();
        assert!(set.is_empty());
        assert_eq!(set.area(), 0.0);
        assert!(!set.contains(Point::new(0.0, 0.0)));
    }

    #[test]
    fn test_exterior_drops_holes() {
        let set = PolygonSet::from_polygons(vec![Polygon::new(
            square(0.0, 0.0, 10.0, 10.0),
            vec![square(3.0, 3.0, 7.0, 7.0)],
        )]);
        let exterior = set.exterior();
        assert!(exterior.contains(Point::new(5.0, 5.0)));
        assert!((exterior.area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalization_orients_rings() {
        let mut exterior = square(0.0, 0.0, 10.0, 10.0);
        exterior.reverse();
        let set = PolygonSet::from_polygons(vec![Polygon::new(
            exterior,
            vec![square(2.0, 2.0, 4.0, 4.0)],
        )]);
        let polygon = &set.polygons()[0];
        assert!(polygon.exterior.is_ccw());
        assert!(!polygon.holes[0].is_ccw());
    }
}
