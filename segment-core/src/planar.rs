//! Planar overlay engine
//!
//! All polygon algebra goes through one pipeline: collect the operands'
//! ring segments, split them at every pairwise intersection, snap the
//! resulting endpoints into a planar graph, classify both sides of every
//! graph edge against the operands, and stitch the edges whose sides
//! disagree back into result rings. Union, difference, intersection and
//! lasso polygonization are the same machinery with different keep
//! predicates.
//!
//! Classification casts a ray from each edge midpoint along the edge
//! normal and counts operand boundary crossings, so no face bookkeeping is
//! needed and nested disconnected components fall out naturally.

use crate::polygon::{cross, Polygon, PolygonSet, Ring, AREA_EPSILON, POINT_EPSILON};
use kurbo::{Point, Vec2};
use std::collections::HashMap;
use std::f64::consts::TAU;

/// Crossings closer to the ray origin than this are ignored. Keeps
/// segments coincident with the edge under test (which sit at parameter
/// zero up to snapping noise) out of the count.
const RAY_MIN_T: f64 = POINT_EPSILON * 10.0;

/// Containment rule for an operand's raw segment soup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillRule {
    /// Parity of boundary crossings. Used for normalized polygon sets.
    EvenOdd,
    /// Signed winding number. Used for raw ring collections where
    /// overlapping same-orientation rings must accumulate, not cancel.
    NonZero,
}

/// One input to an overlay: a segment soup plus the rule that defines its
/// interior.
pub struct Operand {
    segments: Vec<(Point, Point)>,
    rule: FillRule,
}

impl Operand {
    /// Operand from a normalized polygon set.
    pub fn from_set(set: &PolygonSet) -> Self {
        let mut segments = Vec::new();
        for ring in set.rings() {
            push_ring_segments(&mut segments, ring.points());
        }
        Self {
            segments,
            rule: FillRule::EvenOdd,
        }
    }

    /// Operand from raw rings, e.g. a pile of overlapping buffer capsules.
    pub fn from_rings(rings: &[Ring]) -> Self {
        let mut segments = Vec::new();
        for ring in rings {
            push_ring_segments(&mut segments, ring.points());
        }
        Self {
            segments,
            rule: FillRule::NonZero,
        }
    }

    /// Operand from an open coordinate chain, closed back to its first
    /// point. This is the lasso closure input.
    pub fn from_chain(points: &[Point]) -> Self {
        let mut segments = Vec::new();
        push_ring_segments(&mut segments, points);
        Self {
            segments,
            rule: FillRule::NonZero,
        }
    }

    /// Whether the open region just off `origin` in direction `dir` is
    /// inside this operand, by ray crossing count.
    fn inside(&self, origin: Point, dir: Vec2) -> bool {
        let mut parity = false;
        let mut winding = 0i32;

        for &(p, q) in &self.segments {
            let side_p = cross(dir, p - origin);
            let side_q = cross(dir, q - origin);
            // Half-open rule: zero sides group with the positive side so a
            // vertex shared by two segments is counted exactly once.
            if (side_p < 0.0) == (side_q < 0.0) {
                continue;
            }
            let den = cross(dir, q - p);
            if den.abs() < f64::EPSILON {
                continue;
            }
            let t = cross(p - origin, q - p) / den;
            if t <= RAY_MIN_T {
                continue;
            }
            parity = !parity;
            winding += if den > 0.0 { 1 } else { -1 };
        }

        match self.rule {
            FillRule::EvenOdd => parity,
            FillRule::NonZero => winding != 0,
        }
    }
}

fn push_ring_segments(segments: &mut Vec<(Point, Point)>, points: &[Point]) {
    let n = points.len();
    if n < 2 {
        return;
    }
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        if (b - a).hypot() > POINT_EPSILON {
            segments.push((a, b));
        }
    }
}

/// Spatial index that snaps nearby positions onto a single graph node.
struct NodeIndex {
    positions: Vec<Point>,
    grid: HashMap<(i64, i64), Vec<usize>>,
    cell: f64,
}

impl NodeIndex {
    fn new() -> Self {
        Self {
            positions: Vec::new(),
            grid: HashMap::new(),
            cell: POINT_EPSILON * 4.0,
        }
    }

    fn key(&self, p: Point) -> (i64, i64) {
        ((p.x / self.cell).floor() as i64, (p.y / self.cell).floor() as i64)
    }

    fn get_or_insert(&mut self, p: Point) -> usize {
        let (kx, ky) = self.key(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.grid.get(&(kx + dx, ky + dy)) {
                    for &idx in bucket {
                        if (self.positions[idx] - p).hypot() <= POINT_EPSILON {
                            return idx;
                        }
                    }
                }
            }
        }
        let idx = self.positions.len();
        self.positions.push(p);
        self.grid.entry((kx, ky)).or_default().push(idx);
        idx
    }
}

/// The planar graph: snapped nodes and non-crossing edges between them.
struct PlanarGraph {
    nodes: Vec<Point>,
    edges: Vec<(usize, usize)>,
}

impl PlanarGraph {
    /// Build the graph from every operand's segments, splitting each
    /// segment at its intersections with all others.
    fn build(operands: &[Operand]) -> Self {
        let all: Vec<(Point, Point)> = operands
            .iter()
            .flat_map(|op| op.segments.iter().copied())
            .collect();

        // Split parameters per segment, always including both endpoints.
        let mut params: Vec<Vec<f64>> = all.iter().map(|_| vec![0.0, 1.0]).collect();

        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                let (ti, tj) = segment_intersections(all[i], all[j]);
                params[i].extend(ti);
                params[j].extend(tj);
            }
        }

        let mut index = NodeIndex::new();
        let mut edges = Vec::new();
        let mut seen = HashMap::new();

        for (seg, ts) in all.iter().zip(params.iter_mut()) {
            ts.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let length = (seg.1 - seg.0).hypot();
            if length <= POINT_EPSILON {
                continue;
            }
            // Drop parameters whose points coincide after snapping.
            ts.dedup_by(|a, b| (*a - *b).abs() * length <= POINT_EPSILON);

            for pair in ts.windows(2) {
                let p0 = seg.0.lerp(seg.1, pair[0]);
                let p1 = seg.0.lerp(seg.1, pair[1]);
                let n0 = index.get_or_insert(p0);
                let n1 = index.get_or_insert(p1);
                if n0 == n1 {
                    continue;
                }
                let key = (n0.min(n1), n0.max(n1));
                if seen.insert(key, ()).is_none() {
                    edges.push((n0, n1));
                }
            }
        }

        log::debug!(
            "planar graph: {} input segments, {} nodes, {} edges",
            all.len(),
            index.positions.len(),
            edges.len()
        );

        Self {
            nodes: index.positions,
            edges,
        }
    }
}

/// Intersection parameters of two segments, excluding shared endpoints.
/// Returns split parameters for the first and second segment.
fn segment_intersections(s1: (Point, Point), s2: (Point, Point)) -> (Vec<f64>, Vec<f64>) {
    let r = s1.1 - s1.0;
    let s = s2.1 - s2.0;
    let len_r = r.hypot();
    let len_s = s.hypot();
    if len_r <= POINT_EPSILON || len_s <= POINT_EPSILON {
        return (Vec::new(), Vec::new());
    }

    let denom = cross(r, s);
    if denom.abs() <= 1e-12 * len_r * len_s {
        // Parallel. Only collinear overlap produces split points.
        let offset = cross(r, s2.0 - s1.0).abs() / len_r;
        if offset > POINT_EPSILON {
            return (Vec::new(), Vec::new());
        }
        let project = |seg: (Point, Point), p: Point| {
            let d = seg.1 - seg.0;
            (p - seg.0).dot(d) / d.hypot2()
        };
        let mut t1 = Vec::new();
        let mut t2 = Vec::new();
        for t in [project(s1, s2.0), project(s1, s2.1)] {
            if t > 0.0 && t < 1.0 {
                t1.push(t);
            }
        }
        for t in [project(s2, s1.0), project(s2, s1.1)] {
            if t > 0.0 && t < 1.0 {
                t2.push(t);
            }
        }
        return (t1, t2);
    }

    let qp = s2.0 - s1.0;
    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;
    let tol_t = POINT_EPSILON / len_r;
    let tol_u = POINT_EPSILON / len_s;
    if t < -tol_t || t > 1.0 + tol_t || u < -tol_u || u > 1.0 + tol_u {
        return (Vec::new(), Vec::new());
    }
    (vec![t.clamp(0.0, 1.0)], vec![u.clamp(0.0, 1.0)])
}

/// Run an overlay. `keep` receives one inside/outside flag per operand and
/// decides whether that region belongs to the result.
pub fn overlay<F>(operands: &[Operand], keep: F) -> PolygonSet
where
    F: Fn(&[bool]) -> bool,
{
    let graph = PlanarGraph::build(operands);
    if graph.edges.is_empty() {
        return PolygonSet::empty();
    }

    // Classify both sides of every edge. Edges whose sides disagree form
    // the result boundary, oriented with the kept region on the left.
    let mut boundary: Vec<(usize, usize)> = Vec::new();
    let mut status = vec![false; operands.len()];

    for &(a, b) in &graph.edges {
        let pa = graph.nodes[a];
        let pb = graph.nodes[b];
        let dir = (pb - pa).normalize();
        let normal = Vec2::new(-dir.y, dir.x);
        let mid = pa.midpoint(pb);

        for (flag, op) in status.iter_mut().zip(operands.iter()) {
            *flag = op.inside(mid, normal);
        }
        let left_in = keep(&status);

        for (flag, op) in status.iter_mut().zip(operands.iter()) {
            *flag = op.inside(mid, -normal);
        }
        let right_in = keep(&status);

        if left_in == right_in {
            continue;
        }
        if left_in {
            boundary.push((a, b));
        } else {
            boundary.push((b, a));
        }
    }

    stitch_rings(&graph, boundary)
}

/// Walk the boundary half-edges into closed rings and assemble polygons,
/// assigning clockwise rings as holes of their smallest containing shell.
fn stitch_rings(graph: &PlanarGraph, boundary: Vec<(usize, usize)>) -> PolygonSet {
    let mut outgoing: HashMap<usize, Vec<usize>> = HashMap::new();
    for (idx, &(from, _)) in boundary.iter().enumerate() {
        outgoing.entry(from).or_default().push(idx);
    }

    let mut used = vec![false; boundary.len()];
    let mut rings: Vec<Ring> = Vec::new();

    for start in 0..boundary.len() {
        if used[start] {
            continue;
        }

        let start_node = boundary[start].0;
        let mut points = vec![graph.nodes[start_node]];
        let mut current = start;
        let mut closed = false;

        for _ in 0..boundary.len() {
            used[current] = true;
            let (from, to) = boundary[current];
            points.push(graph.nodes[to]);

            if to == start_node {
                closed = true;
                break;
            }

            // Leftmost turn: smallest clockwise rotation from the reversed
            // incoming direction keeps the region interior on the left.
            let incoming = (graph.nodes[to] - graph.nodes[from]).atan2();
            let reverse = incoming + TAU / 2.0;
            let mut best: Option<(f64, usize)> = None;
            for &candidate in outgoing.get(&to).into_iter().flatten() {
                if used[candidate] {
                    continue;
                }
                let (_, next_to) = boundary[candidate];
                let out_angle = (graph.nodes[next_to] - graph.nodes[to]).atan2();
                let mut rotation = (reverse - out_angle).rem_euclid(TAU);
                if rotation < 1e-12 {
                    rotation = TAU;
                }
                if best.map_or(true, |(r, _)| rotation < r) {
                    best = Some((rotation, candidate));
                }
            }

            match best {
                Some((_, next)) => current = next,
                None => {
                    log::error!("boundary walk dead end at node {to}");
                    break;
                }
            }
        }

        if !closed {
            continue;
        }
        let ring = Ring::new(points);
        if ring.len() >= 3 && ring.area() > AREA_EPSILON {
            rings.push(ring);
        }
    }

    // Counter-clockwise rings are shells, clockwise rings are holes.
    let mut shells: Vec<(Ring, Vec<Ring>)> = Vec::new();
    let mut holes: Vec<Ring> = Vec::new();
    for ring in rings {
        if ring.is_ccw() {
            shells.push((ring, Vec::new()));
        } else {
            holes.push(ring);
        }
    }

    for hole in holes {
        let probe = match hole.interior_point() {
            Some(p) => p,
            None => continue,
        };
        let mut owner: Option<usize> = None;
        for (idx, (shell, _)) in shells.iter().enumerate() {
            if shell.contains(probe) {
                let smaller = owner.map_or(true, |o| shell.area() < shells[o].0.area());
                if smaller {
                    owner = Some(idx);
                }
            }
        }
        match owner {
            Some(idx) => shells[idx].1.push(hole),
            None => log::warn!("dropping hole ring with no containing shell"),
        }
    }

    PolygonSet::from_polygons(
        shells
            .into_iter()
            .map(|(exterior, holes)| Polygon::new(exterior, holes))
            .collect(),
    )
}

/// Union of two sets. Empty operands are identities.
pub fn union(a: &PolygonSet, b: &PolygonSet) -> PolygonSet {
    if a.is_empty() {
        return b.clone();
    }
    if b.is_empty() {
        return a.clone();
    }
    overlay(
        &[Operand::from_set(a), Operand::from_set(b)],
        |status| status.iter().any(|&inside| inside),
    )
}

/// Union of any number of sets in a single overlay pass.
pub fn union_all(sets: &[&PolygonSet]) -> PolygonSet {
    let non_empty: Vec<&PolygonSet> = sets.iter().copied().filter(|s| !s.is_empty()).collect();
    match non_empty.len() {
        0 => PolygonSet::empty(),
        1 => non_empty[0].clone(),
        _ => overlay(
            &non_empty
                .iter()
                .map(|set| Operand::from_set(set))
                .collect::<Vec<_>>(),
            |status| status.iter().any(|&inside| inside),
        ),
    }
}

/// `a` minus `b`. An empty `b` leaves `a` untouched.
pub fn difference(a: &PolygonSet, b: &PolygonSet) -> PolygonSet {
    if a.is_empty() {
        return PolygonSet::empty();
    }
    if b.is_empty() {
        return a.clone();
    }
    overlay(
        &[Operand::from_set(a), Operand::from_set(b)],
        |status| status[0] && !status[1],
    )
}

/// The region common to both sets.
pub fn intersection(a: &PolygonSet, b: &PolygonSet) -> PolygonSet {
    if a.is_empty() || b.is_empty() {
        return PolygonSet::empty();
    }
    overlay(
        &[Operand::from_set(a), Operand::from_set(b)],
        |status| status[0] && status[1],
    )
}

/// Polygonize a closed coordinate chain: every bounded face enclosed by
/// the chain (which may self-intersect) becomes part of the result. This
/// is the lasso closure algorithm.
pub fn polygonize(chain: &[Point]) -> PolygonSet {
    if chain.len() < 3 {
        return PolygonSet::empty();
    }
    overlay(&[Operand::from_chain(chain)], |status| status[0])
}

/// Union of a raw ring collection under the non-zero rule. Overlapping
/// same-orientation rings accumulate instead of cancelling.
pub fn union_rings(rings: &[Ring]) -> PolygonSet {
    if rings.is_empty() {
        return PolygonSet::empty();
    }
    overlay(&[Operand::from_rings(rings)], |status| status[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_set(x0: f64, y0: f64, x1: f64, y1: f64) -> PolygonSet {
        PolygonSet::from_ring(Ring::new(vec![
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ]))
    }

    #[test]
    fn test_union_of_overlapping_squares() {
        let a = square_set(0.0, 0.0, 2.0, 2.0);
        let b = square_set(1.0, 1.0, 3.0, 3.0);
        let result = union(&a, &b);
        assert_eq!(result.polygons().len(), 1);
        assert!((result.area() - 7.0).abs() < 1e-6);
        assert!(result.contains(Point::new(0.5, 0.5)));
        assert!(result.contains(Point::new(2.5, 2.5)));
        assert!(!result.contains(Point::new(2.5, 0.5)));
    }

    #[test]
    fn test_union_of_disjoint_squares() {
        let a = square_set(0.0, 0.0, 1.0, 1.0);
        let b = square_set(5.0, 5.0, 6.0, 6.0);
        let result = union(&a, &b);
        assert_eq!(result.polygons().len(), 2);
        assert!((result.area() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_union_with_empty_is_identity() {
        let a = square_set(0.0, 0.0, 2.0, 2.0);
        let empty = PolygonSet::empty();
        assert!((union(&a, &empty).area() - 4.0).abs() < 1e-9);
        assert!((union(&empty, &a).area() - 4.0).abs() < 1e-9);
        assert!(union(&empty, &empty).is_empty());
    }

    #[test]
    fn test_difference_cuts_hole() {
        let outer = square_set(0.0, 0.0, 10.0, 10.0);
        let inner = square_set(3.0, 3.0, 7.0, 7.0);
        let result = difference(&outer, &inner);
        assert_eq!(result.polygons().len(), 1);
        assert_eq!(result.polygons()[0].holes.len(), 1);
        assert!((result.area() - 84.0).abs() < 1e-6);
        assert!(result.contains(Point::new(1.0, 1.0)));
        assert!(!result.contains(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_difference_with_empty_erase_is_identity() {
        let a = square_set(0.0, 0.0, 2.0, 2.0);
        let result = difference(&a, &PolygonSet::empty());
        assert!((result.area() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_difference_of_covered_region_is_empty() {
        let small = square_set(2.0, 2.0, 3.0, 3.0);
        let big = square_set(0.0, 0.0, 10.0, 10.0);
        assert!(difference(&small, &big).is_empty());
    }

    #[test]
    fn test_intersection() {
        let a = square_set(0.0, 0.0, 2.0, 2.0);
        let b = square_set(1.0, 1.0, 3.0, 3.0);
        let result = intersection(&a, &b);
        assert!((result.area() - 1.0).abs() < 1e-6);
        assert!(result.contains(Point::new(1.5, 1.5)));

        let far = square_set(10.0, 10.0, 11.0, 11.0);
        assert!(intersection(&a, &far).is_empty());
    }

    #[test]
    fn test_union_all_matches_pairwise() {
        let a = square_set(0.0, 0.0, 2.0, 2.0);
        let b = square_set(1.0, 0.0, 3.0, 2.0);
        let c = square_set(2.0, 0.0, 4.0, 2.0);
        let all = union_all(&[&a, &b, &c]);
        let pairwise = union(&union(&a, &b), &c);
        assert!((all.area() - pairwise.area()).abs() < 1e-6);
        assert!((all.area() - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_polygonize_simple_loop() {
        let chain = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        let result = polygonize(&chain);
        assert_eq!(result.polygons().len(), 1);
        assert!((result.area() - 50.0).abs() < 1e-6);
        assert!(result.contains(Point::new(8.0, 2.0)));
    }

    #[test]
    fn test_polygonize_self_intersecting_loop() {
        // A bowtie: the chain crosses itself at (2, 2) and encloses two
        // triangular faces.
        let chain = [
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(0.0, 4.0),
            Point::new(4.0, 4.0),
        ];
        let result = polygonize(&chain);
        assert_eq!(result.polygons().len(), 2);
        assert!((result.area() - 8.0).abs() < 1e-6);
        assert!(result.contains(Point::new(2.0, 0.5)));
        assert!(result.contains(Point::new(2.0, 3.5)));
        assert!(!result.contains(Point::new(0.2, 2.0)));
    }

    #[test]
    fn test_polygonize_degenerate_chain() {
        assert!(polygonize(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]).is_empty());
        assert!(polygonize(&[]).is_empty());
    }

    #[test]
    fn test_union_rings_nonzero_rule() {
        let rings = vec![
            Ring::new(vec![
                Point::new(0.0, 0.0),
                Point::new(2.0, 0.0),
                Point::new(2.0, 2.0),
                Point::new(0.0, 2.0),
            ]),
            Ring::new(vec![
                Point::new(1.0, 1.0),
                Point::new(3.0, 1.0),
                Point::new(3.0, 3.0),
                Point::new(1.0, 3.0),
            ]),
        ];
        let result = union_rings(&rings);
        assert!((result.area() - 7.0).abs() < 1e-6);
    }
}
