//! Lasso state
//!
//! Incremental point/edge collection for the free-form lasso. The session
//! orchestrates clicks, server round trips and closure; this module owns
//! the data: ordered points, ordered edges (one per consecutive point
//! pair, plus a tentative edge trailing the pointer), and the lifecycle
//! state.

use kurbo::{Point, Rect};
use uuid::Uuid;

/// Side length of the crop square the lasso service works within.
pub const LASSO_CROP_SIZE: f64 = 1024.0;
const HALF_SIZE: f64 = LASSO_CROP_SIZE / 2.0;

/// Lifecycle of a lasso session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LassoState {
    #[default]
    Off,
    /// First click sent, waiting for the service to confirm.
    Waiting,
    Active,
}

/// A committed lasso vertex.
#[derive(Clone, Debug)]
pub struct LassoPoint {
    pub id: Uuid,
    pub coordinate: Point,
    pub index: usize,
}

/// An edge of the lasso chain. `coordinates` may be a straight pair or a
/// snapped polyline from the magnetic service.
#[derive(Clone, Debug)]
pub struct LassoEdge {
    pub id: Uuid,
    pub index: usize,
    pub coordinates: Vec<Point>,
}

/// All transient lasso data.
#[derive(Debug, Default)]
pub struct LassoEngine {
    state: LassoState,
    start_coordinate: Option<Point>,
    points: Vec<LassoPoint>,
    edges: Vec<LassoEdge>,
}

impl LassoEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LassoState {
        self.state
    }

    pub fn set_state(&mut self, state: LassoState) {
        self.state = state;
    }

    pub fn start_coordinate(&self) -> Option<Point> {
        self.start_coordinate
    }

    pub fn set_start_coordinate(&mut self, coordinate: Point) {
        self.start_coordinate = Some(coordinate);
    }

    pub fn points(&self) -> &[LassoPoint] {
        &self.points
    }

    pub fn edges(&self) -> &[LassoEdge] {
        &self.edges
    }

    /// Clear everything and return to `Off`.
    pub fn reset(&mut self) {
        self.state = LassoState::Off;
        self.start_coordinate = None;
        self.points.clear();
        self.edges.clear();
    }

    pub fn push_point(&mut self, coordinate: Point) {
        let index = self.points.len();
        self.points.push(LassoPoint {
            id: Uuid::new_v4(),
            coordinate,
            index,
        });
    }

    pub fn pop_point(&mut self) -> Option<LassoPoint> {
        self.points.pop()
    }

    pub fn last_point(&self) -> Option<&LassoPoint> {
        self.points.last()
    }

    pub fn first_point(&self) -> Option<&LassoPoint> {
        self.points.first()
    }

    /// End coordinate of the tentative edge, which the next click snaps
    /// to. `None` when only committed edges exist, so a click without a
    /// tracked edge lands where it was aimed.
    pub fn tentative_edge_end(&self) -> Option<Point> {
        let committed = self.points.len().saturating_sub(1);
        if self.edges.len() <= committed {
            return None;
        }
        self.edges.last().and_then(|edge| edge.coordinates.last().copied())
    }

    /// Replace the tentative edge: drop every edge at or past the last
    /// committed pair, then append one ending at `coordinates`.
    ///
    /// With n committed points there are n-1 committed edges; anything
    /// beyond is tentative and tracks the pointer (or the latest magnetic
    /// suggestion).
    pub fn set_tentative_edge(&mut self, coordinates: Vec<Point>) {
        let committed = self.points.len().saturating_sub(1);
        self.edges.truncate(committed);
        self.push_edge(coordinates);
    }

    pub fn push_edge(&mut self, coordinates: Vec<Point>) {
        let index = self.edges.len();
        self.edges.push(LassoEdge {
            id: Uuid::new_v4(),
            index,
            coordinates,
        });
    }

    /// Keep only the first `count` edges. Used when a point is removed:
    /// every edge incident to it goes too.
    pub fn truncate_edges(&mut self, count: usize) {
        self.edges.truncate(count);
    }

    /// Make sure an edge exists for every committed point pair,
    /// synthesizing straight edges where the pointer never moved.
    pub fn ensure_committed_edges(&mut self) {
        let committed = self.points.len().saturating_sub(1);
        while self.edges.len() < committed {
            let index = self.edges.len();
            let a = self.points[index].coordinate;
            let b = self.points[index + 1].coordinate;
            self.push_edge(vec![a, b]);
        }
    }

    /// The closed ring of the whole chain: every edge's coordinates in
    /// index order, closed back to the first coordinate.
    pub fn closure_ring(&self) -> Vec<Point> {
        let mut edges: Vec<&LassoEdge> = self.edges.iter().collect();
        edges.sort_by_key(|edge| edge.index);

        let mut coordinates: Vec<Point> = Vec::new();
        for edge in edges {
            coordinates.extend(edge.coordinates.iter().copied());
        }
        if let Some(first) = coordinates.first().copied() {
            coordinates.push(first);
        }
        coordinates
    }

    /// The crop box the guide overlay darkens around the start point.
    pub fn guide_box(&self) -> Option<Rect> {
        let center = self.start_coordinate?;
        Some(Rect::new(
            center.x - HALF_SIZE,
            center.y - HALF_SIZE,
            center.x + HALF_SIZE,
            center.y + HALF_SIZE,
        ))
    }
}
