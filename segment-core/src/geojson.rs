//! Wire geometry format
//!
//! GeoJSON-shaped `Polygon`/`MultiPolygon`/`LineString` values exchanged
//! with the remote services, with coordinates in the active projected
//! space. Rings are closed on the wire (the first position repeats at the
//! end); `PolygonSet` stores them open, so conversion handles both.

use crate::polygon::{Polygon, PolygonSet, Ring};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// A `[x, y]` wire position.
pub type Position = [f64; 2];

/// The geometry payloads the services understand.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    LineString { coordinates: Vec<Position> },
}

pub fn to_point(position: Position) -> Point {
    Point::new(position[0], position[1])
}

pub fn from_point(point: Point) -> Position {
    [point.x, point.y]
}

fn ring_to_positions(ring: &Ring) -> Vec<Position> {
    let mut positions: Vec<Position> = ring.points().iter().map(|p| from_point(*p)).collect();
    if let Some(first) = positions.first().copied() {
        positions.push(first);
    }
    positions
}

fn positions_to_ring(positions: &[Position]) -> Ring {
    Ring::new(positions.iter().map(|p| to_point(*p)).collect())
}

/// Serialize a polygon set as a wire `MultiPolygon`.
pub fn multi_polygon(set: &PolygonSet) -> Geometry {
    Geometry::MultiPolygon {
        coordinates: set
            .polygons()
            .iter()
            .map(|polygon| polygon.rings().map(ring_to_positions).collect())
            .collect(),
    }
}

/// Serialize an open coordinate chain as a wire `LineString`.
pub fn line_string(points: &[Point]) -> Geometry {
    Geometry::LineString {
        coordinates: points.iter().map(|p| from_point(*p)).collect(),
    }
}

/// Parse a wire geometry into a polygon set. `Polygon` and `MultiPolygon`
/// are accepted; empty coordinate arrays produce the empty set. Returns
/// `None` for a `LineString`, which has no interior.
pub fn to_polygon_set(geometry: &Geometry) -> Option<PolygonSet> {
    let polygon_from_rings = |rings: &Vec<Vec<Position>>| -> Option<Polygon> {
        let mut iter = rings.iter().map(|ring| positions_to_ring(ring));
        let exterior = iter.next()?;
        if exterior.is_empty() {
            return None;
        }
        Some(Polygon::new(exterior, iter.collect()))
    };

    match geometry {
        Geometry::Polygon { coordinates } => Some(PolygonSet::from_polygons(
            polygon_from_rings(coordinates).into_iter().collect(),
        )),
        Geometry::MultiPolygon { coordinates } => Some(PolygonSet::from_polygons(
            coordinates.iter().filter_map(polygon_from_rings).collect(),
        )),
        Geometry::LineString { .. } => None,
    }
}

/// Parse a wire `LineString` into a coordinate chain.
pub fn to_points(geometry: &Geometry) -> Option<Vec<Point>> {
    match geometry {
        Geometry::LineString { coordinates } => {
            Some(coordinates.iter().map(|p| to_point(*p)).collect())
        }
        _ => None,
    }
}
