//! Label point collection
//!
//! Ordered positive/negative label points used for server-assisted
//! labeling. Points are identified by `Uuid` so a later proximity click
//! (or an undo) can remove exactly the right one.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Polarity of a label point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelType {
    Positive,
    Negative,
}

impl LabelType {
    /// The opposite polarity.
    pub fn inverted(self) -> LabelType {
        match self {
            LabelType::Positive => LabelType::Negative,
            LabelType::Negative => LabelType::Positive,
        }
    }
}

/// A single placed label point.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabelPoint {
    pub id: Uuid,
    pub coordinate: Point,
    pub label_type: LabelType,
}

impl LabelPoint {
    pub fn new(coordinate: Point, label_type: LabelType) -> Self {
        Self {
            id: Uuid::new_v4(),
            coordinate,
            label_type,
        }
    }
}

/// Busy flag for the label submission round trip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabelRequestState {
    #[default]
    Off,
    Waiting,
}

/// The ordered list of label points.
#[derive(Clone, Debug, Default)]
pub struct LabelSet {
    points: Vec<LabelPoint>,
}

impl LabelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[LabelPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn push(&mut self, point: LabelPoint) {
        self.points.push(point);
    }

    /// Remove a point by identity. Returns false when absent.
    pub fn remove_by_id(&mut self, id: Uuid) -> bool {
        let before = self.points.len();
        self.points.retain(|p| p.id != id);
        before != self.points.len()
    }

    /// Remove and return the first point within `max_distance` of
    /// `coordinate`.
    pub fn remove_near(&mut self, coordinate: Point, max_distance: f64) -> Option<LabelPoint> {
        let index = self
            .points
            .iter()
            .position(|p| (p.coordinate - coordinate).hypot() < max_distance)?;
        Some(self.points.remove(index))
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_remove_by_id() {
        let mut labels = LabelSet::new();
        let point = LabelPoint::new(Point::new(1.0, 2.0), LabelType::Positive);
        let id = point.id;
        labels.push(point);
        assert_eq!(labels.len(), 1);

        assert!(labels.remove_by_id(id));
        assert!(labels.is_empty());
        assert!(!labels.remove_by_id(id));
    }

    #[test]
    fn test_remove_near_takes_first_match() {
        let mut labels = LabelSet::new();
        labels.push(LabelPoint::new(Point::new(0.0, 0.0), LabelType::Positive));
        labels.push(LabelPoint::new(Point::new(1.0, 0.0), LabelType::Negative));

        let removed = labels.remove_near(Point::new(0.5, 0.0), 2.0).unwrap();
        assert_eq!(removed.label_type, LabelType::Positive);
        assert_eq!(labels.len(), 1);

        assert!(labels.remove_near(Point::new(50.0, 50.0), 2.0).is_none());
    }

    #[test]
    fn test_inverted() {
        assert_eq!(LabelType::Positive.inverted(), LabelType::Negative);
        assert_eq!(LabelType::Negative.inverted(), LabelType::Positive);
    }
}
