//! Selection state and the user-facing feature set
//!
//! The composite (or, in draw-select mode, a raw layer) is materialized
//! as a list of features, one per component polygon, each with a fresh
//! `Uuid`. Selection tracks feature ids; deletion resolves them back to
//! geometry.

use crate::polygon::{Polygon, PolygonSet};
use uuid::Uuid;

/// One selectable polygon feature.
#[derive(Clone, Debug)]
pub struct Feature {
    pub id: Uuid,
    pub polygon: Polygon,
}

/// The currently displayed feature list.
#[derive(Clone, Debug, Default)]
pub struct FeatureSet {
    features: Vec<Feature>,
}

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize a polygon set, assigning fresh ids.
    pub fn from_set(set: &PolygonSet) -> Self {
        Self {
            features: set
                .polygons()
                .iter()
                .map(|polygon| Feature {
                    id: Uuid::new_v4(),
                    polygon: polygon.clone(),
                })
                .collect(),
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn get(&self, id: Uuid) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    /// Remove features by id and return what is left as a polygon set.
    pub fn remove(&mut self, ids: &[Uuid]) -> PolygonSet {
        self.features.retain(|f| !ids.contains(&f.id));
        self.as_set()
    }

    pub fn as_set(&self) -> PolygonSet {
        PolygonSet::from_polygons(self.features.iter().map(|f| f.polygon.clone()).collect())
    }

    pub fn clear(&mut self) {
        self.features.clear();
    }
}

/// The set of selected feature ids.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    selected: Vec<Uuid>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: Uuid) {
        if !self.selected.contains(&id) {
            self.selected.push(id);
        }
    }

    pub fn remove(&mut self, id: &Uuid) {
        self.selected.retain(|s| s != id);
    }

    pub fn toggle(&mut self, id: Uuid) {
        if self.contains(&id) {
            self.remove(&id);
        } else {
            self.add(id);
        }
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.selected.contains(id)
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polygon::Ring;
    use kurbo::Point;

    fn two_square_set() -> PolygonSet {
        PolygonSet::from_polygons(vec![
            Polygon::new(
                Ring::new(vec![
                    Point::new(0.0, 0.0),
                    Point::new(1.0, 0.0),
                    Point::new(1.0, 1.0),
                    Point::new(0.0, 1.0),
                ]),
                Vec::new(),
            ),
            Polygon::new(
                Ring::new(vec![
                    Point::new(5.0, 5.0),
                    Point::new(6.0, 5.0),
                    Point::new(6.0, 6.0),
                    Point::new(5.0, 6.0),
                ]),
                Vec::new(),
            ),
        ])
    }

    #[test]
    fn test_feature_set_materialization() {
        let features = FeatureSet::from_set(&two_square_set());
        assert_eq!(features.features().len(), 2);
        let ids: Vec<Uuid> = features.features().iter().map(|f| f.id).collect();
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_remove_returns_remaining_set() {
        let mut features = FeatureSet::from_set(&two_square_set());
        let first = features.features()[0].id;
        let remaining = features.remove(&[first]);
        assert_eq!(features.features().len(), 1);
        assert!((remaining.area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_selection_add_toggle_clear() {
        let mut selection = Selection::new();
        let id = Uuid::new_v4();

        selection.add(id);
        selection.add(id);
        assert_eq!(selection.len(), 1);

        selection.toggle(id);
        assert!(selection.is_empty());

        selection.toggle(id);
        assert!(selection.contains(&id));

        selection.clear();
        assert!(selection.is_empty());
    }
}
