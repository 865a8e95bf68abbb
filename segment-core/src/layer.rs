//! Polygon layer store and composite cache
//!
//! Five named layers compose into the single visible polygon set:
//! `difference(union(BaseImport, BaseTotal, BasePartial, Add), Erase)`.
//! Erase always wins over every additive source. The composite is
//! memoized by a content hash of all five layers, so repeated requests
//! with no intervening mutation do no geometry work.

use crate::planar;
use crate::polygon::PolygonSet;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// The five polygon layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Externally supplied baseline for the active target. Set once per
    /// target selection.
    BaseImport,
    /// Server-computed full label result, replaced wholesale.
    BaseTotal,
    /// Accumulated lasso-confirmed partial regions.
    BasePartial,
    /// Manually drawn additive regions.
    Add,
    /// Manually drawn subtractive regions.
    Erase,
}

impl Layer {
    pub fn all() -> &'static [Layer] {
        &[
            Layer::BaseImport,
            Layer::BaseTotal,
            Layer::BasePartial,
            Layer::Add,
            Layer::Erase,
        ]
    }
}

/// Result of a composite request.
pub struct Composite {
    /// The composed polygon set.
    pub polygons: PolygonSet,
    /// True when the union/difference work actually ran (cache miss).
    pub recomputed: bool,
}

/// Store for the five layers plus the memoized composite.
#[derive(Default)]
pub struct LayerStore {
    base_import: PolygonSet,
    base_total: PolygonSet,
    base_partial: PolygonSet,
    add: PolygonSet,
    erase: PolygonSet,

    /// Content hash of the five layers mapped to a computed composite.
    /// Mutations change the hash, so stale entries are simply never hit.
    cache: HashMap<u64, PolygonSet>,
}

impl LayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, layer: Layer) -> &PolygonSet {
        match layer {
            Layer::BaseImport => &self.base_import,
            Layer::BaseTotal => &self.base_total,
            Layer::BasePartial => &self.base_partial,
            Layer::Add => &self.add,
            Layer::Erase => &self.erase,
        }
    }

    pub fn set(&mut self, layer: Layer, polygons: PolygonSet) {
        let slot = match layer {
            Layer::BaseImport => &mut self.base_import,
            Layer::BaseTotal => &mut self.base_total,
            Layer::BasePartial => &mut self.base_partial,
            Layer::Add => &mut self.add,
            Layer::Erase => &mut self.erase,
        };
        *slot = polygons;
    }

    /// Reset every layer to the empty set and drop the cache.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Deterministic content hash of the five layers.
    fn content_hash(&self) -> u64 {
        let serialized = serde_json::to_string(&(
            &self.base_import,
            &self.base_total,
            &self.base_partial,
            &self.add,
            &self.erase,
        ))
        .expect("layer serialization is infallible");
        let mut hasher = DefaultHasher::new();
        serialized.hash(&mut hasher);
        hasher.finish()
    }

    /// The visible composite. Cached: calling this twice without an
    /// intervening `set` returns the identical value and computes at most
    /// once.
    pub fn composite(&mut self) -> Composite {
        let key = self.content_hash();
        if let Some(cached) = self.cache.get(&key) {
            return Composite {
                polygons: cached.clone(),
                recomputed: false,
            };
        }

        log::debug!("composite cache miss, recomputing");
        let positive = planar::union_all(&[
            &self.base_import,
            &self.base_total,
            &self.base_partial,
            &self.add,
        ]);
        let total = positive.difference(&self.erase);

        self.cache.insert(key, total.clone());
        Composite {
            polygons: total,
            recomputed: true,
        }
    }
}
