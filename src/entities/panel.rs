//! Panel data - the aggregation root for one inspected dataset

use std::borrow::Cow;
use std::cell::OnceCell;
use std::collections::BTreeMap;

use crate::entities::defect::{LayerKey, Side};
use crate::entities::layer::{BuildUpLayer, PlacedDefect};

/// Row predicate applied while building a combined view
pub type RowFilter<'f> = &'f dyn Fn(&PlacedDefect) -> bool;

/// All build-up layers of one dataset, indexed `layer_num -> side -> layer`.
///
/// Created once per dataset, populated with [`PanelData::add_layer`] and read
/// many times. The concatenated view over every layer is memoized until the
/// next layer is added.
#[derive(Debug, Clone)]
pub struct PanelData {
    id: String,
    layers: BTreeMap<i32, BTreeMap<Side, BuildUpLayer>>,
    combined: OnceCell<Vec<PlacedDefect>>,
}

impl Default for PanelData {
    fn default() -> Self {
        Self::new()
    }
}

impl PanelData {
    /// Create an empty dataset with a fresh unique identity
    pub fn new() -> Self {
        Self::with_id(ulid::Ulid::new().to_string())
    }

    /// Create an empty dataset with a caller-chosen identity
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            layers: BTreeMap::new(),
            combined: OnceCell::new(),
        }
    }

    /// Dataset identity, for caller-side memoization of analysis results
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Insert a layer, replacing any existing layer with the same key
    pub fn add_layer(&mut self, layer: BuildUpLayer) -> Option<BuildUpLayer> {
        self.combined = OnceCell::new();
        let replaced = self
            .layers
            .entry(layer.layer_num())
            .or_default()
            .insert(layer.side(), layer);
        if let Some(ref old) = replaced {
            tracing::warn!("Replaced existing layer {}", old.key());
        }
        replaced
    }

    pub fn get_layer(&self, layer_num: i32, side: Side) -> Option<&BuildUpLayer> {
        self.layers.get(&layer_num).and_then(|sides| sides.get(&side))
    }

    /// Layer numbers in ascending order
    pub fn get_all_layer_nums(&self) -> Vec<i32> {
        self.layers.keys().copied().collect()
    }

    /// Sides present for a layer, Front before Back
    pub fn get_sides_for_layer(&self, layer_num: i32) -> Vec<Side> {
        self.layers
            .get(&layer_num)
            .map(|sides| sides.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Every (layer, side) key in ascending order
    pub fn keys(&self) -> Vec<LayerKey> {
        self.iter_layers().map(|l| l.key()).collect()
    }

    /// Iterate layers ordered by layer number, then side
    pub fn iter_layers(&self) -> impl Iterator<Item = &BuildUpLayer> {
        self.layers.values().flat_map(|sides| sides.values())
    }

    /// Number of distinct layer numbers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Records of the requested layers, skipping keys with no data
    pub fn records_for<'a>(
        &'a self,
        keys: &'a [LayerKey],
    ) -> impl Iterator<Item = &'a PlacedDefect> + 'a {
        keys.iter()
            .filter_map(move |key| self.get_layer(key.layer_num, key.side))
            .flat_map(|layer| layer.data().iter())
    }

    /// All layers concatenated, each row tagged with its layer and side.
    ///
    /// Without a filter the result is memoized and borrowed; with a filter a
    /// fresh vector is built on every call.
    pub fn get_combined_dataframe(&self, filter: Option<RowFilter<'_>>) -> Cow<'_, [PlacedDefect]> {
        match filter {
            None => Cow::Borrowed(self.combined.get_or_init(|| {
                let rows: Vec<PlacedDefect> =
                    self.iter_layers().flat_map(|l| l.data().iter().cloned()).collect();
                tracing::debug!("Cached combined view of {} rows", rows.len());
                rows
            })),
            Some(keep) => Cow::Owned(
                self.iter_layers()
                    .flat_map(|l| l.data().iter())
                    .filter(|row| keep(row))
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// Whether the combined view is currently memoized
    pub fn is_combined_cached(&self) -> bool {
        self.combined.get().is_some()
    }
}
