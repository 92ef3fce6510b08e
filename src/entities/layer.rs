//! Build-up layer entity - one inspected side of one manufacturing layer

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::geometry::{GeometryContext, PanelGrid, Quadrant};
use crate::core::layout;
use crate::core::verification::Verified;
use crate::entities::defect::{DefectRecord, LayerKey, Side};

/// A defect record enriched with layout-derived columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedDefect {
    #[serde(flatten)]
    pub record: DefectRecord,

    pub quadrant: Quadrant,

    /// Panel-relative plotting position (mm)
    pub plot_x: f64,
    pub plot_y: f64,

    /// Unit column as inspected
    pub physical_x_raw: i32,

    /// Unit column aligned to the front-side view
    pub physical_x_flipped: i32,

    pub physical_plot_x_raw: f64,
    pub physical_plot_x_flipped: f64,
}

impl PlacedDefect {
    pub fn layer_num(&self) -> i32 {
        self.record.layer_num
    }

    pub fn side(&self) -> Side {
        self.record.side
    }

    pub fn unit_x(&self) -> i32 {
        self.record.unit_index_x
    }

    pub fn unit_y(&self) -> i32 {
        self.record.unit_index_y
    }

    pub fn defect_type(&self) -> &str {
        &self.record.defect_type
    }
}

impl Verified for PlacedDefect {
    fn verification(&self) -> Option<&str> {
        self.record.verification.as_deref()
    }
}

/// One side (Front/Back) of a build-up layer.
///
/// Derived coordinates are computed once at construction and never change.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildUpLayer {
    key: LayerKey,
    grid: PanelGrid,
    defects: Vec<PlacedDefect>,
}

impl BuildUpLayer {
    /// Build a layer with cosmetic jitter from the thread-local RNG
    pub fn new(
        layer_num: i32,
        side: Side,
        records: Vec<DefectRecord>,
        ctx: &GeometryContext,
        grid: PanelGrid,
    ) -> Self {
        Self::with_rng(layer_num, side, records, ctx, grid, &mut rand::rng())
    }

    /// Build a layer drawing jitter from the given random source
    pub fn with_rng<R: Rng>(
        layer_num: i32,
        side: Side,
        records: Vec<DefectRecord>,
        ctx: &GeometryContext,
        grid: PanelGrid,
        rng: &mut R,
    ) -> Self {
        let key = LayerKey::new(layer_num, side);

        // Every record belongs to this layer's (layer, side)
        let records: Vec<DefectRecord> = records.into_iter().map(|r| r.on(layer_num, side)).collect();
        let defects = layout::apply_layout(records, ctx, &grid, rng);

        tracing::debug!("Built layer {} with {} records", key, defects.len());

        Self { key, grid, defects }
    }

    pub fn key(&self) -> LayerKey {
        self.key
    }

    pub fn layer_num(&self) -> i32 {
        self.key.layer_num
    }

    pub fn side(&self) -> Side {
        self.key.side
    }

    pub fn grid(&self) -> &PanelGrid {
        &self.grid
    }

    /// Display label, e.g. "Layer 2 (Back)"
    pub fn label(&self) -> String {
        format!("Layer {} ({})", self.key.layer_num, self.key.side.name())
    }

    /// Enriched records
    pub fn data(&self) -> &[PlacedDefect] {
        &self.defects
    }

    pub fn len(&self) -> usize {
        self.defects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defects.is_empty()
    }

    /// Whether any record carries a verification outcome
    pub fn has_verification_data(&self) -> bool {
        self.defects.iter().any(|d| d.record.verification.is_some())
    }
}
