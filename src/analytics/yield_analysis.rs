//! Yield analysis: killer KPIs, cross-sections and unique defective cells

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::DMatrix;
use serde::Serialize;

use crate::analytics::stress::matrix_rows;
use crate::core::geometry::PanelGrid;
use crate::core::verification::{normalize_verification, DefectClassifier, Verified};
use crate::entities::defect::Side;
use crate::entities::layer::PlacedDefect;
use crate::entities::panel::PanelData;

/// Which side carries more true defects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SideBias {
    Front,
    Back,
    Balanced,
}

impl SideBias {
    fn from_counts(front: usize, back: usize) -> Self {
        match front.cmp(&back) {
            std::cmp::Ordering::Greater => SideBias::Front,
            std::cmp::Ordering::Less => SideBias::Back,
            std::cmp::Ordering::Equal => SideBias::Balanced,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SideBias::Front => "Front Side",
            SideBias::Back => "Back Side",
            SideBias::Balanced => "Balanced",
        }
    }
}

impl std::fmt::Display for SideBias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Headline yield KPIs over every layer and side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YieldKillerMetrics {
    pub top_killer_layer: i32,
    pub top_killer_count: usize,

    /// Raw (x, y) unit index, not mirrored
    pub worst_unit: (i32, i32),
    pub worst_unit_count: usize,

    pub side_bias: SideBias,
    pub side_bias_diff: usize,
}

/// Key with the highest count; the smallest key wins ties
fn max_by_count<K: Ord + Copy>(counts: &BTreeMap<K, usize>) -> Option<(K, usize)> {
    counts
        .iter()
        .fold(None, |best: Option<(K, usize)>, (&k, &c)| match best {
            Some((_, bc)) if bc >= c => best,
            _ => Some((k, c)),
        })
}

/// Compute yield-killer KPIs.
///
/// Returns `None` when the panel holds no true defects.
pub fn calculate_yield_killers(
    panel: &PanelData,
    classifier: &DefectClassifier,
) -> Option<YieldKillerMetrics> {
    let mut by_layer: BTreeMap<i32, usize> = BTreeMap::new();
    let mut by_unit: BTreeMap<(i32, i32), usize> = BTreeMap::new();
    let (mut front, mut back) = (0usize, 0usize);

    for defect in panel
        .iter_layers()
        .flat_map(|l| l.data().iter())
        .filter(|d| classifier.is_true_defect(d.verification()))
    {
        *by_layer.entry(defect.layer_num()).or_insert(0) += 1;
        *by_unit.entry((defect.unit_x(), defect.unit_y())).or_insert(0) += 1;
        match defect.side() {
            Side::Front => front += 1,
            Side::Back => back += 1,
        }
    }

    let (top_killer_layer, top_killer_count) = max_by_count(&by_layer)?;
    let (worst_unit, worst_unit_count) = max_by_count(&by_unit)?;

    Some(YieldKillerMetrics {
        top_killer_layer,
        top_killer_count,
        worst_unit,
        worst_unit_count,
        side_bias: SideBias::from_counts(front, back),
        side_bias_diff: front.abs_diff(back),
    })
}

/// Axis held fixed by a cross-section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceAxis {
    /// Fix a unit column, count along rows
    X,
    /// Fix a unit row, count along columns
    Y,
}

/// Per-layer true-defect counts along one slice through the layer stack
#[derive(Debug, Clone, PartialEq)]
pub struct CrossSection {
    /// `layers x width` counts
    pub matrix: DMatrix<u32>,
    pub layer_labels: Vec<String>,
    pub axis_labels: Vec<String>,
}

impl CrossSection {
    fn empty() -> Self {
        Self {
            matrix: DMatrix::zeros(0, 0),
            layer_labels: Vec::new(),
            axis_labels: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.layer_labels.is_empty()
    }

    pub fn rows(&self) -> Vec<Vec<u32>> {
        matrix_rows(&self.matrix)
    }
}

/// Build a cross-section at `index` on `axis`.
///
/// Both sides of a layer contribute to its row. Rows outside the grid are
/// ignored.
pub fn cross_section_matrix(
    panel: &PanelData,
    axis: SliceAxis,
    index: i32,
    grid: &PanelGrid,
    classifier: &DefectClassifier,
) -> CrossSection {
    let layer_nums = panel.get_all_layer_nums();
    if layer_nums.is_empty() {
        return CrossSection::empty();
    }

    let width = match axis {
        SliceAxis::Y => grid.total_cols(),
        SliceAxis::X => grid.total_rows(),
    };
    let mut matrix = DMatrix::<u32>::zeros(layer_nums.len(), width);

    for (row, &layer_num) in layer_nums.iter().enumerate() {
        let defects = panel
            .get_sides_for_layer(layer_num)
            .into_iter()
            .filter_map(|side| panel.get_layer(layer_num, side))
            .flat_map(|l| l.data().iter())
            .filter(|d| classifier.is_true_defect(d.verification()))
            .filter(|d| grid.contains(d.unit_x(), d.unit_y()));

        for defect in defects {
            let (fixed, along) = match axis {
                SliceAxis::Y => (defect.unit_y(), defect.unit_x()),
                SliceAxis::X => (defect.unit_x(), defect.unit_y()),
            };
            if fixed == index {
                matrix[(row, along as usize)] += 1;
            }
        }
    }

    CrossSection {
        matrix,
        layer_labels: layer_nums.iter().map(|n| format!("L{}", n)).collect(),
        axis_labels: (0..width).map(|i| i.to_string()).collect(),
    }
}

/// Restricts which defects count toward defective cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFilter {
    pub excluded_layers: BTreeSet<i32>,

    /// Verification codes to ignore, compared normalized
    pub excluded_verification: BTreeSet<String>,

    pub included_sides: BTreeSet<Side>,
}

impl Default for CellFilter {
    fn default() -> Self {
        Self {
            excluded_layers: BTreeSet::new(),
            excluded_verification: BTreeSet::new(),
            included_sides: Side::ALL.into_iter().collect(),
        }
    }
}

impl CellFilter {
    pub fn exclude_layers(mut self, layers: impl IntoIterator<Item = i32>) -> Self {
        self.excluded_layers.extend(layers);
        self
    }

    pub fn exclude_verification<S: AsRef<str>>(mut self, codes: impl IntoIterator<Item = S>) -> Self {
        self.excluded_verification
            .extend(codes.into_iter().map(|c| normalize_verification(c.as_ref())));
        self
    }

    pub fn sides(mut self, sides: impl IntoIterator<Item = Side>) -> Self {
        self.included_sides = sides.into_iter().collect();
        self
    }

    fn matches(&self, defect: &PlacedDefect) -> bool {
        if self.excluded_layers.contains(&defect.layer_num()) {
            return false;
        }
        if !self.included_sides.contains(&defect.side()) {
            return false;
        }
        match defect.verification() {
            Some(v) if !self.excluded_verification.is_empty() => {
                !self.excluded_verification.contains(&normalize_verification(v))
            }
            _ => true,
        }
    }
}

/// A physical unit killed by at least one true defect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefectiveCell {
    /// Earliest layer with a true defect at this location
    pub first_killer_layer: i32,

    /// e.g. "L1: 5, L2: 3"
    pub defect_summary: String,
}

/// Group true defects by physical location across the whole layer stack.
///
/// Keys are `(PHYSICAL_X_FLIPPED, unit_index_y)` so that front and back hits
/// on the same physical unit coincide.
pub fn get_true_defect_coordinates(
    panel: &PanelData,
    classifier: &DefectClassifier,
    filter: &CellFilter,
) -> BTreeMap<(i32, i32), DefectiveCell> {
    let mut per_cell: BTreeMap<(i32, i32), BTreeMap<i32, usize>> = BTreeMap::new();

    for defect in panel
        .iter_layers()
        .flat_map(|l| l.data().iter())
        .filter(|d| classifier.is_true_defect(d.verification()))
        .filter(|d| filter.matches(d))
    {
        *per_cell
            .entry((defect.physical_x_flipped, defect.unit_y()))
            .or_default()
            .entry(defect.layer_num())
            .or_insert(0) += 1;
    }

    let cells: BTreeMap<(i32, i32), DefectiveCell> = per_cell
        .into_iter()
        .filter_map(|(coord, layers)| {
            let first_killer_layer = *layers.keys().next()?;
            let defect_summary = layers
                .iter()
                .map(|(layer, count)| format!("L{}: {}", layer, count))
                .collect::<Vec<_>>()
                .join(", ");
            Some((
                coord,
                DefectiveCell {
                    first_killer_layer,
                    defect_summary,
                },
            ))
        })
        .collect();

    tracing::debug!("{} unique defective cells", cells.len());
    cells
}

/// Units surviving every selected layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AliveSummary {
    pub total_units: usize,
    pub defective_units: usize,
    pub alive_units: usize,
    pub yield_pct: f64,
}

/// Summarize panel survival from unique defective cells
pub fn still_alive_summary(
    grid: &PanelGrid,
    cells: &BTreeMap<(i32, i32), DefectiveCell>,
) -> AliveSummary {
    let total_units = grid.total_units();
    let defective_units = cells.keys().filter(|(x, y)| grid.contains(*x, *y)).count();
    let alive_units = total_units - defective_units;
    AliveSummary {
        total_units,
        defective_units,
        alive_units,
        yield_pct: alive_units as f64 / total_units as f64 * 100.0,
    }
}
