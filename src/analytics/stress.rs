//! Stress map aggregation
//!
//! Bins true defects from a selection of (layer, side) pairs onto the unit
//! grid. Binning uses the raw unit index: stress correlates with machine
//! positions, independent of back-side mirroring.

use std::collections::BTreeMap;

use nalgebra::DMatrix;
use serde::Serialize;

use crate::analytics::AnalyticsError;
use crate::core::geometry::{PanelGrid, Quadrant};
use crate::core::verification::{normalize_verification, DefectClassifier, Verified};
use crate::entities::defect::{LayerKey, Side};
use crate::entities::layer::PlacedDefect;
use crate::entities::panel::PanelData;

/// Hover text of a cell without defects
pub const NO_DEFECTS: &str = "No Defects";

/// Number of defect types listed per cell
const TOP_TYPES: usize = 3;

/// Optional narrowing of a stress aggregation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StressFilter {
    /// Keep only these verification codes (ignored when empty)
    pub verification: Vec<String>,

    /// Keep only one quadrant (`None` = all)
    pub quadrant: Option<Quadrant>,
}

impl StressFilter {
    fn matches(&self, defect: &PlacedDefect) -> bool {
        if let Some(q) = self.quadrant {
            if defect.quadrant != q {
                return false;
            }
        }
        if self.verification.is_empty() {
            return true;
        }
        match defect.verification() {
            Some(v) => {
                let v = normalize_verification(v);
                self.verification.iter().any(|f| normalize_verification(f) == v)
            }
            None => false,
        }
    }
}

/// Aggregated true-defect counts per unit, indexed `(row, col)` = `(y, x)`
#[derive(Debug, Clone, PartialEq)]
pub struct StressMapData {
    pub grid_counts: DMatrix<u32>,
    pub hover_text: DMatrix<String>,
    pub total_defects: u32,
    pub max_count: u32,
}

impl StressMapData {
    /// All-zero map for a grid
    pub fn empty(grid: &PanelGrid) -> Self {
        let (rows, cols) = (grid.total_rows(), grid.total_cols());
        Self {
            grid_counts: DMatrix::zeros(rows, cols),
            hover_text: DMatrix::from_element(rows, cols, NO_DEFECTS.to_string()),
            total_defects: 0,
            max_count: 0,
        }
    }

    /// Count at raw unit `(x, y)`, `None` off the grid
    pub fn count_at(&self, x: usize, y: usize) -> Option<u32> {
        self.grid_counts.get((y, x)).copied()
    }

    /// Hover text at raw unit `(x, y)`, `None` off the grid
    pub fn hover_at(&self, x: usize, y: usize) -> Option<&str> {
        self.hover_text.get((y, x)).map(String::as_str)
    }

    pub fn shape(&self) -> (usize, usize) {
        self.grid_counts.shape()
    }

    /// Row-major counts, for serialization
    pub fn count_rows(&self) -> Vec<Vec<u32>> {
        matrix_rows(&self.grid_counts)
    }
}

/// Serializable summary of a stress map
#[derive(Debug, Clone, Serialize)]
pub struct StressMapReport {
    pub total_defects: u32,
    pub max_count: u32,
    pub grid_counts: Vec<Vec<u32>>,
}

impl From<&StressMapData> for StressMapReport {
    fn from(data: &StressMapData) -> Self {
        Self {
            total_defects: data.total_defects,
            max_count: data.max_count,
            grid_counts: data.count_rows(),
        }
    }
}

pub(crate) fn matrix_rows<T: nalgebra::Scalar + Copy>(m: &DMatrix<T>) -> Vec<Vec<T>> {
    (0..m.nrows())
        .map(|r| (0..m.ncols()).map(|c| m[(r, c)]).collect())
        .collect()
}

/// Hover text for one cell: total, top types by count (ties alphabetical),
/// and a remainder marker when more types contribute.
fn cell_hover_text(total: u32, type_counts: &BTreeMap<&str, u32>) -> String {
    let mut ranked: Vec<(&str, u32)> = type_counts.iter().map(|(t, c)| (*t, *c)).collect();
    // BTreeMap order is alphabetical; stable sort keeps it for equal counts
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let mut lines = vec![format!("Total: {}", total)];
    lines.extend(
        ranked
            .iter()
            .take(TOP_TYPES)
            .map(|(t, c)| format!("{}: {}", t, c)),
    );
    if ranked.len() > TOP_TYPES {
        lines.push(format!("... (+{} more types)", ranked.len() - TOP_TYPES));
    }
    lines.join("\n")
}

/// Aggregate pre-filtered defects onto the grid.
///
/// Rows outside the grid are ignored.
pub fn aggregate_stress_data_from<'a, I>(defects: I, grid: &PanelGrid) -> StressMapData
where
    I: IntoIterator<Item = &'a PlacedDefect>,
{
    let mut data = StressMapData::empty(grid);
    let mut per_cell: BTreeMap<(usize, usize), BTreeMap<&str, u32>> = BTreeMap::new();

    for defect in defects {
        let (x, y) = (defect.unit_x(), defect.unit_y());
        if !grid.contains(x, y) {
            continue;
        }
        let (x, y) = (x as usize, y as usize);
        data.grid_counts[(y, x)] += 1;
        *per_cell
            .entry((y, x))
            .or_default()
            .entry(defect.defect_type())
            .or_insert(0) += 1;
    }

    for (&(y, x), types) in &per_cell {
        data.hover_text[(y, x)] = cell_hover_text(data.grid_counts[(y, x)], types);
    }

    data.total_defects = data.grid_counts.iter().sum();
    data.max_count = data.grid_counts.iter().copied().max().unwrap_or(0);
    data
}

/// Aggregate true defects of the selected (layer, side) pairs.
///
/// Keys with no data are skipped; an empty selection yields an all-zero map.
pub fn aggregate_stress_data(
    panel: &PanelData,
    keys: &[LayerKey],
    grid: &PanelGrid,
    filter: &StressFilter,
    classifier: &DefectClassifier,
) -> StressMapData {
    let selected = panel
        .records_for(keys)
        .filter(|d| classifier.is_true_defect(d.verification()))
        .filter(|d| filter.matches(d));

    let data = aggregate_stress_data_from(selected, grid);
    tracing::debug!(
        "Stress map over {} keys: {} defects, max {} per unit",
        keys.len(),
        data.total_defects,
        data.max_count
    );
    data
}

/// Signed cell-wise difference between two stress maps
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaMapData {
    pub diff: DMatrix<i64>,

    /// Signed difference ("+2", "-1"); blank where the maps agree
    pub text: DMatrix<String>,
}

impl DeltaMapData {
    /// Difference of two maps already known to share a shape
    fn between(a: &StressMapData, b: &StressMapData) -> Self {
        let diff: DMatrix<i64> = a
            .grid_counts
            .zip_map(&b.grid_counts, |x, y| i64::from(x) - i64::from(y));
        let text = diff.map(|d| if d == 0 { String::new() } else { format!("{:+}", d) });
        Self { diff, text }
    }

    pub fn diff_at(&self, x: usize, y: usize) -> Option<i64> {
        self.diff.get((y, x)).copied()
    }

    pub fn text_at(&self, x: usize, y: usize) -> Option<&str> {
        self.text.get((y, x)).map(String::as_str)
    }

    /// Largest absolute difference, for a symmetric color scale
    pub fn max_abs(&self) -> i64 {
        self.diff.iter().map(|d| d.abs()).max().unwrap_or(0)
    }

    pub fn diff_rows(&self) -> Vec<Vec<i64>> {
        matrix_rows(&self.diff)
    }
}

/// Compute `a - b` per cell
pub fn aggregate_delta(a: &StressMapData, b: &StressMapData) -> Result<DeltaMapData, AnalyticsError> {
    if a.shape() != b.shape() {
        return Err(AnalyticsError::ShapeMismatch {
            left: a.shape(),
            right: b.shape(),
        });
    }

    Ok(DeltaMapData::between(a, b))
}

/// How a stress view combines the selected layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StressMode {
    /// Sum of every selected (layer, side)
    #[default]
    Cumulative,
    /// Front-side total minus back-side total
    Delta,
}

/// Result of a stress view request
#[derive(Debug, Clone, PartialEq)]
pub enum StressView {
    Cumulative(StressMapData),
    Delta {
        front: StressMapData,
        back: StressMapData,
        delta: DeltaMapData,
    },
}

/// Build a stress view in the requested mode
pub fn build_stress_view(
    panel: &PanelData,
    keys: &[LayerKey],
    grid: &PanelGrid,
    filter: &StressFilter,
    classifier: &DefectClassifier,
    mode: StressMode,
) -> StressView {
    match mode {
        StressMode::Cumulative => {
            StressView::Cumulative(aggregate_stress_data(panel, keys, grid, filter, classifier))
        }
        StressMode::Delta => {
            let (front_keys, back_keys): (Vec<LayerKey>, Vec<LayerKey>) =
                keys.iter().copied().partition(|k| k.side == Side::Front);
            let front = aggregate_stress_data(panel, &front_keys, grid, filter, classifier);
            let back = aggregate_stress_data(panel, &back_keys, grid, filter, classifier);
            let delta = DeltaMapData::between(&front, &back);
            StressView::Delta { front, back, delta }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::entities::defect::DefectRecord;
    use crate::entities::layer::BuildUpLayer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid() -> PanelGrid {
        PanelGrid::new(2, 2).unwrap()
    }

    fn panel_with(layers: Vec<(i32, Side, Vec<DefectRecord>)>) -> PanelData {
        let config = Config::default();
        let ctx = config.geometry().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut panel = PanelData::new();
        for (num, side, records) in layers {
            panel.add_layer(BuildUpLayer::with_rng(num, side, records, &ctx, grid(), &mut rng));
        }
        panel
    }

    fn all_keys(panel: &PanelData) -> Vec<LayerKey> {
        panel.keys()
    }

    #[test]
    fn test_single_true_defect() {
        let panel = panel_with(vec![(
            1,
            Side::Front,
            vec![DefectRecord::new(0, 0, "Short").with_verification("T")],
        )]);
        let data = aggregate_stress_data(
            &panel,
            &all_keys(&panel),
            &grid(),
            &StressFilter::default(),
            &DefectClassifier::default(),
        );

        assert_eq!(data.shape(), (4, 4));
        assert_eq!(data.count_at(0, 0), Some(1));
        assert_eq!(data.total_defects, 1);
        assert_eq!(data.max_count, 1);
        assert!(data.hover_at(0, 0).unwrap().contains("Total: 1"));
        assert_eq!(data.hover_at(1, 0), Some(NO_DEFECTS));
    }

    #[test]
    fn test_safe_verification_excluded() {
        let panel = panel_with(vec![(
            1,
            Side::Front,
            vec![DefectRecord::new(0, 0, "Short").with_verification("N")],
        )]);
        let data = aggregate_stress_data(
            &panel,
            &all_keys(&panel),
            &grid(),
            &StressFilter::default(),
            &DefectClassifier::default(),
        );
        assert_eq!(data.total_defects, 0);
        assert_eq!(data.hover_at(0, 0), Some(NO_DEFECTS));
    }

    #[test]
    fn test_hover_text_ranking_and_remainder() {
        let records = vec![
            DefectRecord::new(1, 1, "Short"),
            DefectRecord::new(1, 1, "Short"),
            DefectRecord::new(1, 1, "Nick"),
            DefectRecord::new(1, 1, "Island"),
            DefectRecord::new(1, 1, "Cut"),
            DefectRecord::new(1, 1, "Cut"),
        ];
        let panel = panel_with(vec![(1, Side::Front, records)]);
        let data = aggregate_stress_data(
            &panel,
            &all_keys(&panel),
            &grid(),
            &StressFilter::default(),
            &DefectClassifier::default(),
        );

        insta::assert_snapshot!(
            data.hover_at(1, 1).unwrap(),
            @r"
        Total: 6
        Cut: 2
        Short: 2
        Island: 1
        ... (+1 more types)
        "
        );
    }

    #[test]
    fn test_out_of_bounds_rows_ignored() {
        let records = vec![
            DefectRecord::new(4, 0, "Short"),
            DefectRecord::new(0, -1, "Short"),
            DefectRecord::new(3, 3, "Short"),
        ];
        let panel = panel_with(vec![(1, Side::Back, records)]);
        let data = aggregate_stress_data(
            &panel,
            &all_keys(&panel),
            &grid(),
            &StressFilter::default(),
            &DefectClassifier::default(),
        );
        assert_eq!(data.total_defects, 1);
        assert_eq!(data.count_at(3, 3), Some(1));
    }

    #[test]
    fn test_back_side_binned_by_raw_index() {
        let panel = panel_with(vec![(1, Side::Back, vec![DefectRecord::new(3, 0, "Nick")])]);
        let data = aggregate_stress_data(
            &panel,
            &all_keys(&panel),
            &grid(),
            &StressFilter::default(),
            &DefectClassifier::default(),
        );
        assert_eq!(data.count_at(3, 0), Some(1));
        assert_eq!(data.count_at(0, 0), Some(0));
    }

    #[test]
    fn test_quadrant_and_verification_filters() {
        let records = vec![
            DefectRecord::new(0, 0, "Short").with_verification("CU18"),
            DefectRecord::new(3, 0, "Short").with_verification("CU18"),
            DefectRecord::new(3, 1, "Nick").with_verification("cu22"),
        ];
        let panel = panel_with(vec![(1, Side::Front, records)]);
        let keys = all_keys(&panel);
        let classifier = DefectClassifier::default();

        let q2 = StressFilter {
            quadrant: Some(Quadrant::Q2),
            ..StressFilter::default()
        };
        let data = aggregate_stress_data(&panel, &keys, &grid(), &q2, &classifier);
        assert_eq!(data.total_defects, 2);

        let cu22 = StressFilter {
            verification: vec!["CU22".to_string()],
            quadrant: None,
        };
        let data = aggregate_stress_data(&panel, &keys, &grid(), &cu22, &classifier);
        assert_eq!(data.total_defects, 1);
        assert_eq!(data.count_at(3, 1), Some(1));
    }

    #[test]
    fn test_empty_selection_is_zero_map() {
        let panel = PanelData::new();
        let data = aggregate_stress_data(
            &panel,
            &[LayerKey::new(1, Side::Front)],
            &grid(),
            &StressFilter::default(),
            &DefectClassifier::default(),
        );
        assert_eq!(data, StressMapData::empty(&grid()));
        assert!(data.hover_text.iter().all(|t| t == NO_DEFECTS));
    }

    #[test]
    fn test_delta_map() {
        let panel = panel_with(vec![
            (
                1,
                Side::Front,
                vec![DefectRecord::new(0, 0, "Nick"), DefectRecord::new(0, 0, "Nick")],
            ),
            (
                1,
                Side::Back,
                vec![DefectRecord::new(0, 0, "Nick"), DefectRecord::new(2, 1, "Cut")],
            ),
        ]);
        let view = build_stress_view(
            &panel,
            &all_keys(&panel),
            &grid(),
            &StressFilter::default(),
            &DefectClassifier::default(),
            StressMode::Delta,
        );

        let StressView::Delta { front, back, delta } = view else {
            panic!("expected delta view");
        };
        assert_eq!(front.total_defects, 2);
        assert_eq!(back.total_defects, 2);
        assert_eq!(delta.diff_at(0, 0), Some(1));
        assert_eq!(delta.text_at(0, 0), Some("+1"));
        assert_eq!(delta.diff_at(2, 1), Some(-1));
        assert_eq!(delta.text_at(2, 1), Some("-1"));
        assert_eq!(delta.text_at(1, 1), Some(""));
        assert_eq!(delta.max_abs(), 1);
        assert_eq!(aggregate_delta(&front, &back).unwrap(), delta);
    }

    #[test]
    fn test_delta_shape_mismatch() {
        let a = StressMapData::empty(&PanelGrid::new(2, 2).unwrap());
        let b = StressMapData::empty(&PanelGrid::new(3, 2).unwrap());
        let err = aggregate_delta(&a, &b).unwrap_err();
        assert!(matches!(err, AnalyticsError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_accessors_off_grid() {
        let data = StressMapData::empty(&grid());
        assert_eq!(data.count_at(3, 3), Some(0));
        assert_eq!(data.count_at(4, 0), None);
        assert_eq!(data.hover_at(0, 4), None);

        let delta = aggregate_delta(&data, &data).unwrap();
        assert_eq!(delta.diff_at(3, 3), Some(0));
        assert_eq!(delta.diff_at(usize::MAX, 0), None);
        assert_eq!(delta.text_at(0, 9), None);
    }

    #[test]
    fn test_cumulative_view() {
        let panel = panel_with(vec![
            (1, Side::Front, vec![DefectRecord::new(0, 0, "Nick")]),
            (2, Side::Back, vec![DefectRecord::new(0, 0, "Nick")]),
        ]);
        let view = build_stress_view(
            &panel,
            &all_keys(&panel),
            &grid(),
            &StressFilter::default(),
            &DefectClassifier::default(),
            StressMode::Cumulative,
        );
        match view {
            StressView::Cumulative(data) => assert_eq!(data.count_at(0, 0), Some(2)),
            StressView::Delta { .. } => panic!("expected cumulative view"),
        }
    }
}
