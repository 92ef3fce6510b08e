//! Synthetic panel data for demos and tests

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::core::geometry::{GeometryContext, PanelGrid};
use crate::entities::defect::{DefectRecord, Side};
use crate::entities::layer::BuildUpLayer;
use crate::entities::panel::PanelData;

/// Seed used when the caller does not choose one
pub const DEFAULT_SEED: u64 = 55;

/// Dataset identity of generated panels
pub const SAMPLE_PANEL_ID: &str = "sample_data";

/// Root-cause verification codes
pub const DEFECT_CODES: [&str; 21] = [
    "CU10", "CU14", "CU18", "CU17", "CU22", "CU16", "CU54", "CU25", "CU15", "CU94", "CU19",
    "CU20", "CU41", "CU80", "BM31", "BM01", "GE01", "GE32", "GE57", "HO31", "HO12",
];

pub const DEFECT_TYPES: [&str; 8] = [
    "Nick",
    "Short",
    "Cut",
    "Island",
    "Space",
    "Minimum Line",
    "Deformation",
    "Protrusion",
];

const FALSE_ALARMS: [&str; 2] = ["N", "FALSE"];

/// Half-open defect count range per generated layer
const LAYER_COUNTS: [(i32, (usize, usize)); 5] = [
    (1, (32, 40)),
    (2, (80, 120)),
    (3, (20, 24)),
    (4, (16, 32)),
    (5, (40, 80)),
];

/// Absolute micron position uniformly inside a unit cell
fn sample_position<R: Rng>(
    ctx: &GeometryContext,
    grid: &PanelGrid,
    x: i32,
    y: i32,
    rng: &mut R,
) -> (f64, f64) {
    let (cols, rows) = (grid.cols() as i32, grid.rows() as i32);
    let shift_x = if x >= cols { ctx.quadrant_shift_x() } else { 0.0 };
    let shift_y = if y >= rows { ctx.quadrant_shift_y() } else { 0.0 };

    let x_start = ctx.offset_x + shift_x + ctx.inter_unit_gap + (x % cols) as f64 * ctx.stride_x;
    let y_start = ctx.offset_y + shift_y + ctx.inter_unit_gap + (y % rows) as f64 * ctx.stride_y;

    let mm_x = x_start + rng.random::<f64>() * ctx.cell_width;
    let mm_y = y_start + rng.random::<f64>() * ctx.cell_height;
    (mm_x * 1000.0, mm_y * 1000.0)
}

fn generate_layer<R: Rng>(
    layer_num: i32,
    side: Side,
    (low, high): (usize, usize),
    false_alarm_rate: f64,
    ctx: &GeometryContext,
    grid: &PanelGrid,
    rng: &mut R,
) -> Vec<DefectRecord> {
    let count = rng.random_range(low..high);
    let (total_x, total_y) = (grid.total_cols() as i32, grid.total_rows() as i32);

    (0..count)
        .map(|i| {
            let x = rng.random_range(0..total_x);
            let y = rng.random_range(0..total_y);
            let (um_x, um_y) = sample_position(ctx, grid, x, y, rng);

            let defect_type = DEFECT_TYPES.choose(rng).copied().unwrap_or("Nick");
            let pool: &[&str] = if rng.random::<f64>() < false_alarm_rate {
                &FALSE_ALARMS
            } else {
                &DEFECT_CODES
            };
            let verification = pool.choose(rng).copied().unwrap_or("N");

            let mut record = DefectRecord::new(x, y, defect_type)
                .on(layer_num, side)
                .with_id(i as i64)
                .with_verification(verification)
                .with_coordinates(um_x, um_y);
            record.source_file = Some(format!("Sample Data Layer {}{}", layer_num, side.code()));
            record
        })
        .collect()
}

/// Generate a five-layer, two-sided sample panel.
///
/// The same seed, geometry and grid always give the same panel. Every record
/// carries absolute coordinates, so no layout jitter is drawn.
pub fn generate_sample_data(ctx: &GeometryContext, grid: PanelGrid, seed: u64) -> PanelData {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut panel = PanelData::with_id(SAMPLE_PANEL_ID);

    for (layer_num, range) in LAYER_COUNTS {
        let false_alarm_rate = rng.random_range(0.5..0.6);
        for side in Side::ALL {
            let records = generate_layer(layer_num, side, range, false_alarm_rate, ctx, &grid, &mut rng);
            panel.add_layer(BuildUpLayer::with_rng(layer_num, side, records, ctx, grid, &mut rng));
        }
    }

    tracing::debug!(
        "Generated sample panel (seed {}) with {} layers",
        seed,
        panel.len()
    );
    panel
}
