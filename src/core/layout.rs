//! Coordinate transformer
//!
//! Enriches raw defect records with their quadrant, plotting coordinates and
//! side-aware physical indices for a given [`GeometryContext`].
//!
//! Two coordinate families are produced:
//! - raw (`plot_x`, `plot_y`, `physical_plot_x_raw`): the unit as inspected
//! - flipped (`physical_plot_x_flipped`): back-side units mirrored onto the
//!   front-side physical location, for stacked multi-layer views

use rand::Rng;

use crate::core::geometry::{GeometryContext, PanelGrid};
use crate::entities::defect::DefectRecord;
use crate::entities::layer::PlacedDefect;

/// Fraction of a cell left empty on each side of the jitter band
const JITTER_MARGIN: f64 = 0.1;

/// Fraction of a cell covered by the jitter band
const JITTER_SPAN: f64 = 0.8;

/// Draw an intra-cell offset covering the inner 80% of a unit cell
pub fn sample_jitter<R: Rng>(ctx: &GeometryContext, rng: &mut R) -> (f64, f64) {
    let u: f64 = rng.random();
    let v: f64 = rng.random();
    (
        u * ctx.cell_width * JITTER_SPAN + ctx.cell_width * JITTER_MARGIN,
        v * ctx.cell_height * JITTER_SPAN + ctx.cell_height * JITTER_MARGIN,
    )
}

/// Panel-relative X of the left edge of a unit column
fn grid_x(ctx: &GeometryContext, grid: &PanelGrid, index: i32) -> f64 {
    let cols = grid.cols() as i32;
    let local = index.rem_euclid(cols) as f64;
    let shift = if index >= cols { ctx.quadrant_shift_x() } else { 0.0 };
    ctx.inter_unit_gap + local * ctx.stride_x + shift
}

/// Panel-relative Y of the top edge of a unit row
fn grid_y(ctx: &GeometryContext, grid: &PanelGrid, index: i32) -> f64 {
    let rows = grid.rows() as i32;
    let local = index.rem_euclid(rows) as f64;
    let shift = if index >= rows { ctx.quadrant_shift_y() } else { 0.0 };
    ctx.inter_unit_gap + local * ctx.stride_y + shift
}

/// Place one record using a precomputed jitter.
///
/// Absolute micron coordinates, when present, are authoritative and the
/// jitter is ignored. In that case the flipped physical X reuses the raw
/// absolute X unchanged: only the unit index is mirrored, never the measured
/// coordinate.
pub fn place_defect(
    record: DefectRecord,
    ctx: &GeometryContext,
    grid: &PanelGrid,
    jitter: (f64, f64),
) -> PlacedDefect {
    let x = record.unit_index_x;
    let y = record.unit_index_y;

    let quadrant = grid.quadrant_of(x, y);
    let physical_x_raw = x;
    let physical_x_flipped = grid.mirror_x(x, record.side);

    let (plot_x, plot_y, physical_plot_x_raw, physical_plot_x_flipped) =
        match record.absolute_mm() {
            Some((abs_x, abs_y)) => (abs_x, abs_y, abs_x, abs_x),
            None => {
                let (jx, jy) = jitter;
                (
                    grid_x(ctx, grid, x) + jx,
                    grid_y(ctx, grid, y) + jy,
                    grid_x(ctx, grid, physical_x_raw) + jx,
                    grid_x(ctx, grid, physical_x_flipped) + jx,
                )
            }
        };

    PlacedDefect {
        record,
        quadrant,
        plot_x,
        plot_y,
        physical_x_raw,
        physical_x_flipped,
        physical_plot_x_raw,
        physical_plot_x_flipped,
    }
}

/// Enrich a batch of records.
///
/// Jitter is drawn from `rng` only for records placed on the grid, so a
/// seeded source gives reproducible coordinates.
pub fn apply_layout<R: Rng>(
    records: Vec<DefectRecord>,
    ctx: &GeometryContext,
    grid: &PanelGrid,
    rng: &mut R,
) -> Vec<PlacedDefect> {
    let mut spatial = 0usize;
    let placed: Vec<PlacedDefect> = records
        .into_iter()
        .map(|record| {
            let jitter = if record.absolute_mm().is_some() {
                spatial += 1;
                (0.0, 0.0)
            } else {
                sample_jitter(ctx, rng)
            };
            place_defect(record, ctx, grid, jitter)
        })
        .collect();

    tracing::debug!(
        "Placed {} defects ({} from absolute coordinates, {} on grid)",
        placed.len(),
        spatial,
        placed.len() - spatial
    );
    placed
}
