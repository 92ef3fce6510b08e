//! Panel geometry engine
//!
//! Turns frame dimensions, margins and gaps into a [`GeometryContext`]: the
//! active panel size, quadrant and unit-cell sizes, strides and the origin of
//! every quadrant. Everything here is a pure function of its inputs.
//!
//! Layout of the frame along X (Y is symmetric):
//! ```text
//! | offset | dyn | Q1 (quad_width) | dyn | fixed_gap | dyn | Q2 (quad_width) | dyn | offset |
//!                                  |<-- effective_gap_x -->|
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::config::{FrameConfig, LayoutConfig};
use crate::entities::defect::Side;

/// Panel axis, used in error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "X"),
            Axis::Y => write!(f, "Y"),
        }
    }
}

/// Degenerate or invalid layout configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("Panel grid must have at least one row and one column per quadrant (got {rows}x{cols})")]
    EmptyGrid { rows: u32, cols: u32 },

    #[error("Layout parameter '{name}' must be a finite number (got {value})")]
    NonFinite { name: &'static str, value: f64 },

    #[error("Layout parameter '{name}' must not be negative (got {value} mm)")]
    Negative { name: &'static str, value: f64 },

    #[error("Active panel {axis} dimension is {value:.3} mm; offsets and gaps exceed the frame")]
    PanelTooSmall { axis: Axis, value: f64 },

    #[error("Unit cell {axis} dimension is {value:.3} mm; too many units for the quadrant size")]
    CellTooSmall { axis: Axis, value: f64 },
}

/// Panel quadrant
///
/// Q1 is the origin quadrant, Q2 lies to its right, Q3 below it and Q4
/// diagonally opposite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [Quadrant::Q1, Quadrant::Q2, Quadrant::Q3, Quadrant::Q4];

    fn index(self) -> usize {
        match self {
            Quadrant::Q1 => 0,
            Quadrant::Q2 => 1,
            Quadrant::Q3 => 2,
            Quadrant::Q4 => 3,
        }
    }

    /// True for quadrants in the right half of the panel
    pub fn is_right(self) -> bool {
        matches!(self, Quadrant::Q2 | Quadrant::Q4)
    }

    /// True for quadrants in the lower half of the panel
    pub fn is_lower(self) -> bool {
        matches!(self, Quadrant::Q3 | Quadrant::Q4)
    }
}

impl std::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quadrant::Q1 => write!(f, "Q1"),
            Quadrant::Q2 => write!(f, "Q2"),
            Quadrant::Q3 => write!(f, "Q3"),
            Quadrant::Q4 => write!(f, "Q4"),
        }
    }
}

impl std::str::FromStr for Quadrant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "Q1" => Ok(Quadrant::Q1),
            "Q2" => Ok(Quadrant::Q2),
            "Q3" => Ok(Quadrant::Q3),
            "Q4" => Ok(Quadrant::Q4),
            other => Err(format!("Unknown quadrant '{}'", other)),
        }
    }
}

/// Unit grid resolution: `rows` x `cols` units per quadrant.
///
/// The whole panel spans `2*cols` unit columns and `2*rows` unit rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PanelGrid {
    rows: u32,
    cols: u32,
}

impl PanelGrid {
    pub fn new(rows: u32, cols: u32) -> Result<Self, GeometryError> {
        if rows == 0 || cols == 0 {
            return Err(GeometryError::EmptyGrid { rows, cols });
        }
        Ok(Self { rows, cols })
    }

    /// Unit rows per quadrant
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Unit columns per quadrant
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Unit rows across the whole panel
    pub fn total_rows(&self) -> usize {
        2 * self.rows as usize
    }

    /// Unit columns across the whole panel
    pub fn total_cols(&self) -> usize {
        2 * self.cols as usize
    }

    /// Number of units on the panel
    pub fn total_units(&self) -> usize {
        self.total_rows() * self.total_cols()
    }

    /// Whether a raw unit index lies on the panel
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.total_cols() && (y as usize) < self.total_rows()
    }

    /// Quadrant of a raw unit index
    pub fn quadrant_of(&self, x: i32, y: i32) -> Quadrant {
        let right = x >= self.cols as i32;
        let lower = y >= self.rows as i32;
        match (right, lower) {
            (false, false) => Quadrant::Q1,
            (true, false) => Quadrant::Q2,
            (false, true) => Quadrant::Q3,
            (true, true) => Quadrant::Q4,
        }
    }

    /// Physical column of a unit as seen from the front side.
    ///
    /// Back-side inspection sees the panel mirrored, so its X index is
    /// reflected across the full panel width. Front-side indices pass through.
    /// Reflections beyond the `i32` range saturate and stay off the panel.
    pub fn mirror_x(&self, x: i32, side: Side) -> i32 {
        match side {
            Side::Front => x,
            Side::Back => {
                let mirrored = 2 * i64::from(self.cols) - 1 - i64::from(x);
                mirrored.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
            }
        }
    }
}

/// Derived dimensions and coordinate systems for one panel layout (mm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryContext {
    /// Active panel dimensions
    pub panel_width: f64,
    pub panel_height: f64,

    pub quad_width: f64,
    pub quad_height: f64,

    pub cell_width: f64,
    pub cell_height: f64,

    /// Cell size plus the inter-unit gap
    pub stride_x: f64,
    pub stride_y: f64,

    /// Visible separation between quadrants (fixed gap plus two dynamic gaps)
    pub effective_gap_x: f64,
    pub effective_gap_y: f64,

    /// Start of quadrant 1
    pub offset_x: f64,
    pub offset_y: f64,

    /// Top-left corner of Q1..Q4, relative to the frame origin
    pub quadrant_origins: [(f64, f64); 4],

    /// Additive cosmetic shift, never used by aggregation
    pub visual_origin_x: f64,
    pub visual_origin_y: f64,

    pub inter_unit_gap: f64,
}

impl GeometryContext {
    /// Top-left corner of a quadrant
    pub fn quadrant_origin(&self, quadrant: Quadrant) -> (f64, f64) {
        self.quadrant_origins[quadrant.index()]
    }

    /// Horizontal shift of the right half relative to the left half
    pub fn quadrant_shift_x(&self) -> f64 {
        self.quad_width + self.effective_gap_x
    }

    /// Vertical shift of the lower half relative to the upper half
    pub fn quadrant_shift_y(&self) -> f64 {
        self.quad_height + self.effective_gap_y
    }

    /// Centre of a unit cell in frame coordinates.
    ///
    /// Heatmaps are drawn on the fixed grid, so the visual origin is not applied.
    pub fn unit_center(&self, grid: &PanelGrid, x: i32, y: i32) -> (f64, f64) {
        let local_x = x.rem_euclid(grid.cols() as i32) as f64;
        let local_y = y.rem_euclid(grid.rows() as i32) as f64;
        let quadrant = grid.quadrant_of(x, y);
        let shift_x = if quadrant.is_right() { self.quadrant_shift_x() } else { 0.0 };
        let shift_y = if quadrant.is_lower() { self.quadrant_shift_y() } else { 0.0 };

        (
            self.offset_x + shift_x + self.inter_unit_gap + local_x * self.stride_x + self.cell_width / 2.0,
            self.offset_y + shift_y + self.inter_unit_gap + local_y * self.stride_y + self.cell_height / 2.0,
        )
    }

    /// Cosmetic shift as an (x, y) pair
    pub fn visual_shift(&self) -> (f64, f64) {
        (self.visual_origin_x, self.visual_origin_y)
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<(), GeometryError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::NonFinite { name, value })
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), GeometryError> {
    check_finite(name, value)?;
    if value < 0.0 {
        return Err(GeometryError::Negative { name, value });
    }
    Ok(())
}

fn validate_inputs(frame: &FrameConfig, layout: &LayoutConfig) -> Result<PanelGrid, GeometryError> {
    let grid = PanelGrid::new(layout.panel_rows, layout.panel_cols)?;

    check_non_negative("frame.width", frame.width)?;
    check_non_negative("frame.height", frame.height)?;
    check_non_negative("frame.inter_unit_gap", frame.inter_unit_gap)?;
    check_non_negative("fixed_offset_x", layout.fixed_offset_x)?;
    check_non_negative("fixed_offset_y", layout.fixed_offset_y)?;
    check_non_negative("fixed_gap_x", layout.fixed_gap_x)?;
    check_non_negative("fixed_gap_y", layout.fixed_gap_y)?;
    check_non_negative("dyn_gap_x", layout.dyn_gap_x)?;
    check_non_negative("dyn_gap_y", layout.dyn_gap_y)?;
    check_finite("visual_origin_x", layout.visual_origin_x)?;
    check_finite("visual_origin_y", layout.visual_origin_y)?;

    Ok(grid)
}

/// Calculate the complete layout context for a frame and layout configuration
///
/// ```text
/// panel_width  = frame_width - 2*fixed_offset_x - fixed_gap_x - 4*dyn_gap_x
/// quad_width   = panel_width / 2
/// cell_width   = (quad_width - (cols + 1)*inter_unit_gap) / cols
/// stride_x     = cell_width + inter_unit_gap
/// effective_gap_x = fixed_gap_x + 2*dyn_gap_x
/// offset_x     = fixed_offset_x + dyn_gap_x
/// ```
/// Heights follow the same rules. Configurations that leave no room for the
/// panel or its unit cells are rejected instead of producing negative sizes.
pub fn calculate_layout(
    frame: &FrameConfig,
    layout: &LayoutConfig,
) -> Result<GeometryContext, GeometryError> {
    let grid = validate_inputs(frame, layout)?;
    let gap = frame.inter_unit_gap;

    // Four dynamic gaps per axis: both outer margins and both sides of the
    // inter-quadrant gap.
    let panel_width =
        frame.width - 2.0 * layout.fixed_offset_x - layout.fixed_gap_x - 4.0 * layout.dyn_gap_x;
    let panel_height =
        frame.height - 2.0 * layout.fixed_offset_y - layout.fixed_gap_y - 4.0 * layout.dyn_gap_y;

    if panel_width <= 0.0 {
        return Err(GeometryError::PanelTooSmall { axis: Axis::X, value: panel_width });
    }
    if panel_height <= 0.0 {
        return Err(GeometryError::PanelTooSmall { axis: Axis::Y, value: panel_height });
    }

    let quad_width = panel_width / 2.0;
    let quad_height = panel_height / 2.0;

    let effective_gap_x = layout.fixed_gap_x + 2.0 * layout.dyn_gap_x;
    let effective_gap_y = layout.fixed_gap_y + 2.0 * layout.dyn_gap_y;

    let offset_x = layout.fixed_offset_x + layout.dyn_gap_x;
    let offset_y = layout.fixed_offset_y + layout.dyn_gap_y;

    let cols = grid.cols() as f64;
    let rows = grid.rows() as f64;
    let cell_width = (quad_width - (cols + 1.0) * gap) / cols;
    let cell_height = (quad_height - (rows + 1.0) * gap) / rows;

    if cell_width <= 0.0 {
        return Err(GeometryError::CellTooSmall { axis: Axis::X, value: cell_width });
    }
    if cell_height <= 0.0 {
        return Err(GeometryError::CellTooSmall { axis: Axis::Y, value: cell_height });
    }

    let right = offset_x + quad_width + effective_gap_x;
    let lower = offset_y + quad_height + effective_gap_y;

    Ok(GeometryContext {
        panel_width,
        panel_height,
        quad_width,
        quad_height,
        cell_width,
        cell_height,
        stride_x: cell_width + gap,
        stride_y: cell_height + gap,
        effective_gap_x,
        effective_gap_y,
        offset_x,
        offset_y,
        quadrant_origins: [
            (offset_x, offset_y),
            (right, offset_y),
            (offset_x, lower),
            (right, lower),
        ],
        visual_origin_x: layout.visual_origin_x,
        visual_origin_y: layout.visual_origin_y,
        inter_unit_gap: gap,
    })
}
