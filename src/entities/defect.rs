//! Defect record entity - one inspection hit on one panel unit

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a side code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid side '{0}'. Must be 'F' or 'B'")]
pub struct SideParseError(pub String);

/// Inspected side of a build-up layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "F")]
    Front,
    #[serde(rename = "B")]
    Back,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Front, Side::Back];

    /// Single-letter code used in inspection files ("F" / "B")
    pub fn code(self) -> &'static str {
        match self {
            Side::Front => "F",
            Side::Back => "B",
        }
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Side::Front => "Front",
            Side::Back => "Back",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Side {
    type Err = SideParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "F" | "FRONT" => Ok(Side::Front),
            "B" | "BACK" => Ok(Side::Back),
            _ => Err(SideParseError(s.to_string())),
        }
    }
}

/// Identifies one inspected (layer, side) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LayerKey {
    pub layer_num: i32,
    pub side: Side,
}

impl LayerKey {
    pub fn new(layer_num: i32, side: Side) -> Self {
        Self { layer_num, side }
    }
}

impl std::fmt::Display for LayerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BU-{:02}{}", self.layer_num, self.side.code())
    }
}

/// A single raw inspection record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defect_id: Option<i64>,

    pub layer_num: i32,

    pub side: Side,

    /// Raw unit column, `0..2*cols`
    pub unit_index_x: i32,

    /// Raw unit row, `0..2*rows`
    pub unit_index_y: i32,

    pub defect_type: String,

    /// Verification outcome; `None` when the record was never verified
    #[serde(default)]
    pub verification: Option<String>,

    /// Absolute position in microns, relative to the panel origin
    #[serde(default)]
    pub x_coordinates: Option<f64>,

    #[serde(default)]
    pub y_coordinates: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl DefectRecord {
    /// Create an unverified front-side record on layer 1 without coordinates
    pub fn new(unit_index_x: i32, unit_index_y: i32, defect_type: impl Into<String>) -> Self {
        Self {
            defect_id: None,
            layer_num: 1,
            side: Side::Front,
            unit_index_x,
            unit_index_y,
            defect_type: defect_type.into(),
            verification: None,
            x_coordinates: None,
            y_coordinates: None,
            source_file: None,
        }
    }

    /// Place the record on a layer and side
    pub fn on(mut self, layer_num: i32, side: Side) -> Self {
        self.layer_num = layer_num;
        self.side = side;
        self
    }

    pub fn with_verification(mut self, verification: impl Into<String>) -> Self {
        self.verification = Some(verification.into());
        self
    }

    /// Attach absolute coordinates in microns
    pub fn with_coordinates(mut self, x_um: f64, y_um: f64) -> Self {
        self.x_coordinates = Some(x_um);
        self.y_coordinates = Some(y_um);
        self
    }

    pub fn with_id(mut self, defect_id: i64) -> Self {
        self.defect_id = Some(defect_id);
        self
    }

    pub fn key(&self) -> LayerKey {
        LayerKey::new(self.layer_num, self.side)
    }

    /// Absolute position in mm when both coordinates are present and finite
    pub fn absolute_mm(&self) -> Option<(f64, f64)> {
        match (self.x_coordinates, self.y_coordinates) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((x / 1000.0, y / 1000.0)),
            _ => None,
        }
    }
}
