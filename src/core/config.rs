//! Panel configuration
//!
//! Physical constants for the inspection frame plus the one explicit
//! configuration value that is handed to the geometry engine, the classifier
//! and the ingestion boundary. Nothing here is read from process-wide state.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::geometry::{self, GeometryContext, GeometryError, PanelGrid};
use crate::core::verification::DefectClassifier;

// --- Physical constants (mm) ---

/// Total frame width of the physical panel
pub const FRAME_WIDTH: f64 = 510.0;

/// Total frame height of the physical panel
pub const FRAME_HEIGHT: f64 = 515.0;

/// Fixed outer margins
pub const DEFAULT_OFFSET_X: f64 = 13.5;
pub const DEFAULT_OFFSET_Y: f64 = 15.0;

/// Fixed gap between quadrants
pub const DEFAULT_GAP_X: f64 = 3.0;
pub const DEFAULT_GAP_Y: f64 = 3.0;

/// Default user-adjustable dynamic gaps
pub const DYNAMIC_GAP_X: f64 = 5.0;
pub const DYNAMIC_GAP_Y: f64 = 3.5;

/// Units per quadrant
pub const DEFAULT_PANEL_ROWS: u32 = 6;
pub const DEFAULT_PANEL_COLS: u32 = 6;

/// Gap between neighbouring units inside a quadrant
pub const INTER_UNIT_GAP: f64 = 0.25;

/// Verification codes that mark a candidate as a non-defect.
///
/// Anything not in this list counts against yield. Comparison is
/// case-insensitive and ignores surrounding whitespace.
pub const SAFE_VERIFICATION_VALUES: &[&str] = &["GE57", "N", "TA", "FALSE", "FALSE ALARM", "F"];

/// Errors raised while loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {message}")]
    YamlError { message: String },
}

/// Frame dimensions shared by every layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub width: f64,
    pub height: f64,
    pub inter_unit_gap: f64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            inter_unit_gap: INTER_UNIT_GAP,
        }
    }
}

/// Grid resolution, margins and gaps of one panel layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Unit rows per quadrant
    pub panel_rows: u32,

    /// Unit columns per quadrant
    pub panel_cols: u32,

    pub fixed_offset_x: f64,
    pub fixed_offset_y: f64,
    pub fixed_gap_x: f64,
    pub fixed_gap_y: f64,

    /// User-adjustable gap added around every quadrant edge
    pub dyn_gap_x: f64,
    pub dyn_gap_y: f64,

    /// Cosmetic shift applied by renderers only
    pub visual_origin_x: f64,
    pub visual_origin_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            panel_rows: DEFAULT_PANEL_ROWS,
            panel_cols: DEFAULT_PANEL_COLS,
            fixed_offset_x: DEFAULT_OFFSET_X,
            fixed_offset_y: DEFAULT_OFFSET_Y,
            fixed_gap_x: DEFAULT_GAP_X,
            fixed_gap_y: DEFAULT_GAP_Y,
            dyn_gap_x: DYNAMIC_GAP_X,
            dyn_gap_y: DYNAMIC_GAP_Y,
            visual_origin_x: 0.0,
            visual_origin_y: 0.0,
        }
    }
}

/// Verification (true/false defect) settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub safe_values: Vec<String>,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            safe_values: SAFE_VERIFICATION_VALUES
                .iter()
                .map(|v| v.to_string())
                .collect(),
        }
    }
}

/// Complete configuration value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub frame: FrameConfig,
    pub layout: LayoutConfig,
    pub verification: VerificationConfig,
}

impl Config {
    /// Parse a configuration from YAML. Missing keys fall back to defaults.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        serde_yml::from_str(contents).map_err(|e| ConfigError::YamlError {
            message: e.to_string(),
        })
    }

    /// Load a configuration file from disk
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&contents)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Unit grid described by this configuration
    pub fn grid(&self) -> Result<PanelGrid, GeometryError> {
        PanelGrid::new(self.layout.panel_rows, self.layout.panel_cols)
    }

    /// Derive the panel geometry for this configuration
    pub fn geometry(&self) -> Result<GeometryContext, GeometryError> {
        geometry::calculate_layout(&self.frame, &self.layout)
    }

    /// Classifier using the configured safe verification values
    pub fn classifier(&self) -> DefectClassifier {
        DefectClassifier::new(&self.verification.safe_values)
    }
}
