//! Core module - configuration, panel geometry, layout and classification

pub mod config;
pub mod geometry;
pub mod layout;
pub mod verification;

pub use config::{Config, ConfigError};
pub use geometry::{calculate_layout, GeometryContext, GeometryError, PanelGrid, Quadrant};
pub use layout::{apply_layout, place_defect};
pub use verification::{normalize_verification, DefectClassifier, Verified};
