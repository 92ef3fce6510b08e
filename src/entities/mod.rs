//! Entity type definitions

pub mod defect;
pub mod layer;
pub mod panel;

pub use defect::{DefectRecord, LayerKey, Side, SideParseError};
pub use layer::{BuildUpLayer, PlacedDefect};
pub use panel::PanelData;
