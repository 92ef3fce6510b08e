//! panelmap: panel defect inspection analytics
//!
//! Maps per-unit inspection records of a multi-layer panel onto its physical
//! layout and reduces them to stress maps, layer-stack cross-sections and
//! yield KPIs.

pub mod analytics;
pub mod cli;
pub mod core;
pub mod entities;
pub mod io;
