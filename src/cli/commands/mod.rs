//! CLI command implementations

pub mod cells;
pub mod geometry;
pub mod kpi;
pub mod pareto;
pub mod slice;
pub mod stress;
