//! Aggregation engine - grid, layer-stack and population statistics

pub mod pareto;
pub mod stress;
pub mod yield_analysis;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    #[error("Stress maps have different shapes: {left:?} vs {right:?}")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },
}

pub use pareto::{defect_pareto, quadrant_summary, ParetoEntry, ParetoGroup, QuadrantSummary};
pub use stress::{
    aggregate_delta, aggregate_stress_data, aggregate_stress_data_from, build_stress_view,
    DeltaMapData, StressFilter, StressMapData, StressMapReport, StressMode, StressView, NO_DEFECTS,
};
pub use yield_analysis::{
    calculate_yield_killers, cross_section_matrix, get_true_defect_coordinates,
    still_alive_summary, AliveSummary, CellFilter, CrossSection, DefectiveCell, SideBias,
    SliceAxis, YieldKillerMetrics,
};
