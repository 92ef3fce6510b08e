//! Filter enums shared by analysis commands

use clap::ValueEnum;

use crate::core::geometry::Quadrant;
use crate::entities::defect::Side;

/// Side filter for layer selection
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum SideFilter {
    /// Front side only
    Front,
    /// Back side only
    Back,
    /// Both sides - default
    #[default]
    Both,
}

impl SideFilter {
    pub fn matches(&self, side: Side) -> bool {
        match self {
            SideFilter::Front => side == Side::Front,
            SideFilter::Back => side == Side::Back,
            SideFilter::Both => true,
        }
    }

    /// Sides selected by this filter
    pub fn sides(&self) -> Vec<Side> {
        Side::ALL.into_iter().filter(|s| self.matches(*s)).collect()
    }
}

impl std::fmt::Display for SideFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SideFilter::Front => write!(f, "front"),
            SideFilter::Back => write!(f, "back"),
            SideFilter::Both => write!(f, "both"),
        }
    }
}

/// Quadrant filter
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum QuadrantFilter {
    /// Whole panel - default
    #[default]
    All,
    Q1,
    Q2,
    Q3,
    Q4,
}

impl QuadrantFilter {
    /// The selected quadrant, `None` for the whole panel
    pub fn quadrant(&self) -> Option<Quadrant> {
        match self {
            QuadrantFilter::All => None,
            QuadrantFilter::Q1 => Some(Quadrant::Q1),
            QuadrantFilter::Q2 => Some(Quadrant::Q2),
            QuadrantFilter::Q3 => Some(Quadrant::Q3),
            QuadrantFilter::Q4 => Some(Quadrant::Q4),
        }
    }

    pub fn matches(&self, quadrant: Quadrant) -> bool {
        self.quadrant().map_or(true, |q| q == quadrant)
    }
}

impl std::fmt::Display for QuadrantFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.quadrant() {
            Some(q) => write!(f, "{}", q),
            None => write!(f, "all"),
        }
    }
}
