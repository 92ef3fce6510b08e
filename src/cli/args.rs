//! Top-level CLI definition

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    cells::CellsArgs, geometry::GeometryArgs, kpi::KpiArgs, pareto::ParetoArgs, slice::SliceArgs,
    stress::StressArgs,
};
use crate::io::sample::DEFAULT_SEED;

#[derive(Parser, Debug)]
#[command(
    name = "panelmap",
    version,
    about = "Panel defect inspection analytics",
    long_about = "Maps per-unit inspection records of a multi-layer build-up panel onto its \
                  physical layout and reports stress maps, layer-stack cross-sections and yield KPIs.\n\n\
                  Input files are CSV exports named after their layer and side, e.g. BU-01F.csv."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Layout/verification configuration file (YAML)
    #[arg(long, short = 'c', global = true, env = "PANELMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the derived panel geometry
    Geometry(GeometryArgs),

    /// Aggregate true defects per unit (cumulative or front/back delta)
    Stress(StressArgs),

    /// Yield-killer KPIs and still-alive summary
    Kpi(KpiArgs),

    /// Per-layer cross-section at one unit row or column
    Slice(SliceArgs),

    /// Unique defective units across the layer stack
    Cells(CellsArgs),

    /// Pareto of defect types or verification codes
    Pareto(ParetoArgs),
}

/// Grid and gap overrides applied on top of the configuration
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LayoutArgs {
    /// Unit rows per quadrant
    #[arg(long)]
    pub rows: Option<u32>,

    /// Unit columns per quadrant
    #[arg(long)]
    pub cols: Option<u32>,

    /// Dynamic horizontal gap (mm)
    #[arg(long)]
    pub dyn_gap_x: Option<f64>,

    /// Dynamic vertical gap (mm)
    #[arg(long)]
    pub dyn_gap_y: Option<f64>,
}

/// Where the inspection data comes from
#[derive(clap::Args, Debug, Clone)]
pub struct DataArgs {
    /// Inspection CSV files (BU-XXF / BU-XXB naming)
    #[arg(required_unless_present = "sample")]
    pub files: Vec<PathBuf>,

    /// Use generated sample data instead of files
    #[arg(long, conflicts_with = "files")]
    pub sample: bool,

    /// Seed for sample data and layout jitter
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    #[command(flatten)]
    pub layout: LayoutArgs,
}
