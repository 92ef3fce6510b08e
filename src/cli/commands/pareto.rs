//! `panelmap pareto` command - defect Pareto and quadrant breakdown

use clap::ValueEnum;
use miette::Result;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::analytics::pareto::{defect_pareto, quadrant_summary, ParetoEntry, ParetoGroup, QuadrantSummary};
use crate::cli::args::DataArgs;
use crate::cli::filters::{QuadrantFilter, SideFilter};
use crate::cli::helpers::{format_pct, load_session, print_json, select_keys};
use crate::cli::output::heading;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::verification::Verified;
use crate::entities::layer::PlacedDefect;

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum GroupArg {
    /// Verification codes when present, otherwise defect types
    #[default]
    Auto,
    /// Defect type
    Type,
    /// Verification code
    Verification,
}

impl From<GroupArg> for ParetoGroup {
    fn from(group: GroupArg) -> Self {
        match group {
            GroupArg::Auto => ParetoGroup::Auto,
            GroupArg::Type => ParetoGroup::DefectType,
            GroupArg::Verification => ParetoGroup::Verification,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ParetoArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Layers to include (default: all)
    #[arg(long, short = 'l', value_delimiter = ',')]
    pub layer: Vec<i32>,

    /// Sides to include
    #[arg(long, short = 's', default_value = "both")]
    pub side: SideFilter,

    /// Restrict to one quadrant
    #[arg(long, short = 'q', default_value = "all")]
    pub quadrant: QuadrantFilter,

    /// Category to count by
    #[arg(long, short = 'b', default_value = "auto")]
    pub by: GroupArg,

    /// Count only true defects
    #[arg(long)]
    pub true_only: bool,
}

#[derive(Tabled)]
struct ParetoRow {
    #[tabled(rename = "CATEGORY")]
    category: String,
    #[tabled(rename = "COUNT")]
    count: usize,
    #[tabled(rename = "SHARE")]
    share: String,
    #[tabled(rename = "CUMULATIVE")]
    cumulative: String,
}

#[derive(Tabled)]
struct QuadrantRow {
    #[tabled(rename = "QUADRANT")]
    quadrant: String,
    #[tabled(rename = "COUNT")]
    count: usize,
    #[tabled(rename = "SHARE")]
    share: String,
}

#[derive(Serialize)]
struct ParetoReport {
    total: usize,
    pareto: Vec<ParetoEntry>,
    quadrants: Vec<QuadrantSummary>,
}

pub fn run(args: ParetoArgs, global: &GlobalOpts) -> Result<()> {
    let session = load_session(global, &args.data)?;
    let keys = select_keys(&session.panel, &args.layer, args.side);

    let defects: Vec<&PlacedDefect> = session
        .panel
        .records_for(&keys)
        .filter(|d| args.quadrant.matches(d.quadrant))
        .filter(|d| !args.true_only || session.classifier.is_true_defect(d.verification()))
        .collect();

    let pareto = defect_pareto(&defects, args.by.into());
    let quadrants = quadrant_summary(&defects);

    if global.format == OutputFormat::Json {
        return print_json(&ParetoReport {
            total: defects.len(),
            pareto,
            quadrants,
        });
    }

    heading(&format!("Pareto ({} defects)", defects.len()));
    let rows: Vec<ParetoRow> = pareto
        .iter()
        .map(|e| ParetoRow {
            category: e.category.clone(),
            count: e.count,
            share: format_pct(e.percent),
            cumulative: format_pct(e.cumulative_percent),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);

    heading("By quadrant");
    let rows: Vec<QuadrantRow> = quadrants
        .iter()
        .map(|q| QuadrantRow {
            quadrant: q.quadrant.to_string(),
            count: q.count,
            share: format_pct(q.percent),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    Ok(())
}
