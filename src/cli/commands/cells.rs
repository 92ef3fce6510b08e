//! `panelmap cells` command - unique defective units across the stack

use console::style;
use miette::Result;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::analytics::yield_analysis::{
    get_true_defect_coordinates, still_alive_summary, AliveSummary, CellFilter,
};
use crate::cli::args::DataArgs;
use crate::cli::filters::SideFilter;
use crate::cli::helpers::{format_pct, load_session, print_json, truncate_str};
use crate::cli::output::heading;
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct CellsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Layers to ignore
    #[arg(long, value_delimiter = ',')]
    pub exclude_layer: Vec<i32>,

    /// Verification codes to ignore
    #[arg(long, value_delimiter = ',')]
    pub exclude_verification: Vec<String>,

    /// Sides to include
    #[arg(long, short = 's', default_value = "both")]
    pub side: SideFilter,

    /// Maximum summary width in the table
    #[arg(long, default_value_t = 40)]
    pub wrap: usize,
}

#[derive(Serialize, Tabled)]
struct CellRow {
    #[tabled(rename = "X")]
    x: i32,
    #[tabled(rename = "Y")]
    y: i32,
    #[tabled(rename = "FIRST KILLER")]
    first_killer_layer: i32,
    #[tabled(rename = "LAYERS")]
    defect_summary: String,
}

#[derive(Serialize)]
struct CellsReport {
    cells: Vec<CellRow>,
    alive: AliveSummary,
}

pub fn run(args: CellsArgs, global: &GlobalOpts) -> Result<()> {
    let session = load_session(global, &args.data)?;

    let filter = CellFilter::default()
        .exclude_layers(args.exclude_layer.iter().copied())
        .exclude_verification(&args.exclude_verification)
        .sides(args.side.sides());

    let cells = get_true_defect_coordinates(&session.panel, &session.classifier, &filter);
    let alive = still_alive_summary(&session.grid, &cells);

    let rows: Vec<CellRow> = cells
        .into_iter()
        .map(|((x, y), cell)| CellRow {
            x,
            y,
            first_killer_layer: cell.first_killer_layer,
            defect_summary: cell.defect_summary,
        })
        .collect();

    if global.format == OutputFormat::Json {
        return print_json(&CellsReport { cells: rows, alive });
    }

    if rows.is_empty() {
        println!("{} No defective units", style("✓").green());
    } else {
        heading("Defective units (physical X, front view)");
        let display: Vec<CellRow> = rows
            .into_iter()
            .map(|r| CellRow {
                defect_summary: truncate_str(&r.defect_summary, args.wrap),
                ..r
            })
            .collect();
        let mut table = Table::new(&display);
        table.with(Style::rounded());
        println!("{}", table);
    }

    println!(
        "{} of {} units alive ({})",
        style(alive.alive_units).green(),
        alive.total_units,
        format_pct(alive.yield_pct)
    );
    Ok(())
}
