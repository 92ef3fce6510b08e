//! `panelmap kpi` command - yield-killer KPIs

use console::style;
use miette::Result;
use serde::Serialize;

use crate::analytics::yield_analysis::{
    calculate_yield_killers, get_true_defect_coordinates, still_alive_summary, AliveSummary,
    CellFilter, YieldKillerMetrics,
};
use crate::cli::args::DataArgs;
use crate::cli::helpers::{format_pct, load_session, print_json};
use crate::cli::output::{heading, kv_table};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct KpiArgs {
    #[command(flatten)]
    pub data: DataArgs,
}

#[derive(Serialize)]
struct KpiReport {
    yield_killers: Option<YieldKillerMetrics>,
    alive: AliveSummary,
}

pub fn run(args: KpiArgs, global: &GlobalOpts) -> Result<()> {
    let session = load_session(global, &args.data)?;

    let metrics = calculate_yield_killers(&session.panel, &session.classifier);
    let cells = get_true_defect_coordinates(&session.panel, &session.classifier, &CellFilter::default());
    let alive = still_alive_summary(&session.grid, &cells);

    if global.format == OutputFormat::Json {
        return print_json(&KpiReport {
            yield_killers: metrics,
            alive,
        });
    }

    heading("Yield killers");
    match metrics {
        Some(m) => {
            let pairs = vec![
                (
                    "Top killer layer",
                    format!("L{} ({} defects)", m.top_killer_layer, m.top_killer_count),
                ),
                (
                    "Worst unit",
                    format!(
                        "({}, {}) ({} defects)",
                        m.worst_unit.0, m.worst_unit.1, m.worst_unit_count
                    ),
                ),
                (
                    "Side bias",
                    format!("{} (diff {})", m.side_bias.label(), m.side_bias_diff),
                ),
            ];
            println!("{}", kv_table(&pairs));
        }
        None => println!("{} No true defects found", style("✓").green()),
    }

    heading("Still alive");
    let pairs = vec![
        ("Total units", alive.total_units.to_string()),
        ("Defective units", alive.defective_units.to_string()),
        ("Alive units", alive.alive_units.to_string()),
        ("Yield", format_pct(alive.yield_pct)),
    ];
    println!("{}", kv_table(&pairs));
    Ok(())
}
