//! `panelmap stress` command - per-unit stress maps

use clap::ValueEnum;
use console::style;
use miette::Result;
use serde::Serialize;

use crate::analytics::stress::{
    build_stress_view, StressFilter, StressMapData, StressMapReport, StressMode, StressView, NO_DEFECTS,
};
use crate::cli::args::DataArgs;
use crate::cli::filters::{QuadrantFilter, SideFilter};
use crate::cli::helpers::{load_session, print_json, select_keys};
use crate::cli::output::{count_cells, grid_table, heading};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum ModeArg {
    /// Sum over every selected layer and side
    #[default]
    Cumulative,
    /// Front minus back
    Delta,
}

impl From<ModeArg> for StressMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Cumulative => StressMode::Cumulative,
            ModeArg::Delta => StressMode::Delta,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct StressArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Layers to include (default: all)
    #[arg(long, short = 'l', value_delimiter = ',')]
    pub layer: Vec<i32>,

    /// Sides to include
    #[arg(long, short = 's', default_value = "both")]
    pub side: SideFilter,

    /// Aggregation mode
    #[arg(long, short = 'm', default_value = "cumulative")]
    pub mode: ModeArg,

    /// Keep only these verification codes
    #[arg(long, value_delimiter = ',')]
    pub verification: Vec<String>,

    /// Restrict to one quadrant
    #[arg(long, short = 'q', default_value = "all")]
    pub quadrant: QuadrantFilter,

    /// List per-unit breakdowns for the hottest units
    #[arg(long)]
    pub hover: bool,
}

#[derive(Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
enum StressJson {
    Cumulative {
        #[serde(flatten)]
        map: StressMapReport,
    },
    Delta {
        front: StressMapReport,
        back: StressMapReport,
        delta: Vec<Vec<i64>>,
    },
}

pub fn run(args: StressArgs, global: &GlobalOpts) -> Result<()> {
    let session = load_session(global, &args.data)?;
    let keys = select_keys(&session.panel, &args.layer, args.side);
    let filter = StressFilter {
        verification: args.verification.clone(),
        quadrant: args.quadrant.quadrant(),
    };

    let view = build_stress_view(
        &session.panel,
        &keys,
        &session.grid,
        &filter,
        &session.classifier,
        args.mode.into(),
    );

    if global.format == OutputFormat::Json {
        let json = match &view {
            StressView::Cumulative(map) => StressJson::Cumulative { map: map.into() },
            StressView::Delta { front, back, delta } => StressJson::Delta {
                front: front.into(),
                back: back.into(),
                delta: delta.diff_rows(),
            },
        };
        return print_json(&json);
    }

    let selected: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    println!(
        "{} {} selected: {}",
        style("→").blue(),
        keys.len(),
        if selected.is_empty() {
            "none".to_string()
        } else {
            selected.join(", ")
        }
    );

    match view {
        StressView::Cumulative(map) => {
            print_map("Stress map (true defects per unit)", &map);
            if args.hover {
                print_hover(&map);
            }
        }
        StressView::Delta { front, back, delta } => {
            heading(&format!(
                "Delta map (front {} - back {})",
                front.total_defects, back.total_defects
            ));
            let rows: Vec<Vec<String>> = (0..delta.text.nrows())
                .map(|y| {
                    (0..delta.text.ncols())
                        .map(|x| match delta.text_at(x, y) {
                            None | Some("") => ".".to_string(),
                            Some(text) => text.to_string(),
                        })
                        .collect()
                })
                .collect();
            let max_abs = delta.max_abs();
            println!(
                "{}",
                grid_table(&rows, |x, y| max_abs > 0 && delta.diff_at(x, y).map(i64::abs) == Some(max_abs))
            );
            if args.hover {
                print_hover(&front);
                print_hover(&back);
            }
        }
    }
    Ok(())
}

fn print_map(title: &str, map: &StressMapData) {
    heading(title);
    let cells = count_cells(&map.count_rows());
    let max = map.max_count;
    println!(
        "{}",
        grid_table(&cells, |x, y| max > 0 && map.count_at(x, y) == Some(max))
    );
    println!(
        "Total: {}  Max per unit: {}",
        style(map.total_defects).cyan(),
        style(map.max_count).cyan()
    );
}

/// Number of units listed by `--hover`
const HOVER_UNITS: usize = 5;

fn print_hover(map: &StressMapData) {
    let (rows, cols) = map.shape();
    let mut units: Vec<(usize, usize, u32)> = (0..rows)
        .flat_map(|y| (0..cols).map(move |x| (x, y)))
        .map(|(x, y)| (x, y, map.count_at(x, y).unwrap_or(0)))
        .filter(|(_, _, c)| *c > 0)
        .collect();
    units.sort_by(|a, b| b.2.cmp(&a.2).then((a.0, a.1).cmp(&(b.0, b.1))));

    for (x, y, _) in units.into_iter().take(HOVER_UNITS) {
        println!("{}", style(format!("Unit ({}, {})", x, y)).bold());
        for line in map.hover_at(x, y).unwrap_or(NO_DEFECTS).lines() {
            println!("  {}", line);
        }
    }
}
