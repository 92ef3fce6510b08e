//! `panelmap geometry` command - show the derived panel layout

use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::args::LayoutArgs;
use crate::cli::helpers::{print_json, resolve_config, resolve_geometry};
use crate::cli::output::{heading, kv_table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::geometry::{GeometryContext, PanelGrid, Quadrant};

#[derive(clap::Args, Debug)]
pub struct GeometryArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,
}

#[derive(Serialize)]
struct GeometryReport<'a> {
    grid: PanelGrid,
    total_units: usize,
    geometry: &'a GeometryContext,
}

fn mm(value: f64) -> String {
    format!("{:.3} mm", value)
}

pub fn run(args: GeometryArgs, global: &GlobalOpts) -> Result<()> {
    let config = resolve_config(global, &args.layout)?;
    let (ctx, grid) = resolve_geometry(&config)?;

    match global.format {
        OutputFormat::Json => print_json(&GeometryReport {
            grid,
            total_units: grid.total_units(),
            geometry: &ctx,
        }),
        OutputFormat::Table => {
            heading(&format!(
                "Panel {}x{} units ({}x{} per quadrant)",
                grid.total_cols(),
                grid.total_rows(),
                grid.cols(),
                grid.rows()
            ));

            let pairs = vec![
                ("Panel width", mm(ctx.panel_width)),
                ("Panel height", mm(ctx.panel_height)),
                ("Quadrant width", mm(ctx.quad_width)),
                ("Quadrant height", mm(ctx.quad_height)),
                ("Cell width", mm(ctx.cell_width)),
                ("Cell height", mm(ctx.cell_height)),
                ("Stride X", mm(ctx.stride_x)),
                ("Stride Y", mm(ctx.stride_y)),
                ("Quadrant gap X", mm(ctx.effective_gap_x)),
                ("Quadrant gap Y", mm(ctx.effective_gap_y)),
                ("Offset X", mm(ctx.offset_x)),
                ("Offset Y", mm(ctx.offset_y)),
            ];
            println!("{}", kv_table(&pairs));

            heading("Quadrant origins");
            let origins: Vec<(&str, String)> = Quadrant::ALL
                .iter()
                .zip(["Q1", "Q2", "Q3", "Q4"])
                .map(|(q, label)| {
                    let (x, y) = ctx.quadrant_origin(*q);
                    (label, format!("({:.3}, {:.3})", x, y))
                })
                .collect();
            println!("{}", kv_table(&origins));

            if ctx.visual_shift() != (0.0, 0.0) {
                println!(
                    "{} Visual origin shift ({}, {}) applies to rendering only",
                    style("→").blue(),
                    ctx.visual_origin_x,
                    ctx.visual_origin_y
                );
            }
            Ok(())
        }
    }
}
