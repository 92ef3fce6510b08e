//! `panelmap slice` command - cross-section through the layer stack

use clap::ValueEnum;
use console::style;
use miette::Result;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::analytics::yield_analysis::{cross_section_matrix, SliceAxis};
use crate::cli::args::DataArgs;
use crate::cli::helpers::{load_session, print_json};
use crate::cli::output::{count_cells, heading};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum AxisArg {
    /// Fix a unit column and count along Y
    X,
    /// Fix a unit row and count along X
    Y,
}

impl From<AxisArg> for SliceAxis {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::X => SliceAxis::X,
            AxisArg::Y => SliceAxis::Y,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct SliceArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Axis held fixed
    #[arg(long, short = 'a', default_value = "y")]
    pub axis: AxisArg,

    /// Unit index on the fixed axis
    #[arg(long, short = 'i', default_value_t = 0)]
    pub index: i32,
}

#[derive(Serialize)]
struct SliceReport {
    axis: String,
    index: i32,
    layer_labels: Vec<String>,
    axis_labels: Vec<String>,
    matrix: Vec<Vec<u32>>,
}

pub fn run(args: SliceArgs, global: &GlobalOpts) -> Result<()> {
    let session = load_session(global, &args.data)?;
    let axis: SliceAxis = args.axis.into();

    let (fixed_len, label) = match axis {
        SliceAxis::X => (session.grid.total_cols(), "X"),
        SliceAxis::Y => (session.grid.total_rows(), "Y"),
    };
    if args.index < 0 || args.index as usize >= fixed_len {
        tracing::warn!(
            "{} index {} is outside the panel (0..{}); the slice will be empty",
            label,
            args.index,
            fixed_len
        );
    }

    let section = cross_section_matrix(
        &session.panel,
        axis,
        args.index,
        &session.grid,
        &session.classifier,
    );

    if global.format == OutputFormat::Json {
        return print_json(&SliceReport {
            axis: label.to_string(),
            index: args.index,
            layer_labels: section.layer_labels.clone(),
            axis_labels: section.axis_labels.clone(),
            matrix: section.rows(),
        });
    }

    if section.is_empty() {
        println!("{} No layers loaded", style("!").yellow());
        return Ok(());
    }

    heading(&format!("Cross-section at {} = {}", label, args.index));
    let mut builder = Builder::default();
    let mut header = vec!["Layer".to_string()];
    header.extend(section.axis_labels.iter().cloned());
    builder.push_record(header);

    for (layer, row) in section.layer_labels.iter().zip(count_cells(&section.rows())) {
        let mut record = vec![layer.clone()];
        record.extend(row);
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{}", table);
    Ok(())
}
