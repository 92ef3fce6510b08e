//! Shared helper functions for CLI commands

use miette::{IntoDiagnostic, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::cli::args::{DataArgs, LayoutArgs};
use crate::cli::filters::SideFilter;
use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::geometry::{GeometryContext, PanelGrid};
use crate::core::verification::DefectClassifier;
use crate::entities::defect::LayerKey;
use crate::entities::panel::PanelData;
use crate::io::{generate_sample_data, load_panel};

/// Everything an analysis command needs
pub struct Session {
    pub config: Config,
    pub ctx: GeometryContext,
    pub grid: PanelGrid,
    pub classifier: DefectClassifier,
    pub panel: PanelData,
}

/// Load the configuration file (if any) and apply command-line overrides
pub fn resolve_config(global: &GlobalOpts, layout: &LayoutArgs) -> Result<Config> {
    let mut config = match &global.config {
        Some(path) => Config::load(path).map_err(|e| miette::miette!("{}", e))?,
        None => Config::default(),
    };

    if let Some(rows) = layout.rows {
        config.layout.panel_rows = rows;
    }
    if let Some(cols) = layout.cols {
        config.layout.panel_cols = cols;
    }
    if let Some(gap) = layout.dyn_gap_x {
        config.layout.dyn_gap_x = gap;
    }
    if let Some(gap) = layout.dyn_gap_y {
        config.layout.dyn_gap_y = gap;
    }
    Ok(config)
}

/// Derive geometry for a configuration, reporting invalid layouts
pub fn resolve_geometry(config: &Config) -> Result<(GeometryContext, PanelGrid)> {
    let ctx = config
        .geometry()
        .map_err(|e| miette::miette!("Invalid layout configuration: {}", e))?;
    let grid = config
        .grid()
        .map_err(|e| miette::miette!("Invalid layout configuration: {}", e))?;
    Ok((ctx, grid))
}

/// Build the analysis session from CSV files or sample data
pub fn load_session(global: &GlobalOpts, data: &DataArgs) -> Result<Session> {
    let config = resolve_config(global, &data.layout)?;
    let (ctx, grid) = resolve_geometry(&config)?;

    let panel = if data.sample {
        generate_sample_data(&ctx, grid, data.seed)
    } else {
        let mut rng = StdRng::seed_from_u64(data.seed);
        load_panel(&data.files, &ctx, grid, &mut rng).map_err(|e| miette::miette!("{}", e))?
    };

    if panel.is_empty() {
        tracing::warn!("No layer data loaded");
    } else {
        tracing::info!(
            "Loaded {} layers ({} layer/side pairs)",
            panel.len(),
            panel.keys().len()
        );
    }

    let classifier = config.classifier();
    Ok(Session {
        config,
        ctx,
        grid,
        classifier,
        panel,
    })
}

/// Layer keys matching a layer list (empty = all) and a side filter
pub fn select_keys(panel: &PanelData, layers: &[i32], side: SideFilter) -> Vec<LayerKey> {
    panel
        .keys()
        .into_iter()
        .filter(|k| layers.is_empty() || layers.contains(&k.layer_num))
        .filter(|k| side.matches(k.side))
        .collect()
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{}", json);
    Ok(())
}

/// Format a percentage with one decimal
pub fn format_pct(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
