//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo;
use assert_cmd::Command;
use panelmap::core::config::{Config, FrameConfig, LayoutConfig};
use panelmap::core::geometry::{calculate_layout, GeometryContext, PanelGrid};
use panelmap::entities::{BuildUpLayer, DefectRecord, PanelData, Side};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

/// Helper to get a panelmap command
pub fn panelmap() -> Command {
    Command::new(cargo::cargo_bin!("panelmap"))
}

pub const CSV_HEADER: &str = "DEFECT_ID,DEFECT_TYPE,UNIT_INDEX_X,UNIT_INDEX_Y,VERIFICATION";

/// Write an inspection CSV with the standard header into `dir`
pub fn write_layer_csv(dir: &TempDir, name: &str, rows: &[&str]) -> PathBuf {
    let mut contents = String::from(CSV_HEADER);
    for row in rows {
        contents.push('\n');
        contents.push_str(row);
    }
    contents.push('\n');

    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

/// Layout with a 2x2 grid per quadrant and no dynamic gaps
pub fn small_layout() -> (GeometryContext, PanelGrid) {
    let layout = LayoutConfig {
        panel_rows: 2,
        panel_cols: 2,
        dyn_gap_x: 0.0,
        dyn_gap_y: 0.0,
        ..LayoutConfig::default()
    };
    (
        calculate_layout(&FrameConfig::default(), &layout).unwrap(),
        PanelGrid::new(2, 2).unwrap(),
    )
}

/// Build a panel from (layer, side, records) on the small layout
pub fn small_panel(layers: Vec<(i32, Side, Vec<DefectRecord>)>) -> PanelData {
    let (ctx, grid) = small_layout();
    let mut rng = StdRng::seed_from_u64(42);
    let mut panel = PanelData::new();
    for (num, side, records) in layers {
        panel.add_layer(BuildUpLayer::with_rng(num, side, records, &ctx, grid, &mut rng));
    }
    panel
}

/// Default configuration used by the CLI
pub fn default_config() -> Config {
    Config::default()
}
