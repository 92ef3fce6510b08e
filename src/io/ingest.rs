//! CSV ingestion of inspection exports
//!
//! One file holds one (layer, side); the key is taken from the file name
//! (`BU-02F.csv`, `bu-11 b_defects.csv`). Several files for the same key are
//! merged into a single layer.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rand::Rng;
use regex::Regex;
use thiserror::Error;

use crate::core::geometry::{GeometryContext, PanelGrid};
use crate::core::verification::normalize_verification;
use crate::entities::defect::{DefectRecord, LayerKey, Side};
use crate::entities::layer::BuildUpLayer;
use crate::entities::panel::PanelData;

/// File name prefix carrying the layer number and side
const LAYER_FILE_PATTERN: &str = r"(?i)^BU-(\d{2})\s*([FB])";

pub const REQUIRED_COLUMNS: [&str; 3] = ["DEFECT_TYPE", "UNIT_INDEX_X", "UNIT_INDEX_Y"];

/// Verification value given to blank cells of a present verification column
const BLANK_VERIFICATION: &str = "N";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to open {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read CSV '{source_name}': {message}")]
    Csv { source_name: String, message: String },

    #[error("File '{source_name}' is missing required columns: {}", .columns.join(", "))]
    MissingColumns {
        source_name: String,
        columns: Vec<String>,
    },
}

/// Layer key encoded in an inspection file name, if any
pub fn layer_key_from_filename(name: &str) -> Option<LayerKey> {
    let caps = layer_file_regex().captures(name.trim())?;
    let layer_num: i32 = caps.get(1)?.as_str().parse().ok()?;
    let side: Side = caps.get(2)?.as_str().parse().ok()?;
    Some(LayerKey::new(layer_num, side))
}

fn layer_file_regex() -> &'static Regex {
    static LAYER_FILE_RE: OnceLock<Regex> = OnceLock::new();
    LAYER_FILE_RE.get_or_init(|| Regex::new(LAYER_FILE_PATTERN).expect("layer file pattern is valid"))
}

/// Parse a unit index, accepting integral floats ("3.0") from spreadsheet exports
fn parse_index(value: &str) -> Option<i32> {
    let value = value.trim();
    if let Ok(i) = value.parse::<i32>() {
        return Some(i);
    }
    let f: f64 = value.parse().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

fn parse_optional_f64(value: Option<&str>) -> Option<f64> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}

/// Read and validate the defect rows of one CSV export.
///
/// Headers are matched case-insensitively. Rows with a missing or invalid
/// unit index are dropped with a warning.
pub fn read_defects<R: Read>(
    reader: R,
    key: LayerKey,
    source_name: &str,
) -> Result<Vec<DefectRecord>, IngestError> {
    let csv_err = |e: csv::Error| IngestError::Csv {
        source_name: source_name.to_string(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_ascii_uppercase())
        .collect();

    let idx = |name: &str| headers.iter().position(|h| h == name);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .into_iter()
        .filter(|&c| idx(c).is_none())
        .map(|c| c.to_string())
        .collect();
    let (Some(type_idx), Some(x_idx), Some(y_idx)) =
        (idx("DEFECT_TYPE"), idx("UNIT_INDEX_X"), idx("UNIT_INDEX_Y"))
    else {
        return Err(IngestError::MissingColumns {
            source_name: source_name.to_string(),
            columns: missing,
        });
    };

    let id_idx = idx("DEFECT_ID");
    let verification_idx = idx("VERIFICATION");
    let x_coord_idx = idx("X_COORDINATES");
    let y_coord_idx = idx("Y_COORDINATES");

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for row in reader.records() {
        let row = row.map_err(csv_err)?;

        let unit = (
            row.get(x_idx).and_then(parse_index),
            row.get(y_idx).and_then(parse_index),
        );
        let (Some(unit_x), Some(unit_y)) = unit else {
            dropped += 1;
            continue;
        };

        let defect_type = row.get(type_idx).unwrap_or("").trim();
        let mut record = DefectRecord::new(unit_x, unit_y, defect_type).on(key.layer_num, key.side);
        record.source_file = Some(source_name.to_string());
        record.defect_id = id_idx
            .and_then(|i| row.get(i))
            .and_then(|v| v.trim().parse().ok());

        if let Some(i) = verification_idx {
            let value = normalize_verification(row.get(i).unwrap_or(""));
            record.verification = Some(if value.is_empty() {
                BLANK_VERIFICATION.to_string()
            } else {
                value
            });
        }

        record.x_coordinates = parse_optional_f64(x_coord_idx.and_then(|i| row.get(i)));
        record.y_coordinates = parse_optional_f64(y_coord_idx.and_then(|i| row.get(i)));

        records.push(record);
    }

    if dropped > 0 {
        tracing::warn!(
            "Dropped {} rows with missing/invalid unit indices in '{}'",
            dropped,
            source_name
        );
    }
    tracing::debug!("Read {} defects for {} from '{}'", records.len(), key, source_name);

    Ok(records)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load inspection files into a panel.
///
/// Files whose names carry no layer key are skipped with a warning.
pub fn load_panel<R: Rng>(
    paths: &[PathBuf],
    ctx: &GeometryContext,
    grid: PanelGrid,
    rng: &mut R,
) -> Result<PanelData, IngestError> {
    let mut grouped: BTreeMap<LayerKey, Vec<DefectRecord>> = BTreeMap::new();

    for path in paths {
        let name = file_name(path);
        let Some(key) = layer_key_from_filename(&name) else {
            tracing::warn!(
                "Skipping file '{}': name must start with 'BU-XXF' or 'BU-XXB'",
                name
            );
            continue;
        };

        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let records = read_defects(file, key, &name)?;
        grouped.entry(key).or_default().extend(records);
    }

    let mut panel = PanelData::new();
    for (key, records) in grouped {
        panel.add_layer(BuildUpLayer::with_rng(
            key.layer_num,
            key.side,
            records,
            ctx,
            grid,
            rng,
        ));
    }
    Ok(panel)
}
