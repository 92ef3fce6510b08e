//! Data sources: CSV inspection exports and generated sample panels

pub mod ingest;
pub mod sample;

pub use ingest::{layer_key_from_filename, load_panel, read_defects, IngestError};
pub use sample::{generate_sample_data, DEFAULT_SEED};
