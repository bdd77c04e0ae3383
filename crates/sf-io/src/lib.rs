//! # sf-io
//!
//! Event storage and scale-factor application for sfweights.
//!
//! Events live in Parquet files: one row per event, one flat numeric column
//! per branch.
//!
//! - [`events`]: [`EventReader`] / [`EventWriter`]
//! - [`columns`]: output schema and weight-column attachment
//! - [`processor`]: stream a file through a [`ScaleFactorLookup`](sf_lookup::ScaleFactorLookup)
//!
//! ```no_run
//! use std::path::Path;
//! use sf_io::{ProcessOptions, process_file};
//! use sf_lookup::ScaleFactorLookup;
//!
//! let lookup = ScaleFactorLookup::from_json_dir(Path::new("jsons")).unwrap();
//! let options = ProcessOptions { chunk_size: Some(100_000), ..Default::default() };
//! let (input, output) = (Path::new("in/ggF.parquet"), Path::new("out/ggF.parquet"));
//! process_file(input, output, Some(&lookup), &options).unwrap();
//! ```

#![warn(clippy::all)]

pub mod columns;
pub mod error;
pub mod events;
pub mod processor;

pub use columns::{WEIGHT_COLUMNS, attach_weights, output_schema};
pub use error::{EventIoError, Result};
pub use events::{EventReader, EventWriter, column_f64, write_parquet};
pub use processor::{
    DEFAULT_PT_KEY, DEFAULT_SCORE_KEY, ProcessOptions, ProcessSummary, batch_weights,
    dataset_path, process_dataset, process_file,
};
