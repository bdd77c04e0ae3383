//! Per-file scale-factor application.
//!
//! Reads an event file batch by batch, computes `SF_TXbb`, `SF_TXbb_up` and
//! `SF_TXbb_down` for every event and writes the input columns plus the
//! weights to a new file. Each batch is computed independently, so the chunk
//! size only bounds memory and never changes the output values.

use std::path::{Path, PathBuf};

use arrow::record_batch::RecordBatch;
use sf_lookup::{ScaleFactorLookup, SfWeights, WeightOptions, compute_weights};

use crate::columns::{attach_weights, output_schema};
use crate::error::{EventIoError, Result};
use crate::events::{EventReader, EventWriter, column_f64};

/// Default column holding the tagger score.
pub const DEFAULT_SCORE_KEY: &str = "fj_1_globalParT_XbbVsQCD";

/// Default column holding the jet pt.
pub const DEFAULT_PT_KEY: &str = "fj_1_pt";

/// File extension of event files.
pub const EVENT_FILE_EXTENSION: &str = "parquet";

/// Options for [`process_file`].
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Column holding the tagger score.
    pub score_key: String,
    /// Column holding the jet pt.
    pub pt_key: String,
    /// Real data: every weight is `1.0` and the lookup is not consulted.
    pub is_data: bool,
    /// Rows per batch; `None` processes the whole file at once.
    pub chunk_size: Option<usize>,
    /// Input ranges and up/down convention.
    pub weights: WeightOptions,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            score_key: DEFAULT_SCORE_KEY.to_string(),
            pt_key: DEFAULT_PT_KEY.to_string(),
            is_data: false,
            chunk_size: None,
            weights: WeightOptions::default(),
        }
    }
}

/// What [`process_file`] wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Events written.
    pub entries: usize,
    /// Batches processed.
    pub batches: usize,
}

/// `<dir>/<dataset>.parquet`
pub fn dataset_path(dir: &Path, dataset: &str) -> PathBuf {
    dir.join(format!("{dataset}.{EVENT_FILE_EXTENSION}"))
}

/// Weights for one batch.
///
/// `lookup` is only consulted for simulation and may be `None` in data mode.
pub fn batch_weights(
    batch: &RecordBatch,
    lookup: Option<&ScaleFactorLookup>,
    options: &ProcessOptions,
) -> Result<SfWeights> {
    if options.is_data {
        return Ok(SfWeights::identity(batch.num_rows()));
    }
    let lookup = lookup.ok_or(EventIoError::NoLookup)?;
    let scores = column_f64(batch, &options.score_key)?;
    let pts = column_f64(batch, &options.pt_key)?;
    Ok(compute_weights(lookup, &scores, &pts, &options.weights)?)
}

/// Apply scale factors to every event of `input` and write `output`.
///
/// `output` only appears once every batch succeeded; on error no output file
/// is left behind. `lookup` may be `None` in data mode.
pub fn process_file(
    input: &Path,
    output: &Path,
    lookup: Option<&ScaleFactorLookup>,
    options: &ProcessOptions,
) -> Result<ProcessSummary> {
    let reader = EventReader::open(input)?;
    let entries = reader.num_entries();
    let chunk_size = options.chunk_size.unwrap_or(entries).max(1);

    if options.is_data {
        tracing::info!(
            path = %input.display(),
            entries,
            "data mode: setting all scale factors to 1"
        );
    } else {
        if lookup.is_none() {
            return Err(EventIoError::NoLookup);
        }
        for key in [&options.score_key, &options.pt_key] {
            if reader.schema().index_of(key).is_err() {
                return Err(EventIoError::MissingColumn(key.clone()));
            }
        }
        tracing::info!(path = %input.display(), entries, chunk_size, "applying scale factors");
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let schema = output_schema(reader.schema());
    let mut writer = EventWriter::create(output, schema.clone())?;
    let mut batches = 0usize;
    for batch in reader.batches(chunk_size)? {
        let batch = batch?;
        let weights = batch_weights(&batch, lookup, options)?;
        writer.write_batch(&attach_weights(&batch, &schema, &weights)?)?;
        batches += 1;
        tracing::debug!(batch = batches, rows = batch.num_rows(), "batch written");
    }
    let written = writer.finish()?;

    tracing::info!(path = %output.display(), entries = written, batches, "saved output");
    Ok(ProcessSummary { entries: written, batches })
}

/// [`process_file`] on `<input_dir>/<dataset>.parquet` → `<output_dir>/<dataset>.parquet`.
pub fn process_dataset(
    input_dir: &Path,
    output_dir: &Path,
    dataset: &str,
    lookup: Option<&ScaleFactorLookup>,
    options: &ProcessOptions,
) -> Result<ProcessSummary> {
    process_file(
        &dataset_path(input_dir, dataset),
        &dataset_path(output_dir, dataset),
        lookup,
        options,
    )
}
