//! Parquet event files: named numeric columns, one row per event.
//!
//! [`EventReader`] reads whole columns, column slices, or all columns in
//! fixed-size record batches. [`EventWriter`] streams batches into
//! `<path>.partial` and only renames it onto `<path>` in
//! [`EventWriter::finish`], so a failed run never leaves a truncated file.

use std::ffi::OsString;
use std::fs::File;
use std::ops::{Bound, RangeBounds};
use std::path::{Path, PathBuf};

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float64Type, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::{ArrowWriter, ProjectionMask};
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::{EventIoError, Result};

/// Read-only handle on a Parquet event file.
#[derive(Debug, Clone)]
pub struct EventReader {
    path: PathBuf,
    schema: SchemaRef,
    num_entries: usize,
}

impl EventReader {
    /// Open `path` and read its footer.
    pub fn open(path: &Path) -> Result<Self> {
        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(path)?)?;
        let schema = builder.schema().clone();
        let num_rows = builder.metadata().file_metadata().num_rows();
        let num_entries = usize::try_from(num_rows).map_err(|_| {
            parquet::errors::ParquetError::General(format!("negative row count {num_rows}"))
        })?;
        tracing::debug!(path = %path.display(), entries = num_entries, "opened event file");
        Ok(Self { path: path.to_path_buf(), schema, num_entries })
    }

    /// File path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Arrow schema of the file.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Column names in file order.
    pub fn column_names(&self) -> Vec<&str> {
        self.schema.fields().iter().map(|f| f.name().as_str()).collect()
    }

    /// Total number of events.
    pub fn num_entries(&self) -> usize {
        self.num_entries
    }

    fn builder(&self) -> Result<ParquetRecordBatchReaderBuilder<File>> {
        Ok(ParquetRecordBatchReaderBuilder::try_new(File::open(&self.path)?)?)
    }

    /// Read column `name` over the entry range `range`, widened to `f64`.
    ///
    /// The range is clipped to `[0, num_entries)`. Nulls read as NaN.
    pub fn read_column(&self, name: &str, range: impl RangeBounds<usize>) -> Result<Vec<f64>> {
        let idx =
            self.schema.index_of(name).map_err(|_| EventIoError::MissingColumn(name.into()))?;
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(self.num_entries);
        let stop = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => self.num_entries,
        }
        .min(self.num_entries);
        if start >= stop {
            return Ok(Vec::new());
        }

        let builder = self.builder()?;
        let mask = ProjectionMask::roots(builder.parquet_schema(), [idx]);
        let reader =
            builder.with_projection(mask).with_offset(start).with_limit(stop - start).build()?;

        let mut out = Vec::with_capacity(stop - start);
        for batch in reader {
            out.extend(column_f64(&batch?, name)?);
        }
        Ok(out)
    }

    /// Iterate over all columns in record batches of at most `chunk_size` rows.
    pub fn batches(&self, chunk_size: usize) -> Result<ParquetRecordBatchReader> {
        Ok(self.builder()?.with_batch_size(chunk_size.max(1)).build()?)
    }
}

/// Column `name` of `batch` as `f64`.
///
/// Any numeric Arrow type is widened; nulls become NaN.
pub fn column_f64(batch: &RecordBatch, name: &str) -> Result<Vec<f64>> {
    let col =
        batch.column_by_name(name).ok_or_else(|| EventIoError::MissingColumn(name.into()))?;
    if !col.data_type().is_numeric() {
        return Err(EventIoError::WrongType {
            col: name.into(),
            expected: "numeric".into(),
            actual: format!("{:?}", col.data_type()),
        });
    }
    let widened = arrow::compute::cast(col, &DataType::Float64)?;
    let values = widened.as_primitive::<Float64Type>();
    if values.null_count() == 0 {
        return Ok(values.values().to_vec());
    }
    Ok(values.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

fn default_compression() -> Compression {
    Compression::SNAPPY
}

/// Streaming Parquet writer with atomic finalization.
pub struct EventWriter {
    path: PathBuf,
    partial: PathBuf,
    schema: SchemaRef,
    writer: Option<ArrowWriter<File>>,
    rows: usize,
    finished: bool,
}

impl EventWriter {
    /// Start writing `path` with a fixed schema.
    ///
    /// Data goes to `<path>.partial` until [`finish`](Self::finish).
    pub fn create(path: &Path, schema: SchemaRef) -> Result<Self> {
        let file_name = path
            .file_name()
            .ok_or_else(|| EventIoError::InvalidPath(path.display().to_string()))?;
        let mut partial_name = OsString::from(file_name);
        partial_name.push(".partial");
        let partial = path.with_file_name(partial_name);

        let props = WriterProperties::builder().set_compression(default_compression()).build();
        let file = File::create(&partial)?;
        let writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
        Ok(Self {
            path: path.to_path_buf(),
            partial,
            schema,
            writer: Some(writer),
            rows: 0,
            finished: false,
        })
    }

    /// Schema every batch must match.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Append one batch.
    pub fn write_batch(&mut self, batch: &RecordBatch) -> Result<()> {
        if batch.schema().fields() != self.schema.fields() {
            return Err(EventIoError::SchemaMismatch(format!(
                "expected columns {:?}, got {:?}",
                field_names(&self.schema),
                field_names(&batch.schema())
            )));
        }
        let writer =
            self.writer.as_mut().ok_or_else(|| std::io::Error::other("writer already closed"))?;
        writer.write(batch)?;
        self.rows += batch.num_rows();
        Ok(())
    }

    /// Close the file and move it into place. Returns the number of rows.
    pub fn finish(mut self) -> Result<usize> {
        if let Some(writer) = self.writer.take() {
            writer.close()?;
        }
        std::fs::rename(&self.partial, &self.path)?;
        self.finished = true;
        tracing::debug!(path = %self.path.display(), rows = self.rows, "event file written");
        Ok(self.rows)
    }
}

impl Drop for EventWriter {
    fn drop(&mut self) {
        if !self.finished {
            drop(self.writer.take());
            if std::fs::remove_file(&self.partial).is_ok() {
                tracing::warn!(path = %self.partial.display(), "discarded partial output");
            }
        }
    }
}

fn field_names(schema: &SchemaRef) -> Vec<String> {
    schema.fields().iter().map(|f| f.name().clone()).collect()
}

/// Write `batches` to `path` in one go (atomic). Empty input writes nothing.
pub fn write_parquet(path: &Path, batches: &[RecordBatch]) -> Result<()> {
    let Some(first) = batches.first() else {
        return Ok(());
    };
    let mut writer = EventWriter::create(path, first.schema())?;
    for batch in batches {
        writer.write_batch(batch)?;
    }
    writer.finish()?;
    Ok(())
}
