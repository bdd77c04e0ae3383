//! Error type for event file processing.

/// Error type for event storage and processing.
#[derive(Debug, thiserror::Error)]
pub enum EventIoError {
    #[error("Parquet read/write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("scale-factor lookup failed: {0}")]
    Lookup(#[from] sf_core::Error),

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("column '{col}' has wrong type: expected {expected}, got {actual}")]
    WrongType { col: String, expected: String, actual: String },

    #[error("batch does not match the writer schema: {0}")]
    SchemaMismatch(String),

    #[error("no scale-factor table given for simulated events")]
    NoLookup,

    #[error("invalid output path: {0}")]
    InvalidPath(String),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, EventIoError>;
