//! Error types for sfweights

use thiserror::Error;

/// Scale-factor lookup error type
#[derive(Error, Debug)]
pub enum Error {
    /// Score does not fall into any configured working-point interval
    #[error("score {score} does not fall into any working point range")]
    ScoreOutOfRange {
        /// Offending tagger score.
        score: f64,
    },

    /// Pt does not fall into any configured pt range
    #[error("no pt range found for pt={pt}")]
    NoPtRange {
        /// Offending jet pt.
        pt: f64,
    },

    /// Composed WP×pt key or requested field absent from the results
    #[error("no calibration found for '{field}' in {key}")]
    MissingCalibration {
        /// Serialized `"{WP}_pt{lo}to{hi}"` key.
        key: String,
        /// Requested field (variation or efficiency path).
        field: String,
    },

    /// Configuration or results failed shape validation
    #[error("malformed configuration: {0}")]
    MalformedConfig(String),

    /// Score and pt arrays of different length
    #[error("score/pt length mismatch: {scores} scores vs {pts} pt values")]
    ShapeMismatch {
        /// Length of the score array.
        scores: usize,
        /// Length of the pt array.
        pts: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
