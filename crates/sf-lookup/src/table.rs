//! Validated calibration table: results records indexed by [`CalibKey`].
//!
//! String keys are parsed exactly once, here. Everything downstream works on
//! the structured key.

use sf_core::{Error, Result};

use crate::bins::{Binning, CalibKey, PtBinSet, WorkingPointConfig, parse_result_key};
use crate::schema::{CalibrationRecord, GlobalConfig, SfResults};

/// Calibration records laid out on the WP×pt grid.
///
/// Cells without a record are allowed; queries touching them fail with
/// [`Error::MissingCalibration`].
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    binning: Binning,
    cells: Vec<Option<CalibrationRecord>>,
}

impl CalibrationTable {
    /// Build from the configuration and results documents.
    ///
    /// Rejects results keys that do not parse, name an unconfigured WP, or
    /// span more than one pair of consecutive pt breakpoints.
    pub fn new(config: &GlobalConfig, results: &SfResults) -> Result<Self> {
        let wps = WorkingPointConfig::from_global_config(config)?;
        let pts = PtBinSet::from_result_keys(results.keys().map(String::as_str))?;
        let binning = Binning::new(wps, pts);

        let mut cells: Vec<Option<CalibrationRecord>> = vec![None; binning.n_cells()];
        for (name, record) in results {
            let parsed = parse_result_key(name)?;
            let wp = binning.wps().index_of(parsed.wp).ok_or_else(|| {
                Error::MalformedConfig(format!(
                    "results key '{name}' refers to unknown working point '{}'",
                    parsed.wp
                ))
            })?;
            let pt = binning.pts().index_of(parsed.pt_low, parsed.pt_high).ok_or_else(|| {
                Error::MalformedConfig(format!(
                    "results key '{name}' does not match consecutive pt breakpoints {:?}",
                    binning.pts().breakpoints()
                ))
            })?;
            let slot = &mut cells[binning.cell_index(CalibKey { wp, pt })];
            if slot.is_some() {
                return Err(Error::MalformedConfig(format!(
                    "results key '{name}' duplicates an existing WP×pt cell"
                )));
            }
            *slot = Some(record.clone());
        }

        tracing::debug!(
            wps = binning.wps().len(),
            pt_bins = binning.pts().len(),
            records = results.len(),
            "calibration table built"
        );
        Ok(Self { binning, cells })
    }

    /// Binning axes.
    pub fn binning(&self) -> &Binning {
        &self.binning
    }

    /// Record stored at `key`, if any.
    pub fn record(&self, key: CalibKey) -> Option<&CalibrationRecord> {
        if key.wp >= self.binning.wps().len() || key.pt >= self.binning.pts().len() {
            return None;
        }
        self.cells[self.binning.cell_index(key)].as_ref()
    }

    /// Record stored at `key`, or [`Error::MissingCalibration`] naming `field`.
    pub fn require(&self, key: CalibKey, field: &str) -> Result<&CalibrationRecord> {
        self.record(key).ok_or_else(|| self.missing(key, field))
    }

    /// Build the [`Error::MissingCalibration`] for `key`/`field`.
    pub fn missing(&self, key: CalibKey, field: &str) -> Error {
        Error::MissingCalibration { key: self.binning.key_name(key), field: field.to_string() }
    }
}
