//! Point queries: one (score, pt) pair at a time.

use std::path::Path;

use sf_core::Result;

use crate::bins::{Binning, CalibKey, PtBinSet, WorkingPointConfig};
use crate::schema::{self, GlobalConfig, SfResults, Variation};
use crate::table::CalibrationTable;

/// Variation field of a calibration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationField {
    /// `final`: the primary scale factor.
    Final,
    /// `jer`: jet energy resolution variation.
    Jer,
    /// `jes`: jet energy scale variation.
    Jes,
}

impl CalibrationField {
    /// Parse a field name as it appears in the results document.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "final" => Some(Self::Final),
            "jer" => Some(Self::Jer),
            "jes" => Some(Self::Jes),
            _ => None,
        }
    }

    /// Field name in the results document.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Final => "final",
            Self::Jer => "jer",
            Self::Jes => "jes",
        }
    }
}

/// Efficiency sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Simulation.
    Mc,
    /// Observed data.
    Data,
}

impl Sample {
    /// `"mc"` or `"data"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mc => "mc",
            Self::Data => "data",
        }
    }
}

/// Key selecting the overall efficiency in [`ScaleFactorCorrector::get_efficiency`].
pub const FINAL_EFFICIENCY: &str = "final";

/// Scale-factor table answering single (score, pt) queries.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sf_lookup::ScaleFactorCorrector;
///
/// let sf = ScaleFactorCorrector::from_json_dir(Path::new("jsons")).unwrap();
/// let v = sf.get_sf(0.93, 420.0).unwrap();
/// println!("SF = {} +{} -{}", v.central, v.high, v.low);
/// ```
#[derive(Debug, Clone)]
pub struct ScaleFactorCorrector {
    table: CalibrationTable,
}

impl ScaleFactorCorrector {
    /// Build from the configuration and results documents.
    pub fn new(config: &GlobalConfig, results: &SfResults) -> Result<Self> {
        Ok(Self { table: CalibrationTable::new(config, results)? })
    }

    /// Load `global_cfg.json` and `sf_eff_values.json` from `dir`.
    pub fn from_json_dir(dir: &Path) -> Result<Self> {
        let (config, results) = schema::load_json_dir(dir)?;
        Self::new(&config, &results)
    }

    /// Variation `name` (`final`, `jer` or `jes`) for the cell containing (score, pt).
    ///
    /// Unknown names and absent fields both yield `MissingCalibration`.
    pub fn get_variation(&self, score: f64, pt: f64, name: &str) -> Result<Variation> {
        self.variation_at(self.table.binning().resolve(score, pt)?, name)
    }

    /// Variation `name` of an already resolved cell.
    pub fn variation_at(&self, key: CalibKey, name: &str) -> Result<Variation> {
        let record = self.table.require(key, name)?;
        let value = match CalibrationField::parse(name) {
            Some(CalibrationField::Final) => record.final_sf,
            Some(CalibrationField::Jer) => record.jer,
            Some(CalibrationField::Jes) => record.jes,
            None => None,
        };
        value.ok_or_else(|| self.table.missing(key, name))
    }

    /// Final scale factor.
    pub fn get_sf(&self, score: f64, pt: f64) -> Result<Variation> {
        self.get_variation(score, pt, CalibrationField::Final.as_str())
    }

    /// JER variation.
    pub fn get_jer(&self, score: f64, pt: f64) -> Result<Variation> {
        self.get_variation(score, pt, CalibrationField::Jer.as_str())
    }

    /// JES variation.
    pub fn get_jes(&self, score: f64, pt: f64) -> Result<Variation> {
        self.get_variation(score, pt, CalibrationField::Jes.as_str())
    }

    /// Tagging efficiency.
    ///
    /// `key == "final"` reads `efficiencies.final_{sample}`; any other key is
    /// a mode name read from `efficiencies.byMode[key][sample]`.
    pub fn get_efficiency(&self, score: f64, pt: f64, sample: Sample, key: &str) -> Result<f64> {
        self.efficiency_at(self.table.binning().resolve(score, pt)?, sample, key)
    }

    /// Efficiency of an already resolved cell.
    pub fn efficiency_at(&self, cell: CalibKey, sample: Sample, key: &str) -> Result<f64> {
        let path = if key == FINAL_EFFICIENCY {
            format!("efficiencies.final_{}", sample.as_str())
        } else {
            format!("efficiencies.byMode.{key}.{}", sample.as_str())
        };
        let record = self.table.require(cell, &path)?;
        let effs = record.efficiencies.as_ref().ok_or_else(|| self.table.missing(cell, &path))?;

        let value = if key == FINAL_EFFICIENCY {
            match sample {
                Sample::Mc => effs.final_mc,
                Sample::Data => effs.final_data,
            }
        } else {
            effs.by_mode.get(key).and_then(|m| match sample {
                Sample::Mc => m.mc,
                Sample::Data => m.data,
            })
        };
        value.ok_or_else(|| self.table.missing(cell, &path))
    }

    /// Working-point score boundaries.
    pub fn wp_boundaries(&self) -> &WorkingPointConfig {
        self.table.binning().wps()
    }

    /// Pt range boundaries.
    pub fn pt_boundaries(&self) -> &PtBinSet {
        self.table.binning().pts()
    }

    /// Both axes.
    pub fn binning(&self) -> &Binning {
        self.table.binning()
    }
}
