//! JSON schema types for the calibration inputs.
//!
//! Two documents feed the lookup:
//!
//! - `global_cfg.json`: `{"tagger": {"wps": {"WP1": [0.0, 0.4], ...}}}`
//! - `sf_eff_values.json`: `{"WP1_pt250to400": {"final": {...}, ...}, ...}`
//!
//! Both are deserialized into ordered maps so iteration is reproducible.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;

use sf_core::{Error, Result};

/// File name of the working-point configuration inside a JSON directory.
pub const GLOBAL_CONFIG_FILE: &str = "global_cfg.json";

/// File name of the calibration results inside a JSON directory.
pub const RESULTS_FILE: &str = "sf_eff_values.json";

/// Top-level configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Tagger section
    pub tagger: TaggerConfig,
}

/// Tagger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaggerConfig {
    /// Working point name → `[low, high)` score interval
    pub wps: BTreeMap<String, [f64; 2]>,
}

/// Central value with an asymmetric uncertainty envelope
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    /// Central value
    pub central: f64,
    /// Upward uncertainty (added to `central`)
    pub high: f64,
    /// Downward uncertainty (subtracted from `central`)
    pub low: f64,
}

impl Variation {
    /// `central + high`
    pub fn up(&self) -> f64 {
        self.central + self.high
    }

    /// `central - low`
    pub fn down(&self) -> f64 {
        self.central - self.low
    }
}

/// Per-mode efficiency pair
///
/// Either side may be absent; only a query for the missing side fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeEfficiency {
    /// Simulated efficiency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mc: Option<f64>,
    /// Observed efficiency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<f64>,
}

/// Tagging efficiencies for one WP×pt cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Efficiencies {
    /// Final simulated efficiency
    #[serde(default)]
    pub final_mc: Option<f64>,
    /// Final observed efficiency
    #[serde(default)]
    pub final_data: Option<f64>,
    /// Efficiencies split by production/decay mode
    #[serde(rename = "byMode", default)]
    pub by_mode: BTreeMap<String, ModeEfficiency>,
}

/// One calibration record (a single WP×pt cell)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    /// Final scale factor
    #[serde(rename = "final", default, skip_serializing_if = "Option::is_none")]
    pub final_sf: Option<Variation>,
    /// Jet energy resolution variation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jer: Option<Variation>,
    /// Jet energy scale variation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jes: Option<Variation>,
    /// Tagging efficiencies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiencies: Option<Efficiencies>,
}

/// Raw results document: `"{WP}_pt{lo}to{hi}"` → record
pub type SfResults = BTreeMap<String, CalibrationRecord>;

/// Load a JSON document from `path`.
///
/// Well-formed JSON of the wrong shape (wrong types, wrong array lengths,
/// missing required fields) is [`Error::MalformedConfig`] naming the file;
/// syntax errors stay [`Error::Json`].
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    tracing::debug!(path = %path.display(), "loading JSON");
    let text = std::fs::read_to_string(path)?;
    serde_json::from_str(&text).map_err(|e| match e.classify() {
        Category::Data => Error::MalformedConfig(format!("{}: {e}", path.display())),
        _ => Error::Json(e),
    })
}

/// Load `global_cfg.json` and `sf_eff_values.json` from a directory.
pub fn load_json_dir(dir: &Path) -> Result<(GlobalConfig, SfResults)> {
    let config: GlobalConfig = load_json(&dir.join(GLOBAL_CONFIG_FILE))?;
    let results: SfResults = load_json(&dir.join(RESULTS_FILE))?;
    Ok((config, results))
}
