//! # sf-lookup
//!
//! Binned jet-tagger scale factors, indexed by tagger score and jet pt.
//!
//! - [`bins`]: score → working point, pt → pt range, composite [`CalibKey`]
//! - [`table`]: validated calibration records on the WP×pt grid
//! - [`corrector`]: point queries ([`ScaleFactorCorrector`])
//! - [`dense`]: piecewise-constant 2-D grid
//! - [`lookup`]: vectorized queries and input-range restriction ([`ScaleFactorLookup`])
//! - [`weights`]: `SF_TXbb` / `_up` / `_down` event weights
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use sf_lookup::{ScaleFactorLookup, SfVariation};
//!
//! let lookup = ScaleFactorLookup::from_json_dir(Path::new("jsons")).unwrap();
//! let sf = lookup.get_sf(&[0.95, 0.99], &[310.0, 620.0], SfVariation::Nominal).unwrap();
//! assert_eq!(sf.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bins;
pub mod corrector;
pub mod dense;
pub mod lookup;
pub mod schema;
pub mod table;
pub mod weights;


pub use bins::{Binning, CalibKey, PtBin, PtBinSet, WorkingPoint, WorkingPointConfig};
pub use corrector::{CalibrationField, FINAL_EFFICIENCY, Sample, ScaleFactorCorrector};
pub use dense::DenseLookup;
pub use lookup::{InputRange, ScaleFactorLookup, SfVariation, StatDirection};
pub use schema::{
    CalibrationRecord, Efficiencies, GlobalConfig, ModeEfficiency, SfResults, TaggerConfig,
    Variation,
};
pub use sf_core::{Error, Result};
pub use table::CalibrationTable;
pub use weights::{SfWeights, WeightConvention, WeightOptions, compute_weights};
