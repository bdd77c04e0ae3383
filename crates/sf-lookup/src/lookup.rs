//! Vectorized scale-factor lookup over dense WP×pt grids.
//!
//! This is the path used when reweighting whole event files: the grids are
//! materialized once and every query is a pair of binary searches per event.
//! Out-of-edge inputs never error; they clamp to the boundary bins (see
//! [`crate::dense`]) and are then masked by [`ScaleFactorLookup::restrict_sf`].

use std::path::Path;

use sf_core::Result;

use crate::bins::{Binning, CalibKey, PtBinSet, WorkingPointConfig};
use crate::corrector::CalibrationField;
use crate::dense::DenseLookup;
use crate::schema::{self, GlobalConfig, SfResults, Variation};
use crate::table::CalibrationTable;

/// Grid selector for vectorized queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SfVariation {
    /// `central`
    #[default]
    Nominal,
    /// `central + high`
    StatUp,
    /// `central - low`
    StatDn,
}

impl SfVariation {
    /// All grid variations.
    pub const ALL: [SfVariation; 3] = [Self::Nominal, Self::StatUp, Self::StatDn];

    /// `"nominal"`, `"stat_up"` or `"stat_dn"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nominal => "nominal",
            Self::StatUp => "stat_up",
            Self::StatDn => "stat_dn",
        }
    }
}

/// Direction of a bare statistical delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatDirection {
    /// `high`
    Up,
    /// `low`
    Down,
}

/// Closed interval `[min, max]` of trusted input values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputRange {
    /// Smallest accepted value.
    pub min: f64,
    /// Largest accepted value.
    pub max: f64,
}

impl InputRange {
    /// Create a range.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `true` when `x < min`, `x > max`, or `x` is NaN.
    ///
    /// A missing (NaN) input is never inside a trusted range, so it gets no
    /// correction once a range is supplied.
    pub fn excludes(&self, x: f64) -> bool {
        x.is_nan() || x < self.min || x > self.max
    }
}

/// Scale-factor table with pre-materialized grids.
#[derive(Debug, Clone)]
pub struct ScaleFactorLookup {
    binning: Binning,
    nominal: DenseLookup,
    stat_up: DenseLookup,
    stat_dn: DenseLookup,
    delta_up: DenseLookup,
    delta_dn: DenseLookup,
}

impl ScaleFactorLookup {
    /// Build the grids from the configuration and results documents.
    ///
    /// Every WP×pt cell must carry a `final` record.
    pub fn new(config: &GlobalConfig, results: &SfResults) -> Result<Self> {
        Self::from_table(&CalibrationTable::new(config, results)?)
    }

    /// Load `global_cfg.json` and `sf_eff_values.json` from `dir`.
    pub fn from_json_dir(dir: &Path) -> Result<Self> {
        tracing::info!(dir = %dir.display(), "loading scale factors");
        let (config, results) = schema::load_json_dir(dir)?;
        Self::new(&config, &results)
    }

    /// Build the grids from an already validated table.
    pub fn from_table(table: &CalibrationTable) -> Result<Self> {
        let binning = table.binning().clone();
        let x_edges = binning.wps().score_edges()?;
        let y_edges = binning.pts().edges();

        let n_cells = binning.n_cells();
        let mut finals: Vec<Variation> = Vec::with_capacity(n_cells);
        for wp in 0..binning.wps().len() {
            for pt in 0..binning.pts().len() {
                let key = CalibKey { wp, pt };
                let field = CalibrationField::Final.as_str();
                let record = table.require(key, field)?;
                finals.push(record.final_sf.ok_or_else(|| table.missing(key, field))?);
            }
        }

        let grid = |f: fn(&Variation) -> f64| {
            DenseLookup::new(x_edges.clone(), y_edges.clone(), finals.iter().map(f).collect())
        };
        let lookup = Self {
            nominal: grid(|v| v.central)?,
            stat_up: grid(Variation::up)?,
            stat_dn: grid(Variation::down)?,
            delta_up: grid(|v| v.high)?,
            delta_dn: grid(|v| v.low)?,
            binning,
        };

        tracing::debug!(
            wps = lookup.binning.wps().len(),
            pt_bins = lookup.binning.pts().len(),
            "scale-factor grids built"
        );
        Ok(lookup)
    }

    /// Grid backing `variation`.
    pub fn grid(&self, variation: SfVariation) -> &DenseLookup {
        match variation {
            SfVariation::Nominal => &self.nominal,
            SfVariation::StatUp => &self.stat_up,
            SfVariation::StatDn => &self.stat_dn,
        }
    }

    /// Scale factors for each (score, pt) pair.
    pub fn get_sf(&self, scores: &[f64], pts: &[f64], variation: SfVariation) -> Result<Vec<f64>> {
        self.grid(variation).evaluate(scores, pts)
    }

    /// [`get_sf`](Self::get_sf), with `1.0` wherever score or pt lies outside
    /// the supplied ranges.
    pub fn restrict_sf(
        &self,
        scores: &[f64],
        pts: &[f64],
        variation: SfVariation,
        score_range: Option<InputRange>,
        pt_range: Option<InputRange>,
    ) -> Result<Vec<f64>> {
        let mut sf = self.get_sf(scores, pts, variation)?;
        mask_outside(&mut sf, scores, pts, score_range, pt_range, 1.0);
        Ok(sf)
    }

    /// Bare statistical deltas (`high` or `low`) for each pair.
    pub fn stat_delta(
        &self,
        scores: &[f64],
        pts: &[f64],
        direction: StatDirection,
    ) -> Result<Vec<f64>> {
        let grid = match direction {
            StatDirection::Up => &self.delta_up,
            StatDirection::Down => &self.delta_dn,
        };
        grid.evaluate(scores, pts)
    }

    /// [`stat_delta`](Self::stat_delta), with `0.0` outside the supplied ranges.
    pub fn restrict_stat_delta(
        &self,
        scores: &[f64],
        pts: &[f64],
        direction: StatDirection,
        score_range: Option<InputRange>,
        pt_range: Option<InputRange>,
    ) -> Result<Vec<f64>> {
        let mut delta = self.stat_delta(scores, pts, direction)?;
        mask_outside(&mut delta, scores, pts, score_range, pt_range, 0.0);
        Ok(delta)
    }

    /// Working-point score boundaries.
    pub fn wp_boundaries(&self) -> &WorkingPointConfig {
        self.binning.wps()
    }

    /// Pt range boundaries.
    pub fn pt_boundaries(&self) -> &PtBinSet {
        self.binning.pts()
    }

    /// Both axes.
    pub fn binning(&self) -> &Binning {
        &self.binning
    }
}

/// Overwrite `out[i]` with `fill` where an input lies outside its range.
///
/// `out` is always the caller's own freshly computed array; inputs are
/// read-only.
fn mask_outside(
    out: &mut [f64],
    scores: &[f64],
    pts: &[f64],
    score_range: Option<InputRange>,
    pt_range: Option<InputRange>,
    fill: f64,
) {
    if let Some(range) = score_range {
        for (v, &s) in out.iter_mut().zip(scores) {
            if range.excludes(s) {
                *v = fill;
            }
        }
    }
    if let Some(range) = pt_range {
        for (v, &p) in out.iter_mut().zip(pts) {
            if range.excludes(p) {
                *v = fill;
            }
        }
    }
}
