//! Per-event weight arrays derived from the vectorized lookup.
//!
//! With the default [`WeightConvention::Stacked`] the up/down weights are
//!
//! ```text
//! SF      = restrict_sf(nominal)
//! SF_up   = SF + restrict_sf(stat_up)    // stat_up = central + high
//! SF_down = SF - restrict_sf(stat_dn)    // stat_dn = central - low
//! ```
//!
//! so the central value enters the up/down weights twice.
//! [`WeightConvention::Delta`] yields `SF ± delta` instead.

use sf_core::Result;

use crate::lookup::{InputRange, ScaleFactorLookup, SfVariation, StatDirection};

/// Output column holding the nominal weight.
pub const SF_COLUMN: &str = "SF_TXbb";
/// Output column holding the upward weight.
pub const SF_UP_COLUMN: &str = "SF_TXbb_up";
/// Output column holding the downward weight.
pub const SF_DOWN_COLUMN: &str = "SF_TXbb_down";

/// How `SF_up` / `SF_down` are composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeightConvention {
    /// `SF ± restrict_sf(stat_up / stat_dn)`.
    #[default]
    Stacked,
    /// `SF ± restricted high / low delta`.
    Delta,
}

/// Options shared by every batch of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WeightOptions {
    /// Trusted score range; events outside get no correction.
    pub score_range: Option<InputRange>,
    /// Trusted pt range; events outside get no correction.
    pub pt_range: Option<InputRange>,
    /// Up/down composition.
    pub convention: WeightConvention,
}

/// Nominal, up and down weights for a batch of events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SfWeights {
    /// `SF_TXbb`
    pub nominal: Vec<f64>,
    /// `SF_TXbb_up`
    pub up: Vec<f64>,
    /// `SF_TXbb_down`
    pub down: Vec<f64>,
}

impl SfWeights {
    /// `1.0` everywhere (real data: no correction).
    pub fn identity(n: usize) -> Self {
        Self { nominal: vec![1.0; n], up: vec![1.0; n], down: vec![1.0; n] }
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.nominal.len()
    }

    /// `true` for an empty batch.
    pub fn is_empty(&self) -> bool {
        self.nominal.is_empty()
    }

    /// Append another batch.
    pub fn extend(&mut self, other: SfWeights) {
        self.nominal.extend(other.nominal);
        self.up.extend(other.up);
        self.down.extend(other.down);
    }

    /// `(column name, values)` in output order.
    pub fn columns(&self) -> [(&'static str, &[f64]); 3] {
        [
            (SF_COLUMN, self.nominal.as_slice()),
            (SF_UP_COLUMN, self.up.as_slice()),
            (SF_DOWN_COLUMN, self.down.as_slice()),
        ]
    }
}

/// Compute the three weight arrays for one batch.
pub fn compute_weights(
    lookup: &ScaleFactorLookup,
    scores: &[f64],
    pts: &[f64],
    options: &WeightOptions,
) -> Result<SfWeights> {
    let (score_range, pt_range) = (options.score_range, options.pt_range);
    let nominal = lookup.restrict_sf(scores, pts, SfVariation::Nominal, score_range, pt_range)?;

    let (shift_up, shift_down) = match options.convention {
        WeightConvention::Stacked => (
            lookup.restrict_sf(scores, pts, SfVariation::StatUp, score_range, pt_range)?,
            lookup.restrict_sf(scores, pts, SfVariation::StatDn, score_range, pt_range)?,
        ),
        WeightConvention::Delta => (
            lookup.restrict_stat_delta(scores, pts, StatDirection::Up, score_range, pt_range)?,
            lookup.restrict_stat_delta(scores, pts, StatDirection::Down, score_range, pt_range)?,
        ),
    };

    let up = nominal.iter().zip(&shift_up).map(|(sf, s)| sf + s).collect();
    let down = nominal.iter().zip(&shift_down).map(|(sf, s)| sf - s).collect();
    Ok(SfWeights { nominal, up, down })
}
