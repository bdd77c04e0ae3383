//! Bin resolution: score → working point, pt → pt range.
//!
//! Both axes use half-open membership `[low, high)`. The topmost pt range is
//! open-ended, so arbitrarily large pt values still resolve. Resolution is
//! first-match in a fixed iteration order (sorted WP names, ascending pt), so
//! a malformed overlapping configuration still behaves reproducibly.

use std::collections::{BTreeMap, BTreeSet};

use sf_core::{Error, Result};

use crate::schema::GlobalConfig;

/// A named band on the tagger score.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingPoint {
    /// Working point name (e.g. `"WP3"`).
    pub name: String,
    /// Inclusive lower score edge.
    pub low: f64,
    /// Exclusive upper score edge.
    pub high: f64,
}

impl WorkingPoint {
    /// `low <= score < high`
    pub fn contains(&self, score: f64) -> bool {
        self.low <= score && score < self.high
    }
}

/// Working-point intervals in sorted-name order.
///
/// The position of a WP in this list is its row in the dense grids and its
/// index in a [`CalibKey`].
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingPointConfig {
    wps: Vec<WorkingPoint>,
}

impl WorkingPointConfig {
    /// Build from a name → `[low, high]` map.
    ///
    /// Rejects an empty map and intervals with `low >= high` or non-finite
    /// edges. Gaps and overlaps between WPs are not checked here.
    pub fn new(wps: &BTreeMap<String, [f64; 2]>) -> Result<Self> {
        if wps.is_empty() {
            return Err(Error::MalformedConfig("no working points configured".into()));
        }
        let mut out = Vec::with_capacity(wps.len());
        for (name, &[low, high]) in wps {
            if !low.is_finite() || !high.is_finite() || low >= high {
                return Err(Error::MalformedConfig(format!(
                    "working point '{name}' has invalid interval [{low}, {high})"
                )));
            }
            out.push(WorkingPoint { name: name.clone(), low, high });
        }
        Ok(Self { wps: out })
    }

    /// Build from the `tagger.wps` section of a [`GlobalConfig`].
    pub fn from_global_config(config: &GlobalConfig) -> Result<Self> {
        Self::new(&config.tagger.wps)
    }

    /// Index of the first WP containing `score`.
    pub fn resolve(&self, score: f64) -> Option<usize> {
        self.wps.iter().position(|wp| wp.contains(score))
    }

    /// First WP containing `score`.
    pub fn resolve_wp(&self, score: f64) -> Option<&WorkingPoint> {
        self.resolve(score).map(|i| &self.wps[i])
    }

    /// Index of the WP named `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.wps.iter().position(|wp| wp.name == name)
    }

    /// WP at `index`.
    pub fn get(&self, index: usize) -> Option<&WorkingPoint> {
        self.wps.get(index)
    }

    /// Iterate WPs in sorted-name order.
    pub fn iter(&self) -> impl Iterator<Item = &WorkingPoint> {
        self.wps.iter()
    }

    /// Number of working points.
    pub fn len(&self) -> usize {
        self.wps.len()
    }

    /// Always `false` for a validated config.
    pub fn is_empty(&self) -> bool {
        self.wps.is_empty()
    }

    /// Score edges for the dense grid: WP lows in sorted-name order, then `1.0`.
    ///
    /// Errors if the edges are not strictly increasing, which happens when
    /// name order disagrees with score order.
    pub fn score_edges(&self) -> Result<Vec<f64>> {
        let mut edges: Vec<f64> = self.wps.iter().map(|wp| wp.low).collect();
        edges.push(1.0);
        if let Some(w) = edges.windows(2).find(|w| w[0] >= w[1]) {
            return Err(Error::MalformedConfig(format!(
                "working point score edges are not strictly increasing in name order \
                 ({} >= {}): {edges:?}",
                w[0], w[1]
            )));
        }
        Ok(edges)
    }

    /// Name → `(low, high)` map, for introspection.
    pub fn boundaries(&self) -> BTreeMap<String, (f64, f64)> {
        self.wps.iter().map(|wp| (wp.name.clone(), (wp.low, wp.high))).collect()
    }
}

/// One pt range `[low, high)`, or `[low, ∞)` when open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtBin {
    /// Inclusive lower edge.
    pub low: u64,
    /// Upper breakpoint as written in the results keys.
    pub high: u64,
    /// Topmost range: accepts every `pt >= low`.
    pub open_ended: bool,
}

impl PtBin {
    /// Membership test honoring the open-ended top range.
    pub fn contains(&self, pt: f64) -> bool {
        let low = self.low as f64;
        if self.open_ended { low <= pt } else { low <= pt && pt < self.high as f64 }
    }

    /// Serialized form, `"pt{low}to{high}"`.
    pub fn key(&self) -> String {
        format!("pt{}to{}", self.low, self.high)
    }
}

/// Sorted pt breakpoints, derived once from the results keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtBinSet {
    breakpoints: Vec<u64>,
}

impl PtBinSet {
    /// Build from explicit breakpoints (sorted and deduplicated here).
    pub fn from_breakpoints(breakpoints: impl IntoIterator<Item = u64>) -> Result<Self> {
        let set: BTreeSet<u64> = breakpoints.into_iter().collect();
        if set.len() < 2 {
            return Err(Error::MalformedConfig(format!(
                "need at least two pt breakpoints, got {}",
                set.len()
            )));
        }
        Ok(Self { breakpoints: set.into_iter().collect() })
    }

    /// Collect every `low`/`high` appearing in `"{WP}_pt{low}to{high}"` keys.
    pub fn from_result_keys<'a>(keys: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut points = BTreeSet::new();
        for key in keys {
            let parsed = parse_result_key(key)?;
            points.insert(parsed.pt_low);
            points.insert(parsed.pt_high);
        }
        Self::from_breakpoints(points)
    }

    /// Number of pt ranges (`breakpoints - 1`).
    pub fn len(&self) -> usize {
        self.breakpoints.len() - 1
    }

    /// Always `false` for a validated set.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sorted breakpoints.
    pub fn breakpoints(&self) -> &[u64] {
        &self.breakpoints
    }

    /// Breakpoints as `f64` grid edges.
    pub fn edges(&self) -> Vec<f64> {
        self.breakpoints.iter().map(|&b| b as f64).collect()
    }

    /// Range at `index`.
    pub fn bin(&self, index: usize) -> Option<PtBin> {
        if index >= self.len() {
            return None;
        }
        Some(PtBin {
            low: self.breakpoints[index],
            high: self.breakpoints[index + 1],
            open_ended: index + 1 == self.len(),
        })
    }

    /// Iterate ranges in ascending order.
    pub fn bins(&self) -> impl Iterator<Item = PtBin> + '_ {
        (0..self.len()).filter_map(|i| self.bin(i))
    }

    /// Index of the range `[low, high)` if those are consecutive breakpoints.
    pub fn index_of(&self, low: u64, high: u64) -> Option<usize> {
        self.breakpoints.windows(2).position(|w| w[0] == low && w[1] == high)
    }

    /// Index of the first range containing `pt`.
    pub fn resolve(&self, pt: f64) -> Result<usize> {
        self.bins().position(|bin| bin.contains(pt)).ok_or(Error::NoPtRange { pt })
    }

    /// Range key → `(low, high)` map, for introspection.
    pub fn boundaries(&self) -> BTreeMap<String, (u64, u64)> {
        self.bins().map(|bin| (bin.key(), (bin.low, bin.high))).collect()
    }
}

/// A results key split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultKey<'a> {
    /// Working point name.
    pub wp: &'a str,
    /// Lower pt breakpoint.
    pub pt_low: u64,
    /// Upper pt breakpoint.
    pub pt_high: u64,
}

/// Parse `"{WP}_pt{low}to{high}"`.
///
/// The WP name may itself contain underscores; the split happens at the last
/// one.
pub fn parse_result_key(key: &str) -> Result<ResultKey<'_>> {
    let malformed = || {
        Error::MalformedConfig(format!(
            "unparsable results key '{key}': expected '{{WP}}_pt{{low}}to{{high}}'"
        ))
    };
    let (wp, range) = key.rsplit_once('_').ok_or_else(malformed)?;
    let (low, high) =
        range.strip_prefix("pt").and_then(|r| r.split_once("to")).ok_or_else(malformed)?;
    let pt_low: u64 = low.parse().map_err(|_| malformed())?;
    let pt_high: u64 = high.parse().map_err(|_| malformed())?;
    if wp.is_empty() || pt_low >= pt_high {
        return Err(malformed());
    }
    Ok(ResultKey { wp, pt_low, pt_high })
}

/// Structured (WP index, pt-bin index) key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalibKey {
    /// Row: index into [`WorkingPointConfig`].
    pub wp: usize,
    /// Column: index into [`PtBinSet`].
    pub pt: usize,
}

/// Both binning axes, resolved together.
#[derive(Debug, Clone, PartialEq)]
pub struct Binning {
    wps: WorkingPointConfig,
    pts: PtBinSet,
}

impl Binning {
    /// Combine the two axes.
    pub fn new(wps: WorkingPointConfig, pts: PtBinSet) -> Self {
        Self { wps, pts }
    }

    /// Working-point axis.
    pub fn wps(&self) -> &WorkingPointConfig {
        &self.wps
    }

    /// Pt axis.
    pub fn pts(&self) -> &PtBinSet {
        &self.pts
    }

    /// Number of WP×pt cells.
    pub fn n_cells(&self) -> usize {
        self.wps.len() * self.pts.len()
    }

    /// Flat row-major index of a key.
    pub fn cell_index(&self, key: CalibKey) -> usize {
        key.wp * self.pts.len() + key.pt
    }

    /// Resolve a (score, pt) pair.
    ///
    /// The WP axis is resolved first, so a pair that misses both axes reports
    /// [`Error::ScoreOutOfRange`].
    pub fn resolve(&self, score: f64, pt: f64) -> Result<CalibKey> {
        let wp = self.wps.resolve(score).ok_or(Error::ScoreOutOfRange { score })?;
        let pt = self.pts.resolve(pt)?;
        Ok(CalibKey { wp, pt })
    }

    /// Serialized `"{WP}_pt{low}to{high}"` form of a key.
    pub fn key_name(&self, key: CalibKey) -> String {
        match (self.wps.get(key.wp), self.pts.bin(key.pt)) {
            (Some(wp), Some(bin)) => format!("{}_{}", wp.name, bin.key()),
            _ => format!("<invalid cell {}x{}>", key.wp, key.pt),
        }
    }
}
