//! Piecewise-constant 2-D lookup over a rectangular grid of bins.
//!
//! A point `(x, y)` maps to the cell whose edges bracket it. Bin `i` covers
//! `[edges[i], edges[i + 1])`. Points outside the edges clamp to the
//! boundary bins:
//!
//! | input               | bin          |
//! |---------------------|--------------|
//! | `x < edges[0]`      | first        |
//! | `x >= edges[last]`  | last         |
//! | `x == edges[i]`     | `i`          |
//! | `NaN`               | last         |
//!
//! This matches a right-sided sorted search followed by clipping, so a NaN
//! sorts past every edge.

use sf_core::{Error, Result};

/// Bin index of `x` along `edges` (at least two strictly increasing edges).
pub fn find_bin(edges: &[f64], x: f64) -> usize {
    let last = edges.len().saturating_sub(2);
    if x.is_nan() {
        return last;
    }
    edges.partition_point(|&e| e <= x).saturating_sub(1).min(last)
}

fn validate_edges(edges: &[f64], axis: &str) -> Result<()> {
    if edges.len() < 2 {
        return Err(Error::MalformedConfig(format!(
            "{axis} axis needs at least two edges, got {}",
            edges.len()
        )));
    }
    if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::MalformedConfig(format!(
            "{axis} edges must be finite and strictly increasing: {edges:?}"
        )));
    }
    Ok(())
}

/// Dense 2-D step function.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLookup {
    x_edges: Vec<f64>,
    y_edges: Vec<f64>,
    /// Row-major `(n_x, n_y)`.
    values: Vec<f64>,
}

impl DenseLookup {
    /// Build from edges and row-major values of shape `(x_edges - 1, y_edges - 1)`.
    pub fn new(x_edges: Vec<f64>, y_edges: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        validate_edges(&x_edges, "x")?;
        validate_edges(&y_edges, "y")?;
        let expected = (x_edges.len() - 1) * (y_edges.len() - 1);
        if values.len() != expected {
            return Err(Error::MalformedConfig(format!(
                "dense lookup expects {expected} values for {}x{} bins, got {}",
                x_edges.len() - 1,
                y_edges.len() - 1,
                values.len()
            )));
        }
        Ok(Self { x_edges, y_edges, values })
    }

    /// `(n_x_bins, n_y_bins)`
    pub fn shape(&self) -> (usize, usize) {
        (self.x_edges.len() - 1, self.y_edges.len() - 1)
    }

    /// Edges along the first axis.
    pub fn x_edges(&self) -> &[f64] {
        &self.x_edges
    }

    /// Edges along the second axis.
    pub fn y_edges(&self) -> &[f64] {
        &self.y_edges
    }

    /// Stored value of cell `(ix, iy)`.
    pub fn cell(&self, ix: usize, iy: usize) -> Option<f64> {
        let (nx, ny) = self.shape();
        if ix >= nx || iy >= ny {
            return None;
        }
        Some(self.values[ix * ny + iy])
    }

    /// Value at a single point.
    pub fn value(&self, x: f64, y: f64) -> f64 {
        let ny = self.y_edges.len() - 1;
        let ix = find_bin(&self.x_edges, x);
        let iy = find_bin(&self.y_edges, y);
        self.values[ix * ny + iy]
    }

    /// Values at many points; always a fresh array.
    pub fn evaluate(&self, xs: &[f64], ys: &[f64]) -> Result<Vec<f64>> {
        if xs.len() != ys.len() {
            return Err(Error::ShapeMismatch { scores: xs.len(), pts: ys.len() });
        }
        Ok(xs.iter().zip(ys).map(|(&x, &y)| self.value(x, y)).collect())
    }
}
