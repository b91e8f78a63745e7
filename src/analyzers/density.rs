//! Sparse 2D histogram compression for density plots.
//!
//! Bins two activity measures on an equal-width grid spanning their observed
//! ranges and keeps only the cells that reach a minimum count, so the output
//! never exceeds `x_bins * y_bins` rows however many activities go in.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::activity::{ActivityRecord, Measure};
use crate::analyzers::types::{DensityCell, DensityTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityParams {
    pub x_bins: usize,
    pub y_bins: usize,
    pub min_count: u64,
}

impl Default for DensityParams {
    fn default() -> Self {
        Self {
            x_bins: 100,
            y_bins: 100,
            min_count: 1,
        }
    }
}

/// Equal-width bins over a closed range.
struct Axis {
    edges: Vec<f64>,
}

impl Axis {
    /// A degenerate range (all values equal) is widened by 0.5 on each side.
    fn spanning(values: &[f64], bins: usize) -> Self {
        let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }

        let step = (hi - lo) / bins as f64;
        let mut edges: Vec<f64> = (0..bins).map(|k| lo + step * k as f64).collect();
        edges.push(hi);

        Self { edges }
    }

    fn bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Bin holding `v`; the last bin is closed on the right.
    fn index(&self, v: f64) -> usize {
        let bins = self.bins();
        let lo = self.edges[0];
        let hi = self.edges[bins];

        let mut i = (((v - lo) / (hi - lo)) * bins as f64) as usize;
        i = i.min(bins - 1);

        // Float rounding can land one bin off the edge array.
        if i > 0 && v < self.edges[i] {
            i -= 1;
        } else if i + 1 < bins && v >= self.edges[i + 1] {
            i += 1;
        }
        i
    }

    fn center(&self, i: usize) -> f64 {
        (self.edges[i] + self.edges[i + 1]) / 2.0
    }
}

/// Counts `(xs[k], ys[k])` pairs on an `x_bins` by `y_bins` grid and emits
/// every cell with `count >= min_count`, x-major.
///
/// Empty input (or a zero-sized grid) yields no cells.
pub fn histogram_cells(xs: &[f64], ys: &[f64], params: &DensityParams) -> Vec<DensityCell> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .unzip();

    if xs.is_empty() || params.x_bins == 0 || params.y_bins == 0 {
        return Vec::new();
    }

    let x_axis = Axis::spanning(&xs, params.x_bins);
    let y_axis = Axis::spanning(&ys, params.y_bins);

    let mut counts = vec![0u64; params.x_bins * params.y_bins];
    for (x, y) in xs.iter().zip(&ys) {
        counts[x_axis.index(*x) * params.y_bins + y_axis.index(*y)] += 1;
    }

    let min_count = params.min_count.max(1);
    let mut cells = Vec::new();
    for i in 0..params.x_bins {
        for j in 0..params.y_bins {
            let count = counts[i * params.y_bins + j];
            if count >= min_count {
                cells.push(DensityCell {
                    x: x_axis.center(i),
                    y: y_axis.center(j),
                    count,
                });
            }
        }
    }

    cells
}

/// Compresses the joint distribution of two measures into a [`DensityTable`].
pub fn compress(
    records: &[ActivityRecord],
    x: Measure,
    y: Measure,
    params: &DensityParams,
) -> DensityTable {
    let xs: Vec<f64> = records.iter().map(|r| x.value(r)).collect();
    let ys: Vec<f64> = records.iter().map(|r| y.value(r)).collect();

    let cells = histogram_cells(&xs, &ys, params);
    debug!(
        input = records.len(),
        cells = cells.len(),
        x = x.column(),
        y = y.column(),
        "Density table compressed"
    );

    DensityTable { x, y, cells }
}
