//! Linear amplitude bins with cumulative rainflow counts.
use std::cmp::Ordering;

use crate::rainflow::Cycle;

/// Fills `edges` with the lower bin edges `amax * i / nbins`.
pub fn fill_edges(amax: f64, edges: &mut [f64]) {
    let nbins = edges.len() as f64;
    for (i, e) in edges.iter_mut().enumerate() {
        *e = (i as f64 / nbins) * amax;
    }
}

/// Fills `counts[i]` with the total count of cycles whose amplitude is `>= edges[i]`.
///
/// `edges` must be ascending.
pub fn fill_cumulative(cycles: &[Cycle], edges: &[f64], counts: &mut [f64]) {
    let mut sorted: Vec<(f64, f64)> = cycles.iter().map(|c| (c.amp, c.count)).collect();
    sorted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let mut total = 0.0;
    let mut next = 0;
    for (edge, count) in edges.iter().zip(counts.iter_mut()).rev() {
        while next < sorted.len() && sorted[next].0 >= *edge {
            total += sorted[next].1;
            next += 1;
        }
        *count = total;
    }
}

/// Per-bin counts from cumulative counts; the top bin keeps its cumulative value.
pub fn noncumulative(cumulative: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = cumulative.windows(2).map(|w| w[0] - w[1]).collect();
    if let Some(&last) = cumulative.last() {
        out.push(last);
    }
    out
}

/// One frequency's bins, borrowed from the stacked tables.
#[derive(Debug, Clone, Copy)]
pub struct BinTable<'a> {
    pub edges: &'a [f64],
    pub cumulative: &'a [f64],
}

impl<'a> BinTable<'a> {
    pub fn new(edges: &'a [f64], cumulative: &'a [f64]) -> Self {
        BinTable { edges, cumulative }
    }

    pub fn noncumulative(&self) -> Vec<f64> {
        noncumulative(self.cumulative)
    }

    pub fn total(&self) -> f64 {
        self.cumulative.first().copied().unwrap_or(0.0)
    }
}
