//! G1/G2 bounding curves in the `ln(count)` versus `amplitude^2` plane.
use crate::bins::BinTable;

/// Squared amplitude at which the G2 line reaches a count of one.
///
/// The G1 line runs from `(0, ln(total))` to `(amax^2, 0)`. Bins below
/// `amax/3` are ignored. If any retained bin lies above the G1 line, the line
/// from `(0, ln(total))` through the steepest such point is extended to its
/// x-intercept; otherwise the result is `amax^2`.
pub fn g2max(bins: &BinTable, amax: f64) -> f64 {
    let x2 = amax * amax;
    if x2 == 0.0 {
        return x2;
    }
    let y1 = bins.total().ln();

    let mut best: Option<(f64, f64, f64)> = None;
    for (&edge, &count) in bins.edges.iter().zip(bins.cumulative) {
        if edge < amax / 3.0 {
            continue;
        }
        let x = edge * edge;
        let y = count.ln();
        let g1y = y1 * (1.0 - x / x2);
        let tantheta = (y - g1y) / x;
        match best {
            Some((t, _, _)) if !(tantheta > t) => {}
            _ => best = Some((tantheta, x, y)),
        }
    }

    match best {
        Some((tantheta, x, y)) if tantheta > 0.0 => x * y1 / (y1 - y),
        _ => x2,
    }
}
