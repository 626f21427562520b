use crate::error::{FdepsdError, Result};

/// One rainflow cycle. Half cycles carry a count of 0.5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cycle {
    /// Half of the cycle range.
    pub amp: f64,
    pub mean: f64,
    pub count: f64,
}

impl Cycle {
    fn between(a: f64, b: f64, count: f64) -> Self {
        Cycle { amp: (a - b).abs() / 2.0, mean: (a + b) / 2.0, count }
    }
}

/// Reduces a response history to the cycle list used for binning.
pub trait CycleExtractor: Send + Sync {
    fn extract(&self, history: &[f64]) -> Result<Vec<Cycle>>;
}

/// Turning point search followed by ASTM E1049 rainflow counting.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rainflow;

impl CycleExtractor for Rainflow {
    fn extract(&self, history: &[f64]) -> Result<Vec<Cycle>> {
        let peaks: Vec<f64> = find_turning_points(history).into_iter().map(|i| history[i]).collect();
        Ok(rainflow(&peaks))
    }
}

/// Indices of the alternating peaks and valleys of `x`.
///
/// The first and last samples are always included; flat runs count once.
pub fn find_turning_points(x: &[f64]) -> Vec<usize> {
    let n = x.len();
    if n < 3 {
        return (0..n).collect();
    }
    let mut ind = vec![0];
    let mut slope = 0.0_f64;
    let mut last_change = 0;
    for i in 1..n {
        let dy = x[i] - x[i - 1];
        if dy == 0.0 {
            continue;
        }
        if slope != 0.0 && dy.signum() != slope.signum() {
            ind.push(last_change);
        }
        slope = dy;
        last_change = i;
    }
    if *ind.last().unwrap_or(&0) != n - 1 {
        ind.push(n - 1);
    }
    ind
}

/// Three point rainflow count over a sequence of turning points.
///
/// Cycles are reported in the order they close; residual ranges left on the
/// stack become half cycles at the end.
pub fn rainflow(peaks: &[f64]) -> Vec<Cycle> {
    let mut cycles = Vec::new();
    let mut stack: Vec<f64> = Vec::with_capacity(peaks.len());

    for &p in peaks {
        stack.push(p);
        while stack.len() >= 3 {
            let n = stack.len();
            let x = (stack[n - 1] - stack[n - 2]).abs();
            let y = (stack[n - 2] - stack[n - 3]).abs();
            if x < y {
                break;
            }
            if n == 3 {
                cycles.push(Cycle::between(stack[0], stack[1], 0.5));
                stack.remove(0);
            } else {
                cycles.push(Cycle::between(stack[n - 3], stack[n - 2], 1.0));
                stack.drain(n - 3..n - 1);
            }
        }
    }
    cycles.extend(stack.windows(2).map(|w| Cycle::between(w[0], w[1], 0.5)));
    cycles
}

/// Largest cycle amplitude; fails on an empty list.
pub fn max_amplitude(cycles: &[Cycle], freq: f64) -> Result<f64> {
    if cycles.is_empty() {
        return Err(FdepsdError::NoCycles { freq });
    }
    Ok(crate::sdof::nanmax(cycles.iter().map(|c| c.amp)))
}
