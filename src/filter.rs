//! Linear recursive filters: coefficient storage, application and the
//! Butterworth high-pass used to condition raw signals.
use std::f64::consts::PI;

use crate::error::{FdepsdError, Result};

/// Numerator `b` and denominator `a` of a rational transfer function in `z^-1`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCoefficients {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

impl FilterCoefficients {
    pub fn new(b: Vec<f64>, a: Vec<f64>) -> Self {
        FilterCoefficients { b, a }
    }

    /// Filters `x` with zero initial conditions (transposed direct form II).
    ///
    /// The coefficients are normalised so that `a[0] == 1`.
    pub fn lfilter(&self, x: &[f64]) -> Vec<f64> {
        let a0 = self.a.first().copied().unwrap_or(1.0);
        let n = self.b.len().max(self.a.len());
        let mut b = vec![0.0; n];
        let mut a = vec![0.0; n];
        for (dst, src) in b.iter_mut().zip(&self.b) {
            *dst = src / a0;
        }
        for (dst, src) in a.iter_mut().zip(&self.a) {
            *dst = src / a0;
        }

        let mut y = Vec::with_capacity(x.len());
        if n <= 1 {
            y.extend(x.iter().map(|&xi| b[0] * xi));
            return y;
        }

        let mut z = vec![0.0; n - 1];
        for &xi in x {
            let yi = b[0] * xi + z[0];
            for k in 0..n - 2 {
                z[k] = b[k + 1] * xi + z[k + 1] - a[k + 1] * yi;
            }
            z[n - 2] = b[n - 1] * xi - a[n - 1] * yi;
            y.push(yi);
        }
        y
    }

    /// Magnitude of the frequency response at normalised angular frequency `w` (rad/sample).
    pub fn gain(&self, w: f64) -> f64 {
        let eval = |c: &[f64]| {
            let (re, im) = c.iter().enumerate().fold((0.0, 0.0), |(re, im), (k, &ck)| {
                let phase = -w * k as f64;
                (re + ck * phase.cos(), im + ck * phase.sin())
            });
            (re * re + im * im).sqrt()
        };
        eval(&self.b) / eval(&self.a)
    }
}

fn polymul(p: &[f64], q: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; p.len() + q.len() - 1];
    for (i, &pi) in p.iter().enumerate() {
        for (j, &qj) in q.iter().enumerate() {
            out[i + j] += pi * qj;
        }
    }
    out
}

/// Designs a 3rd order Butterworth high-pass filter with cutoff `cutoff` Hz.
///
/// Bilinear transform with frequency pre-warping; the analog prototype is
/// split into a first order and a second order section which are then
/// multiplied into a single `(b, a)` pair.
pub fn butter3_highpass(cutoff: f64, sr: f64) -> Result<FilterCoefficients> {
    let wn = cutoff / (sr / 2.0);
    if !(wn > 0.0 && wn < 1.0) {
        return Err(FdepsdError::invalid(format!(
            "high-pass cutoff must be in (0, {}) Hz, got {}",
            sr / 2.0,
            cutoff
        )));
    }
    // warped cutoff relative to the bilinear constant 2*sr
    let r = (PI * cutoff / sr).tan();

    let d = 1.0 + r;
    let b1 = [1.0 / d, -1.0 / d];
    let a1 = [1.0, (r - 1.0) / d];

    let d0 = 1.0 + r + r * r;
    let b2 = [1.0 / d0, -2.0 / d0, 1.0 / d0];
    let a2 = [1.0, 2.0 * (r * r - 1.0) / d0, (1.0 - r + r * r) / d0];

    Ok(FilterCoefficients::new(polymul(&b1, &b2), polymul(&a1, &a2)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lfilter_first_order_recursion() {
        let filt = FilterCoefficients::new(vec![1.0], vec![1.0, -0.5]);
        let y = filt.lfilter(&[1.0, 0.0, 0.0, 0.0]);
        let expected = [1.0, 0.5, 0.25, 0.125];
        for (yi, ei) in y.iter().zip(expected.iter()) {
            assert_relative_eq!(yi, ei, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_lfilter_normalises_leading_denominator() {
        let filt = FilterCoefficients::new(vec![2.0, 2.0], vec![2.0]);
        let y = filt.lfilter(&[1.0, 2.0, 3.0]);
        assert_eq!(y, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_butter3_highpass_gains() {
        let filt = butter3_highpass(5.0, 1000.0).unwrap();
        assert_eq!(filt.b.len(), 4);
        assert_eq!(filt.a.len(), 4);
        // blocks DC, passes Nyquist, -3 dB at the cutoff
        assert_relative_eq!(filt.gain(0.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(filt.gain(PI), 1.0, epsilon = 1e-9);
        let wc = 2.0 * PI * 5.0 / 1000.0;
        assert_relative_eq!(filt.gain(wc), 0.5_f64.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn test_butter3_highpass_rejects_bad_cutoff() {
        assert!(butter3_highpass(600.0, 1000.0).is_err());
        assert!(butter3_highpass(0.0, 1000.0).is_err());
    }
}
