//! Strategies that compensate for the SDOF response roll-off when the
//! highest analysis frequency has too few points per cycle.
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rustfft::{num_complex::Complex, FftPlanner};

use crate::error::{FdepsdError, Result};

/// Signature of a user supplied roll-off function: `(sig, sr, ppc, f_max) -> (sig, sr)`.
pub type RollOffFn = dyn Fn(&[f64], f64, f64, f64) -> Result<(Vec<f64>, f64)> + Send + Sync;

/// Number of Lanczos lobes on each side of an interpolated point.
const LANCZOS_POINTS: usize = 10;

#[derive(Clone)]
pub enum RollOff {
    /// FFT zero-padding resample.
    Fft,
    /// Lanczos kernel interpolation.
    Lanczos,
    /// High frequency gain correction; ignores `ppc` and keeps the sample rate.
    Prefilter,
    /// Linear interpolation; only useful as a reference case.
    Linear,
    None,
    Custom(Arc<RollOffFn>),
}

impl fmt::Debug for RollOff {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for RollOff {
    type Err = FdepsdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fft" => Ok(RollOff::Fft),
            "lanczos" => Ok(RollOff::Lanczos),
            "prefilter" => Ok(RollOff::Prefilter),
            "linear" => Ok(RollOff::Linear),
            "none" => Ok(RollOff::None),
            _ => Err(FdepsdError::invalid(format!(
                "rolloff must be fft, lanczos, prefilter, linear or none, got {}",
                s
            ))),
        }
    }
}

impl RollOff {
    pub fn custom<F>(func: F) -> Self
    where
        F: Fn(&[f64], f64, f64, f64) -> Result<(Vec<f64>, f64)> + Send + Sync + 'static,
    {
        RollOff::Custom(Arc::new(func))
    }

    pub fn name(&self) -> &'static str {
        match self {
            RollOff::Fft => "fft",
            RollOff::Lanczos => "lanczos",
            RollOff::Prefilter => "prefilter",
            RollOff::Linear => "linear",
            RollOff::None => "none",
            RollOff::Custom(_) => "custom",
        }
    }

    /// Applies the strategy, returning the new signal and sample rate.
    pub fn apply(&self, sig: &[f64], sr: f64, ppc: f64, frq: f64) -> Result<(Vec<f64>, f64)> {
        if let RollOff::Custom(func) = self {
            return func(sig, sr, ppc, frq);
        }
        if sig.len() < 2 {
            return Ok((sig.to_vec(), sr));
        }
        let factor = upsample_factor(sr, ppc, frq);
        match self {
            RollOff::Fft => Ok((fft_resample(sig, factor * sig.len()), sr * factor as f64)),
            RollOff::Lanczos => Ok((lanczos_upsample(sig, factor), sr * factor as f64)),
            RollOff::Linear => Ok((linear_upsample(sig, factor), sr * factor as f64)),
            RollOff::Prefilter => Ok((prefilter(sig, sr, frq), sr)),
            RollOff::None | RollOff::Custom(_) => Ok((sig.to_vec(), sr)),
        }
    }
}

/// Integer factor that lifts `sr / frq` to at least `ppc` points per cycle.
pub fn upsample_factor(sr: f64, ppc: f64, frq: f64) -> usize {
    let curppc = sr / frq;
    ((ppc / curppc).ceil() as usize).max(1)
}

/// Resamples `sig` to `num` points by zero-padding its spectrum.
pub fn fft_resample(sig: &[f64], num: usize) -> Vec<f64> {
    let n = sig.len();
    let mut planner = FftPlanner::<f64>::new();
    let mut spec: Vec<Complex<f64>> = sig.iter().map(|&x| Complex::new(x, 0.0)).collect();
    planner.plan_fft_forward(n).process(&mut spec);

    let mut padded = vec![Complex::new(0.0, 0.0); num];
    let keep = (n + 1) / 2;
    padded[..keep].copy_from_slice(&spec[..keep]);
    for k in 1..keep {
        padded[num - k] = spec[n - k];
    }
    if n % 2 == 0 {
        if num > n {
            // split the Nyquist bin between the two halves
            let half = spec[n / 2] * 0.5;
            padded[n / 2] = half;
            padded[num - n / 2] = half;
        } else {
            padded[n / 2] = spec[n / 2];
        }
    }

    planner.plan_fft_inverse(num).process(&mut padded);
    let scale = 1.0 / n as f64;
    padded.iter().map(|c| c.re * scale).collect()
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = PI * x;
        px.sin() / px
    }
}

fn lanczos_kernel(x: f64, lobes: usize) -> f64 {
    if x.abs() >= lobes as f64 {
        0.0
    } else {
        sinc(x) * sinc(x / lobes as f64)
    }
}

/// Upsamples by an integer factor with a Lanczos kernel; original samples are kept exactly.
pub fn lanczos_upsample(sig: &[f64], factor: usize) -> Vec<f64> {
    let n = sig.len();
    let lobes = LANCZOS_POINTS as isize;
    let mut out = Vec::with_capacity(n * factor);
    for m in 0..n * factor {
        let i0 = m / factor;
        let frac = (m % factor) as f64 / factor as f64;
        if frac == 0.0 {
            out.push(sig[i0]);
            continue;
        }
        let lo = (i0 as isize - lobes + 1).max(0);
        let hi = (i0 as isize + lobes).min(n as isize - 1);
        let value = (lo..=hi)
            .map(|k| sig[k as usize] * lanczos_kernel(i0 as f64 + frac - k as f64, LANCZOS_POINTS))
            .sum();
        out.push(value);
    }
    out
}

/// Upsamples by an integer factor with linear interpolation, holding the last value.
pub fn linear_upsample(sig: &[f64], factor: usize) -> Vec<f64> {
    let n = sig.len();
    (0..n * factor)
        .map(|m| {
            let i0 = m / factor;
            let frac = (m % factor) as f64 / factor as f64;
            if i0 + 1 < n {
                sig[i0] + frac * (sig[i0 + 1] - sig[i0])
            } else {
                sig[n - 1]
            }
        })
        .collect()
}

/// Zero-phase 3-tap gain correction `[-k, 1 + 2k, -k]`.
///
/// `k` is chosen so the boost cancels the `sinc^2` attenuation of the
/// ramp-invariant response at `frq`.
pub fn prefilter(sig: &[f64], sr: f64, frq: f64) -> Vec<f64> {
    let w = 2.0 * PI * frq / sr;
    let loss = sinc(frq / sr).powi(2);
    let k = (1.0 / loss - 1.0) / (2.0 * (1.0 - w.cos()));
    let n = sig.len();
    (0..n)
        .map(|i| {
            let prev = sig[i.saturating_sub(1)];
            let next = sig[(i + 1).min(n - 1)];
            (1.0 + 2.0 * k) * sig[i] - k * (prev + next)
        })
        .collect()
}
