//! Single degree of freedom (SDOF) oscillator responses to base acceleration.
//!
//! Filter coefficients come from a ramp-invariant discretisation of the
//! oscillator transfer function, so the response is exact for a signal that
//! varies linearly between samples.
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::FdepsdError;
use crate::filter::FilterCoefficients;

/// Produces recursive filter coefficients for one oscillator.
pub trait CoefficientGenerator: Send + Sync {
    /// Coefficients for quality factor `q`, time step `dt` and angular frequency `wn`.
    fn coefficients(&self, q: f64, dt: f64, wn: f64) -> FilterCoefficients;
}

/// The response quantity the damage calculation is based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseModel {
    /// Absolute acceleration.
    AbsAcce,
    /// Pseudo velocity, `wn` times the relative displacement.
    PVelo,
}

impl fmt::Display for ResponseModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResponseModel::AbsAcce => write!(f, "absacce"),
            ResponseModel::PVelo => write!(f, "pvelo"),
        }
    }
}

impl FromStr for ResponseModel {
    type Err = FdepsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absacce" => Ok(ResponseModel::AbsAcce),
            "pvelo" => Ok(ResponseModel::PVelo),
            _ => Err(FdepsdError::invalid(format!(
                "resp must be 'absacce' or 'pvelo', got '{}'",
                s
            ))),
        }
    }
}

/// Shared terms of the ramp-invariant discretisation.
struct Discrete {
    zeta: f64,
    wd: f64,
    /// `exp(-zeta*wn*dt)`
    e: f64,
    /// `E*cos(wd*dt)`
    c: f64,
    /// `E*sin(wd*dt)`
    s: f64,
}

impl Discrete {
    fn new(q: f64, dt: f64, wn: f64) -> Self {
        let zeta = 1.0 / (2.0 * q);
        let wd = wn * (1.0 - zeta * zeta).sqrt();
        let e = (-zeta * wn * dt).exp();
        let k = wd * dt;
        Discrete { zeta, wd, e, c: e * k.cos(), s: e * k.sin() }
    }

    fn denominator(&self) -> Vec<f64> {
        vec![1.0, -2.0 * self.c, self.e * self.e]
    }
}

fn absacce_coefficients(q: f64, dt: f64, wn: f64) -> FilterCoefficients {
    let d = Discrete::new(q, dt, wn);
    let sp = d.s / (d.wd * dt);
    let b = vec![1.0 - sp, 2.0 * (sp - d.c), d.e * d.e - sp];
    FilterCoefficients::new(b, d.denominator())
}

/// Relative displacement `-1/(s^2 + 2 zeta wn s + wn^2)`.
///
/// Partial fractions of `G(s)/s^2` give `A/s + B/s^2 + (Cs + D)/(s^2 + 2 zeta wn s + wn^2)`;
/// the z-transform of the sampled step-of-ramp response times `(z-1)^2/(z dt)`
/// collapses to a second order section.
fn reldisp_coefficients(q: f64, dt: f64, wn: f64) -> FilterCoefficients {
    let d = Discrete::new(q, dt, wn);
    let w2 = wn * wn;
    let a_ = -2.0 * d.zeta / (w2 * wn);
    let b_ = 1.0 / w2;
    let c_ = -a_;
    let d_ = (4.0 * d.zeta * d.zeta - 1.0) / w2;
    let sigma = d.zeta * wn;
    let dp = (d_ - c_ * sigma) / d.wd;

    let alpha = a_ / dt;
    let beta = b_ - alpha;
    let delta = (dp * d.s - c_ * d.c) / dt;
    let e2 = d.e * d.e;

    let b0 = beta - 2.0 * d.c * alpha + delta + 2.0 * alpha;
    let b1 = alpha * e2 - 2.0 * d.c * beta - alpha - 2.0 * delta;
    let b2 = beta * e2 + delta;
    FilterCoefficients::new(vec![-b0, -b1, -b2], d.denominator())
}

impl CoefficientGenerator for ResponseModel {
    fn coefficients(&self, q: f64, dt: f64, wn: f64) -> FilterCoefficients {
        match self {
            ResponseModel::AbsAcce => absacce_coefficients(q, dt, wn),
            ResponseModel::PVelo => {
                let mut coefs = reldisp_coefficients(q, dt, wn);
                coefs.b.iter_mut().for_each(|b| *b *= wn);
                coefs
            }
        }
    }
}

/// Summary of one oscillator's response; the history itself is handed on and dropped.
#[derive(Debug, Clone)]
pub struct SdofResponse {
    pub history: Vec<f64>,
    /// Peak absolute response (the SRS value).
    pub peak: f64,
    /// Unbiased sample variance.
    pub variance: f64,
}

/// Maximum that propagates NaN.
pub(crate) fn nanmax(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, |m, v| if v.is_nan() || m.is_nan() { f64::NAN } else { m.max(v) })
}

fn variance(x: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

/// Computes the base-driven response of the oscillator at angular frequency `wn`.
pub fn sdof_response(
    coeffs: &dyn CoefficientGenerator,
    q: f64,
    dt: f64,
    wn: f64,
    sig: &[f64],
) -> SdofResponse {
    let history = coeffs.coefficients(q, dt, wn).lfilter(sig);
    let peak = nanmax(history.iter().map(|v| v.abs()));
    let variance = variance(&history);
    SdofResponse { history, peak, variance }
}

/// Angular frequency for `freq` Hz.
pub fn omega(freq: f64) -> f64 {
    2.0 * PI * freq
}
