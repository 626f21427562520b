//! Cosine tapering of signal ends.
use std::f64::consts::PI;
use std::str::FromStr;

use crate::error::FdepsdError;

/// Which end(s) of the signal get tapered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ends {
    Front,
    Back,
    Both,
    None,
}

impl FromStr for Ends {
    type Err = FdepsdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "front" => Ok(Ends::Front),
            "back" => Ok(Ends::Back),
            "both" => Ok(Ends::Both),
            "none" => Ok(Ends::None),
            _ => Err(FdepsdError::invalid(format!(
                "ends must be front, back, both or none, got {}",
                s
            ))),
        }
    }
}

/// Parameters of the end window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowEnds {
    /// Taper length: a number of points if `>= 1`, otherwise a fraction of the signal length.
    pub portion: f64,
    pub ends: Ends,
}

impl WindowEnds {
    pub fn front(portion: f64) -> Self {
        WindowEnds { portion, ends: Ends::Front }
    }

    /// Number of points in the taper for a signal of length `len`.
    pub fn points(&self, len: usize) -> usize {
        let n = if self.portion >= 1.0 {
            self.portion as usize
        } else {
            (self.portion * len as f64) as usize
        };
        n.max(3).min(len)
    }

    /// Returns a tapered copy of `sig`.
    pub fn apply(&self, sig: &[f64]) -> Vec<f64> {
        let mut out = sig.to_vec();
        let n = self.points(sig.len());
        if n < 2 || self.ends == Ends::None {
            return out;
        }
        let taper: Vec<f64> = (0..n)
            .map(|i| 0.5 - 0.5 * (PI * i as f64 / (n - 1) as f64).cos())
            .collect();
        let len = out.len();
        if matches!(self.ends, Ends::Front | Ends::Both) {
            for (v, w) in out.iter_mut().zip(&taper) {
                *v *= w;
            }
        }
        if matches!(self.ends, Ends::Back | Ends::Both) {
            for (i, w) in taper.iter().enumerate() {
                out[len - 1 - i] *= w;
            }
        }
        out
    }
}

/// End-window policy used during conditioning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WinEnds {
    Disabled,
    /// Front taper of `min(0.25 s, 50)` points.
    Auto,
    Explicit(WindowEnds),
}

impl WinEnds {
    /// Resolves the policy into concrete window parameters for sample rate `sr`.
    pub fn resolve(&self, sr: f64) -> Option<WindowEnds> {
        match self {
            WinEnds::Disabled => None,
            WinEnds::Auto => Some(WindowEnds::front(((0.25 * sr) as usize).min(50) as f64)),
            WinEnds::Explicit(w) => Some(*w),
        }
    }
}
