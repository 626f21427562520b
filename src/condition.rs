//! Prepares the raw signal for the frequency loop: optional high-pass
//! filtering, end tapering and roll-off compensation.
use log::info;

use crate::error::{FdepsdError, Result};
use crate::filter::butter3_highpass;
use crate::rolloff::RollOff;
use crate::window::WinEnds;

/// Length of the constant lead-in used to absorb the high-pass start-up transient.
const HIGHPASS_BUFFER_SECONDS: f64 = 0.25;

/// Conditioning settings.
#[derive(Debug, Clone)]
pub struct Conditioning {
    /// High-pass cutoff in Hz, or `None` to skip filtering.
    pub hpfilter: Option<f64>,
    pub winends: WinEnds,
    pub rolloff: RollOff,
    /// Minimum points per cycle at the highest analysis frequency.
    pub ppc: f64,
}

/// Signal actually fed to the oscillators.
#[derive(Debug, Clone)]
pub struct Conditioned {
    pub sig: Vec<f64>,
    pub sr: f64,
}

/// High-pass filters `sig` after prepending `0.25 s` of its first value, then drops the lead-in.
pub fn highpass(sig: &[f64], sr: f64, cutoff: f64) -> Result<Vec<f64>> {
    let filt = butter3_highpass(cutoff, sr)?;
    let n = (HIGHPASS_BUFFER_SECONDS * sr) as usize;
    let mut padded = Vec::with_capacity(n + sig.len());
    padded.resize(n, sig.first().copied().unwrap_or(0.0));
    padded.extend_from_slice(sig);
    let mut out = filt.lfilter(&padded);
    Ok(out.split_off(n))
}

impl Conditioning {
    /// Applies the conditioning chain for analysis frequencies up to `max_freq`.
    pub fn apply(&self, sig: &[f64], sr: f64, max_freq: f64) -> Result<Conditioned> {
        let mut sig = match self.hpfilter {
            Some(cutoff) => {
                info!("High pass filtering @ {} Hz", cutoff);
                highpass(sig, sr, cutoff)?
            }
            None => sig.to_vec(),
        };

        if let Some(window) = self.winends.resolve(sr) {
            sig = window.apply(&sig);
        }

        let curppc = sr / max_freq;
        let (sig, sr) = match &self.rolloff {
            RollOff::Prefilter => self.rolloff.apply(&sig, sr, self.ppc, max_freq)?,
            RollOff::None => (sig, sr),
            rolloff if curppc < self.ppc => {
                info!(
                    "Using {} method to increase sample rate (have only {} pts/cycle @ {} Hz)",
                    rolloff.name(),
                    curppc,
                    max_freq
                );
                let (sig, sr) = rolloff.apply(&sig, sr, self.ppc, max_freq)?;
                if !(sr > 0.0) || sig.is_empty() {
                    return Err(FdepsdError::RollOff(format!(
                        "{} returned {} samples at sample rate {}",
                        rolloff.name(),
                        sig.len(),
                        sr
                    )));
                }
                info!("After interpolation, have {} pts/cycle @ {} Hz", sr / max_freq, max_freq);
                (sig, sr)
            }
            _ => (sig, sr),
        };
        Ok(Conditioned { sig, sr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{Ends, WindowEnds};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn plain(rolloff: RollOff) -> Conditioning {
        Conditioning { hpfilter: None, winends: WinEnds::Disabled, rolloff, ppc: 12.0 }
    }

    #[test]
    fn test_highpass_removes_offset_without_startup_transient() {
        let sr = 1000.0;
        let sig: Vec<f64> = (0..4000).map(|i| 3.0 + (2.0 * PI * 50.0 * i as f64 / sr).sin()).collect();
        let out = highpass(&sig, sr, 5.0).unwrap();
        assert_eq!(out.len(), sig.len());
        // the lead-in holds the offset, so the filter has settled by the first real sample
        assert!(out[0].abs() < 0.5);
        let mean: f64 = out[2000..].iter().sum::<f64>() / 2000.0;
        assert!(mean.abs() < 1e-2);
    }

    #[test]
    fn test_rolloff_only_when_ppc_not_met() {
        let sig = vec![0.0, 1.0, 0.0, -1.0, 0.0, 1.0];
        let out = plain(RollOff::Linear).apply(&sig, 100.0, 5.0).unwrap();
        assert_eq!(out.sr, 100.0);
        assert_eq!(out.sig, sig);
        let out = plain(RollOff::Linear).apply(&sig, 100.0, 20.0).unwrap();
        assert_eq!(out.sr, 300.0);
        assert_eq!(out.sig.len(), 18);
        let out = plain(RollOff::None).apply(&sig, 100.0, 20.0).unwrap();
        assert_eq!(out.sr, 100.0);
    }

    #[test]
    fn test_prefilter_ignores_ppc() {
        let sig = vec![1.0, 1.0, 1.0, 1.0];
        let out = plain(RollOff::Prefilter).apply(&sig, 100.0, 1.0).unwrap();
        assert_eq!(out.sr, 100.0);
        for v in out.sig {
            assert_relative_eq!(v, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_window_applied() {
        let mut cond = plain(RollOff::None);
        cond.winends = WinEnds::Explicit(WindowEnds { portion: 4.0, ends: Ends::Front });
        let out = cond.apply(&[1.0; 8], 100.0, 1.0).unwrap();
        assert_relative_eq!(out.sig[1], 0.25, epsilon = 1e-12);
        assert_eq!(out.sig[7], 1.0);
    }

    #[test]
    fn test_custom_rolloff_failure_surfaces() {
        let cond = plain(RollOff::custom(|_sig, _sr, _ppc, _frq| Ok((Vec::new(), 0.0))));
        assert!(matches!(cond.apply(&[1.0, 2.0, 3.0], 10.0, 5.0), Err(FdepsdError::RollOff(_))));
    }
}
