//! Fatigue damage equivalent PSD from a base acceleration signal.
//!
//! For every analysis frequency an SDOF oscillator is driven by the
//! conditioned signal, its response is rainflow counted and the counts are
//! binned. From the bins come two amplitude based PSDs (G1 from the largest
//! cycle, G2 from a bounding line in the `ln(count)` versus `amp^2` plane) and
//! three damage based PSDs (G4, G8, G12) that reproduce the flight damage in
//! a `t0` second random test.
//!
//! No checks are made on whether the method suits the data; plotting the
//! counts against `amp^2` and comparing to the Rayleigh line is up to the
//! caller.
use log::info;
use nalgebra::DMatrix;
use serde::Serialize;

use crate::boundary::g2max;
use crate::condition::Conditioning;
use crate::damage::{synthesize, DamageInput, GRow};
use crate::driver::{self, plan_execution, ExecutionMode, ParallelPolicy, Workload};
use crate::error::{FdepsdError, Result};
use crate::rainflow::{CycleExtractor, Rainflow};
use crate::rolloff::RollOff;
use crate::sdof::{CoefficientGenerator, ResponseModel};
use crate::window::WinEnds;

/// Options of a computation; `Default` gives the usual settings.
#[derive(Debug, Clone)]
pub struct FdepsdOptions {
    pub resp: ResponseModel,
    /// High-pass cutoff in Hz; `None` disables the filter.
    pub hpfilter: Option<f64>,
    pub winends: WinEnds,
    /// Number of amplitude bins per frequency.
    pub nbins: usize,
    /// Test duration in seconds.
    pub t0: f64,
    pub rolloff: RollOff,
    pub ppc: f64,
    pub parallel: ParallelPolicy,
    /// Worker cap; `None` uses four fifths of the CPUs.
    pub maxcpu: Option<usize>,
    /// Log per-frequency progress at info level.
    pub verbose: bool,
}

impl Default for FdepsdOptions {
    fn default() -> Self {
        FdepsdOptions {
            resp: ResponseModel::AbsAcce,
            hpfilter: Some(5.0),
            winends: WinEnds::Auto,
            nbins: 300,
            t0: 60.0,
            rolloff: RollOff::Lanczos,
            ppc: 12.0,
            parallel: ParallelPolicy::Auto,
            maxcpu: Some(14),
            verbose: false,
        }
    }
}

impl FdepsdOptions {
    fn conditioning(&self) -> Conditioning {
        Conditioning {
            hpfilter: self.hpfilter,
            winends: self.winends,
            rolloff: self.rolloff.clone(),
            ppc: self.ppc,
        }
    }
}

/// Everything a computation returns. Tables are indexed by the position of
/// the frequency in the input vector.
#[derive(Debug, Clone, Serialize)]
pub struct ResultSet {
    pub freq: Vec<f64>,
    /// G1, G2, G4, G8, G12 PSD levels per frequency.
    pub psd: Vec<GRow>,
    /// Peak SDOF responses implied by each PSD column; G1's is the largest cycle amplitude.
    pub peakamp: Vec<GRow>,
    /// Lower amplitude edge of each bin, `nfreq x nbins`.
    pub binamps: DMatrix<f64>,
    /// Cumulative cycle counts, `nfreq x nbins`; column 0 holds the total.
    pub count: DMatrix<f64>,
    pub var: Vec<f64>,
    /// Raw peak responses.
    pub srs: Vec<f64>,
    pub parallel: ExecutionMode,
    pub ncpu: usize,
    pub resp: ResponseModel,
    /// The conditioned signal fed to the oscillators, and its sample rate.
    pub sig: Vec<f64>,
    pub sr: f64,
}

impl ResultSet {
    /// Number of analysis frequencies.
    pub fn len(&self) -> usize {
        self.freq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freq.is_empty()
    }

    /// Row index of the first frequency equal to `freq`.
    pub fn position(&self, freq: f64) -> Option<usize> {
        self.freq.iter().position(|&f| f == freq)
    }
}

fn validate_inputs(sig: &[f64], sr: f64, freq: &[f64], q: f64, opts: &FdepsdOptions) -> Result<()> {
    if sig.is_empty() {
        return Err(FdepsdError::invalid("`sig` must not be empty"));
    }
    if freq.is_empty() {
        return Err(FdepsdError::invalid("`freq` must not be empty"));
    }
    if !(sr.is_finite() && sr > 0.0) {
        return Err(FdepsdError::invalid(format!("sample rate must be positive, got {}", sr)));
    }
    if let Some(f) = freq.iter().find(|f| !(**f > 0.0)) {
        return Err(FdepsdError::invalid(format!("frequencies must be positive, got {}", f)));
    }
    if !(q > 0.5) {
        return Err(FdepsdError::invalid(format!("Q must be greater than 0.5, got {}", q)));
    }
    if opts.nbins == 0 {
        return Err(FdepsdError::invalid("nbins must be at least 1"));
    }
    if !(opts.t0 > 0.0) {
        return Err(FdepsdError::invalid(format!("T0 must be positive, got {}", opts.t0)));
    }
    if !(opts.ppc > 0.0) {
        return Err(FdepsdError::invalid(format!("ppc must be positive, got {}", opts.ppc)));
    }
    Ok(())
}

/// Computes the fatigue damage equivalent PSDs of `sig` sampled at `sr` Hz.
///
/// `freq` holds the SDOF frequencies in Hz and `q` the dynamic amplification
/// factor `1/(2 zeta)`.
pub fn fdepsd(sig: &[f64], sr: f64, freq: &[f64], q: f64, opts: &FdepsdOptions) -> Result<ResultSet> {
    fdepsd_with(sig, sr, freq, q, opts, &opts.resp, &Rainflow)
}

/// Same as [`fdepsd`] with caller supplied filter coefficients and cycle counting.
pub fn fdepsd_with(
    sig: &[f64],
    sr: f64,
    freq: &[f64],
    q: f64,
    opts: &FdepsdOptions,
    coeffs: &dyn CoefficientGenerator,
    extractor: &dyn CycleExtractor,
) -> Result<ResultSet> {
    validate_inputs(sig, sr, freq, q, opts)?;

    let max_freq = freq.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let conditioned = opts.conditioning().apply(sig, sr, max_freq)?;

    let nfreq = freq.len();
    let plan = plan_execution(opts.parallel, nfreq, conditioned.sig.len(), opts.maxcpu);
    info!(
        "Analyzing {} frequencies over {} samples ({:?}, {} cpu)",
        nfreq,
        conditioned.sig.len(),
        plan.mode,
        plan.ncpu
    );

    let work = Workload {
        sig: &conditioned.sig,
        freq,
        q,
        dt: 1.0 / conditioned.sr,
        nbins: opts.nbins,
        coeffs,
        extractor,
        verbose: opts.verbose,
    };
    let tables = driver::run(&work, &plan)?;

    info!("Computing outputs G1, G2, etc.");
    let mut psd = Vec::with_capacity(nfreq);
    let mut peakamp = Vec::with_capacity(nfreq);
    for (j, (&f, summary)) in freq.iter().zip(&tables.summaries).enumerate() {
        let bins = tables.bins(j);
        let input = DamageInput { freq: f, amax: summary.amax, g2max: g2max(&bins, summary.amax), bins };
        let (psd_row, peak_row) = synthesize(&input, q, opts.t0, opts.resp);
        psd.push(psd_row);
        peakamp.push(peak_row);
    }

    Ok(ResultSet {
        freq: freq.to_vec(),
        psd,
        peakamp,
        binamps: DMatrix::from_row_slice(nfreq, opts.nbins, &tables.binamps),
        count: DMatrix::from_row_slice(nfreq, opts.nbins, &tables.count),
        var: tables.summaries.iter().map(|s| s.var).collect(),
        srs: tables.summaries.iter().map(|s| s.srs).collect(),
        parallel: plan.mode,
        ncpu: plan.ncpu,
        resp: opts.resp,
        sig: conditioned.sig,
        sr: conditioned.sr,
    })
}
