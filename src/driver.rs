//! Runs the per-frequency pipeline (SDOF response, cycle count, binning)
//! sequentially or on a bounded rayon pool.
//!
//! Every frequency owns its row of the output tables, so workers write to
//! disjoint slices and the layout never depends on completion order.
use std::str::FromStr;

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::bins::{fill_cumulative, fill_edges, BinTable};
use crate::error::{FdepsdError, Result};
use crate::rainflow::{max_amplitude, CycleExtractor};
use crate::sdof::{omega, sdof_response, CoefficientGenerator};

/// Signals shorter than this (times the number of frequencies) stay sequential under `Auto`.
const AUTO_PARALLEL_WORK: usize = 2_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelPolicy {
    Auto,
    Yes,
    No,
}

impl FromStr for ParallelPolicy {
    type Err = FdepsdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(ParallelPolicy::Auto),
            "yes" => Ok(ParallelPolicy::Yes),
            "no" => Ok(ParallelPolicy::No),
            _ => Err(FdepsdError::invalid(format!(
                "parallel must be auto, yes or no, got {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Sequential,
    Parallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub mode: ExecutionMode,
    pub ncpu: usize,
}

/// Default worker cap: four fifths of the available CPUs.
pub fn default_maxcpu() -> usize {
    (num_cpus::get() * 4 / 5).max(1)
}

/// Decides how the frequency loop runs.
pub fn plan_execution(
    policy: ParallelPolicy,
    nfreq: usize,
    nsamples: usize,
    maxcpu: Option<usize>,
) -> ExecutionPlan {
    let cap = maxcpu.unwrap_or_else(default_maxcpu);
    let ncpu = cap.min(num_cpus::get()).min(nfreq).max(1);
    let parallel = match policy {
        ParallelPolicy::Yes => true,
        ParallelPolicy::No => false,
        ParallelPolicy::Auto => {
            ncpu > 1 && nfreq > 1 && nfreq.saturating_mul(nsamples) >= AUTO_PARALLEL_WORK
        }
    };
    if parallel {
        ExecutionPlan { mode: ExecutionMode::Parallel, ncpu }
    } else {
        ExecutionPlan { mode: ExecutionMode::Sequential, ncpu: 1 }
    }
}

/// Read-only inputs shared by every unit of work.
pub struct Workload<'a> {
    pub sig: &'a [f64],
    pub freq: &'a [f64],
    pub q: f64,
    pub dt: f64,
    pub nbins: usize,
    pub coeffs: &'a dyn CoefficientGenerator,
    pub extractor: &'a dyn CycleExtractor,
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrequencySummary {
    /// Largest rainflow cycle amplitude.
    pub amax: f64,
    /// Peak absolute response.
    pub srs: f64,
    pub var: f64,
}

/// Frequency-indexed outputs; `binamps` and `count` are row-major `nfreq x nbins`.
#[derive(Debug, Clone)]
pub struct FrequencyTables {
    pub summaries: Vec<FrequencySummary>,
    pub binamps: Vec<f64>,
    pub count: Vec<f64>,
    pub nbins: usize,
}

impl FrequencyTables {
    fn new(nfreq: usize, nbins: usize) -> Self {
        FrequencyTables {
            summaries: vec![FrequencySummary::default(); nfreq],
            binamps: vec![0.0; nfreq * nbins],
            count: vec![0.0; nfreq * nbins],
            nbins,
        }
    }

    pub fn bins(&self, j: usize) -> BinTable<'_> {
        let row = j * self.nbins..(j + 1) * self.nbins;
        BinTable::new(&self.binamps[row.clone()], &self.count[row])
    }
}

fn analyze_frequency(
    work: &Workload,
    freq: f64,
    edges: &mut [f64],
    counts: &mut [f64],
) -> Result<FrequencySummary> {
    if work.verbose {
        info!("Processing frequency {:8.2} Hz", freq);
    } else {
        debug!("Processing frequency {:8.2} Hz", freq);
    }
    let resp = sdof_response(work.coeffs, work.q, work.dt, omega(freq), work.sig);
    let cycles = work.extractor.extract(&resp.history)?;
    drop(resp.history);

    let amax = max_amplitude(&cycles, freq)?;
    fill_edges(amax, edges);
    fill_cumulative(&cycles, edges, counts);
    Ok(FrequencySummary { amax, srs: resp.peak, var: resp.variance })
}

/// Runs every frequency and returns the filled tables; the first failure aborts the run.
pub fn run(work: &Workload, plan: &ExecutionPlan) -> Result<FrequencyTables> {
    let nbins = work.nbins;
    if nbins == 0 {
        return Err(FdepsdError::invalid("nbins must be at least 1"));
    }
    let mut tables = FrequencyTables::new(work.freq.len(), nbins);
    let FrequencyTables { summaries, binamps, count, .. } = &mut tables;

    match plan.mode {
        ExecutionMode::Sequential => binamps
            .chunks_mut(nbins)
            .zip(count.chunks_mut(nbins))
            .zip(summaries.iter_mut())
            .zip(work.freq)
            .try_for_each(|(((edges, counts), summary), &f)| {
                *summary = analyze_frequency(work, f, edges, counts)?;
                Ok::<(), FdepsdError>(())
            })?,
        ExecutionMode::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(plan.ncpu).build()?;
            pool.install(|| {
                binamps
                    .par_chunks_mut(nbins)
                    .zip(count.par_chunks_mut(nbins))
                    .zip(summaries.par_iter_mut())
                    .zip(work.freq.par_iter())
                    .try_for_each(|(((edges, counts), summary), &f)| {
                        *summary = analyze_frequency(work, f, edges, counts)?;
                        Ok::<(), FdepsdError>(())
                    })
            })?
        }
    }
    Ok(tables)
}
