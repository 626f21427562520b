use std::f64::consts::PI;

use approx::assert_relative_eq;
use fdepsd::{fdepsd, ExecutionMode, FdepsdOptions, ParallelPolicy, ResponseModel, RollOff, WinEnds};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random-phase sum of sinusoids with a flat one-sided PSD of `level` between `fstart` and `fstop`.
fn flat_random(level: f64, fstart: f64, fstop: f64, duration: f64, sr: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let df = 1.0 / duration;
    let amp = (2.0 * level * df).sqrt();
    let ntones = ((fstop - fstart) / df).round() as usize + 1;
    let tones: Vec<(f64, f64)> = (0..ntones)
        .map(|i| (2.0 * PI * (fstart + df * i as f64), rng.gen_range(0.0..2.0 * PI)))
        .collect();
    let n = (duration * sr) as usize;
    (0..n)
        .map(|k| {
            let t = k as f64 / sr;
            tones.iter().map(|(w, ph)| (w * t + ph).sin()).sum::<f64>() * amp
        })
        .collect()
}

fn gaussian(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
            let u2: f64 = rng.gen_range(0.0..1.0);
            (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
        })
        .collect()
}

#[test]
fn test_flat_spectrum_is_recovered() {
    let sr = 500.0;
    let sig = flat_random(1.0, 20.0, 50.0, 60.0, sr, 7);
    let freq: Vec<f64> = (20..=50).map(|f| f as f64).collect();
    let opts = FdepsdOptions { parallel: ParallelPolicy::No, ..FdepsdOptions::default() };
    let res = fdepsd(&sig, sr, &freq, 10.0, &opts).unwrap();

    // 10 points per cycle at 50 Hz is below the default 12, so lanczos doubles the rate
    assert_eq!(res.sr, 1000.0);
    assert_eq!(res.sig.len(), 2 * sig.len());

    let j = res.position(30.0).unwrap();
    let row = res.psd[j];
    assert!(row.g1 > 0.5 && row.g1 < 1.5, "G1 = {}", row.g1);
    assert!(row.g4 > 0.5 && row.g4 < 1.5, "G4 = {}", row.g4);
    assert!(row.g8 > 0.4 && row.g8 < 2.0, "G8 = {}", row.g8);
    assert!(row.g12 > 0.4 && row.g12 < 2.5, "G12 = {}", row.g12);
    assert!(row.g2 < 3.0, "G2 = {}", row.g2);
    for r in &res.psd {
        assert!(r.g2 >= r.g1);
    }
}

#[test]
fn test_gaussian_counts_follow_rayleigh() {
    let sr = 1000.0;
    let duration = 60.0;
    let f = 50.0;
    let sig = gaussian((sr * duration) as usize, 11);
    let opts = FdepsdOptions {
        hpfilter: None,
        winends: WinEnds::Disabled,
        rolloff: RollOff::None,
        parallel: ParallelPolicy::No,
        ..FdepsdOptions::default()
    };
    let res = fdepsd(&sig, sr, &[f], 10.0, &opts).unwrap();
    let sigma = res.var[0].sqrt();

    let edges = res.binamps.row(0);
    let j = edges.iter().position(|&a| a >= 2.0 * sigma).unwrap();
    let a = edges[j];
    let expected = f * duration * (-a * a / (2.0 * sigma * sigma)).exp();
    let ratio = res.count[(0, j)] / expected;
    assert!(ratio > 0.6 && ratio < 1.5, "count ratio at 2 sigma = {}", ratio);
}

#[test]
fn test_steady_sine_concentrates_cycles() {
    let sr = 1000.0;
    let sig: Vec<f64> = (0..10000).map(|i| (2.0 * PI * 10.0 * i as f64 / sr).sin()).collect();
    let opts = FdepsdOptions {
        hpfilter: None,
        winends: WinEnds::Auto,
        parallel: ParallelPolicy::No,
        ..FdepsdOptions::default()
    };
    let f = 40.0;
    let q = 10.0;
    let res = fdepsd(&sig, sr, &[f], q, &opts).unwrap();

    let amax = res.peakamp[0].g1;
    let total = res.count[(0, 0)];
    let j = res.binamps.row(0).iter().position(|&a| a >= 0.7 * amax).unwrap();
    assert!(res.count[(0, j)] >= 0.75 * total, "{} of {} cycles above 0.7 Amax", res.count[(0, j)], total);

    let ln_n0 = (f * opts.t0).ln();
    assert_relative_eq!(res.psd[0].g1, amax * amax / (q * PI * f * ln_n0), max_relative = 1e-12);
    assert!(res.psd[0].g2 >= res.psd[0].g1);
    assert!(amax <= res.srs[0]);
}

#[test]
fn test_resonant_sine_fills_top_bin() {
    let sr = 1000.0;
    let f = 40.0;
    let q = 10.0;
    let sig: Vec<f64> = (0..20000).map(|i| (2.0 * PI * f * i as f64 / sr).sin()).collect();
    let opts = FdepsdOptions { hpfilter: None, parallel: ParallelPolicy::No, ..FdepsdOptions::default() };
    let res = fdepsd(&sig, sr, &[f], q, &opts).unwrap();

    let amax = res.peakamp[0].g1;
    assert_relative_eq!(amax, q, max_relative = 0.05);
    let total = res.count[(0, 0)];
    let top = res.count[(0, opts.nbins - 1)];
    assert!(top >= 0.95 * total, "{} of {} cycles in the top bin", top, total);

    let ln_n0 = (f * opts.t0).ln();
    let row = res.psd[0];
    assert_relative_eq!(row.g1, amax * amax / (q * PI * f * ln_n0), max_relative = 1e-12);
    // counts stay near the total up to amax, so the tangent lifts G2 far above G1
    assert!(row.g2 > 10.0 * row.g1, "G1 = {}, G2 = {}", row.g1, row.g2);
    assert!(res.peakamp[0].g2 > amax);
}

#[test]
fn test_zero_signal_gives_zero_rows() {
    let sig = vec![0.0; 2000];
    let opts = FdepsdOptions { parallel: ParallelPolicy::No, ..FdepsdOptions::default() };
    let res = fdepsd(&sig, 1000.0, &[20.0, 50.0], 10.0, &opts).unwrap();
    for j in 0..2 {
        assert_eq!(res.psd[j].to_array(), [0.0; 5]);
        assert_eq!(res.peakamp[j].to_array(), [0.0; 5]);
        assert_eq!(res.srs[j], 0.0);
        assert_eq!(res.var[j], 0.0);
    }
}

#[test]
fn test_nan_sample_propagates() {
    let mut sig = gaussian(2000, 5);
    sig[500] = f64::NAN;
    let opts = FdepsdOptions { parallel: ParallelPolicy::No, ..FdepsdOptions::default() };
    let res = fdepsd(&sig, 1000.0, &[50.0], 10.0, &opts).unwrap();
    assert!(res.psd[0].to_array().iter().all(|g| g.is_nan()));
    assert!(res.srs[0].is_nan());
    assert!(res.var[0].is_nan());
}

#[test]
fn test_parallel_matches_sequential() {
    let sig = gaussian(8000, 21);
    for nfreq in 1..=6 {
        let freq: Vec<f64> = (0..nfreq).map(|i| 15.0 + 20.0 * i as f64).collect();
        let seq_opts = FdepsdOptions { parallel: ParallelPolicy::No, nbins: 120, ..FdepsdOptions::default() };
        let seq = fdepsd(&sig, 1000.0, &freq, 10.0, &seq_opts).unwrap();
        assert_eq!(seq.parallel, ExecutionMode::Sequential);
        for maxcpu in [1, 2, 3, 8] {
            let opts = FdepsdOptions { parallel: ParallelPolicy::Yes, maxcpu: Some(maxcpu), ..seq_opts.clone() };
            let par = fdepsd(&sig, 1000.0, &freq, 10.0, &opts).unwrap();
            assert_eq!(par.parallel, ExecutionMode::Parallel);
            assert!(par.ncpu <= maxcpu.min(nfreq));
            assert_eq!(par.psd, seq.psd);
            assert_eq!(par.peakamp, seq.peakamp);
            assert_eq!(par.count, seq.count);
            assert_eq!(par.binamps, seq.binamps);
            assert_eq!(par.srs, seq.srs);
            assert_eq!(par.var, seq.var);
        }
    }
}

#[test]
fn test_pvelo_flat_spectrum() {
    let sr = 500.0;
    let sig = flat_random(1.0, 20.0, 50.0, 60.0, sr, 3);
    let opts = FdepsdOptions {
        resp: ResponseModel::PVelo,
        parallel: ParallelPolicy::No,
        ..FdepsdOptions::default()
    };
    let res = fdepsd(&sig, sr, &[30.0, 35.0], 10.0, &opts).unwrap();
    for row in &res.psd {
        assert!(row.g1 > 0.5 && row.g1 < 1.5, "G1 = {}", row.g1);
        assert!(row.g2 >= row.g1);
    }
}
