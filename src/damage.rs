//! Damage equivalence: flight damage from binned cycles, closed-form test
//! damage for a `t0` second random test, and the inversion to PSD levels.
use std::f64::consts::PI;

use serde::Serialize;

use crate::bins::BinTable;
use crate::sdof::ResponseModel;

/// Column names of the PSD and peak amplitude tables, in order.
pub const COLUMNS: [&str; 5] = ["G1", "G2", "G4", "G8", "G12"];

/// Fatigue exponents of the damage-based curves.
pub const EXPONENTS: [i32; 3] = [4, 8, 12];

/// One row of the PSD or peak amplitude table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct GRow {
    pub g1: f64,
    pub g2: f64,
    pub g4: f64,
    pub g8: f64,
    pub g12: f64,
}

impl GRow {
    /// Values in [`COLUMNS`] order.
    pub fn to_array(&self) -> [f64; 5] {
        [self.g1, self.g2, self.g4, self.g8, self.g12]
    }

    fn from_parts(g1: f64, g2: f64, damage: [f64; 3]) -> Self {
        GRow { g1, g2, g4: damage[0], g8: damage[1], g12: damage[2] }
    }
}

/// `sum(edge^b * noncumulative_count)` for each exponent in [`EXPONENTS`].
pub fn flight_damage(bins: &BinTable) -> [f64; 3] {
    let per_bin = bins.noncumulative();
    EXPONENTS.map(|b| {
        bins.edges
            .iter()
            .zip(&per_bin)
            .map(|(e, n)| e.powi(b) * n)
            .sum()
    })
}

impl ResponseModel {
    /// Test damage for `n0 = f * t0` expected peaks, per exponent in [`EXPONENTS`].
    pub fn test_damage(&self, n0: f64) -> [f64; 3] {
        match self {
            ResponseModel::AbsAcce => {
                let abar = 2.0 * n0.ln();
                let abar2 = abar * abar;
                let abar3 = abar2 * abar;
                let abar4 = abar2 * abar2;
                let abar5 = abar4 * abar;
                let abar6 = abar4 * abar2;
                [
                    n0 * 8.0 - (abar2 + 4.0 * abar + 8.0),
                    n0 * 384.0 - (abar4 + 8.0 * abar3 + 48.0 * abar2 + 192.0 * abar + 384.0),
                    n0 * 46080.0
                        - (abar6
                            + 12.0 * abar5
                            + 120.0 * abar4
                            + 960.0 * abar3
                            + 5760.0 * abar2
                            + 23040.0 * abar
                            + 46080.0),
                ]
            }
            ResponseModel::PVelo => [2.0 * n0, 24.0 * n0, 720.0 * n0],
        }
    }

    /// PSD level from an equivalent squared response level.
    pub fn psd_from_level(&self, sig2: f64, q: f64, freq: f64) -> f64 {
        match self {
            ResponseModel::AbsAcce => sig2 / ((q * PI / 2.0) * freq),
            ResponseModel::PVelo => sig2 * ((4.0 * PI / q) * freq),
        }
    }

    /// PSD level whose expected peak response over `ln_n0` is `sqrt(peak2)`.
    pub fn psd_from_peak2(&self, peak2: f64, q: f64, freq: f64, ln_n0: f64) -> f64 {
        match self {
            ResponseModel::AbsAcce => peak2 / (q * PI * freq * ln_n0),
            ResponseModel::PVelo => (peak2 * 4.0 * PI * freq) / (q * ln_n0),
        }
    }

    /// Inverse of [`ResponseModel::psd_from_peak2`], returning the peak.
    pub fn peak_from_psd(&self, psd: f64, q: f64, freq: f64, ln_n0: f64) -> f64 {
        match self {
            ResponseModel::AbsAcce => (psd * (q * PI * freq * ln_n0)).sqrt(),
            ResponseModel::PVelo => (psd * (q * ln_n0) / (4.0 * PI * freq)).sqrt(),
        }
    }
}

/// Inputs for one frequency's row.
#[derive(Debug, Clone, Copy)]
pub struct DamageInput<'a> {
    pub freq: f64,
    pub amax: f64,
    pub g2max: f64,
    pub bins: BinTable<'a>,
}

/// Computes the PSD row and the matching peak amplitude row.
pub fn synthesize(input: &DamageInput, q: f64, t0: f64, resp: ResponseModel) -> (GRow, GRow) {
    let freq = input.freq;
    let n0 = freq * t0;
    let ln_n0 = n0.ln();

    let df = flight_damage(&input.bins);
    let dt = resp.test_damage(n0);
    let mut damage = [0.0; 3];
    for (i, &b) in EXPONENTS.iter().enumerate() {
        let sig2 = (df[i] / dt[i]).powf(2.0 / b as f64);
        damage[i] = resp.psd_from_level(sig2, q, freq);
    }

    let psd = GRow::from_parts(
        resp.psd_from_peak2(input.amax * input.amax, q, freq, ln_n0),
        resp.psd_from_peak2(input.g2max, q, freq, ln_n0),
        damage,
    );
    let peak = GRow::from_parts(
        input.amax,
        input.g2max.sqrt(),
        damage.map(|g| resp.peak_from_psd(g, q, freq, ln_n0)),
    );
    (psd, peak)
}
