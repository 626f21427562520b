// src/lib.rs

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

pub mod analysis;
pub mod app_logic;
pub mod bins;
pub mod boundary;
pub mod condition;
pub mod config;
pub mod damage;
pub mod driver;
pub mod error;
pub mod filter;
pub mod rainflow;
pub mod rolloff;
pub mod sdof;
pub mod signal;
pub mod window;

pub use analysis::{fdepsd, fdepsd_with, FdepsdOptions, ResultSet};
pub use damage::GRow;
pub use driver::{ExecutionMode, ParallelPolicy};
pub use error::{FdepsdError, Result};
pub use rainflow::{Cycle, CycleExtractor, Rainflow};
pub use rolloff::RollOff;
pub use sdof::{CoefficientGenerator, ResponseModel};
pub use window::{Ends, WinEnds, WindowEnds};

// When the "wasm" feature is enabled, expose the computation to the host environment.
// Returns the PSD table flattened row by row, five values (G1, G2, G4, G8, G12) per frequency.
#[cfg(feature = "wasm")]
#[wasm_bindgen]
pub fn run_fdepsd(sig: &[f64], sr: f64, freq: &[f64], q: f64) -> std::result::Result<Vec<f64>, JsValue> {
    let opts = FdepsdOptions { parallel: ParallelPolicy::No, ..FdepsdOptions::default() };
    let res = fdepsd(sig, sr, freq, q, &opts).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(res.psd.iter().flat_map(|row| row.to_array()).collect())
}
