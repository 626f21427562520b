//! Error types for the fatigue damage equivalent PSD computation

use thiserror::Error;

/// Errors that can occur while conditioning a signal or computing the PSDs.
///
/// Numerical degeneracy (zero amplitudes, log of zero) is not an error: it
/// shows up as non-finite values in the result tables.
#[derive(Debug, Error)]
pub enum FdepsdError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No rainflow cycles found for the {freq} Hz oscillator")]
    NoCycles { freq: f64 },

    #[error("Roll-off correction failed: {0}")]
    RollOff(String),

    #[error("Unable to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl FdepsdError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        FdepsdError::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, FdepsdError>;
