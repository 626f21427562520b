//! A module for validating and managing run configurations of the fatigue damage equivalent PSD tool.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::analysis::FdepsdOptions;
use crate::driver::ParallelPolicy;
use crate::rolloff::RollOff;
use crate::sdof::ResponseModel;
use crate::window::{Ends, WinEnds, WindowEnds};

/// Represents an error that can occur during validation of configuration data.
#[derive(Debug)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a given message.
    ///
    /// # Arguments
    ///
    /// * `message` - A description of the error.
    pub fn new(message: &str) -> ValidationError {
        ValidationError {
            message: message.to_owned(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Represents the configuration of one analysis run.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub signal: SignalConfig,
    pub analysis: AnalysisConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Validates the entire configuration.
    ///
    /// This method checks the validity of each component of the configuration
    /// and ensures all required conditions are met.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.signal.validate()?;
        self.analysis.validate()?;
        self.output.validate()?;
        Ok(())
    }
}

/// Describes where the base acceleration signal is read from.
#[derive(Debug, Deserialize)]
pub struct SignalConfig {
    /// Path to a delimited text file.
    pub path: String,
    /// Zero-based column holding the acceleration values.
    pub column: usize,
    /// Number of header lines to skip.
    #[serde(default)]
    pub header: usize,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// Sample rate in Hz. Either this or `time_column` must be given.
    pub sample_rate: Option<f64>,
    /// Zero-based column holding uniformly spaced time values.
    pub time_column: Option<usize>,
    /// Factor applied to every sample.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

fn default_delimiter() -> String {
    ",".into()
}

fn default_scale() -> f64 {
    1.0
}

impl SignalConfig {
    /// Validates the signal source.
    ///
    /// # Returns
    ///
    /// Returns `Ok(())` if the path, delimiter and sample rate source are usable.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.trim().is_empty() {
            return Err(ValidationError::new("path must not be empty"));
        }
        if self.delimiter.len() != 1 {
            return Err(ValidationError::new(&format!(
                "delimiter must be a single character, got '{}'",
                self.delimiter
            )));
        }
        match (self.sample_rate, self.time_column) {
            (Some(sr), _) if !(sr > 0.0) => Err(ValidationError::new(&format!(
                "sample_rate must be greater than 0.0, got {}",
                sr
            ))),
            (None, None) => Err(ValidationError::new("either sample_rate or time_column must be given")),
            _ => Ok(()),
        }?;
        if !self.scale.is_finite() {
            return Err(ValidationError::new(&format!("scale must be finite, got {}", self.scale)));
        }
        Ok(())
    }
}

/// Analysis frequencies: an explicit list or an evenly spaced range.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Frequencies {
    List(Vec<f64>),
    Range { start: f64, stop: f64, step: f64 },
}

impl Frequencies {
    /// Expands the frequencies; a range includes `stop` when it falls on the grid.
    pub fn values(&self) -> Vec<f64> {
        match self {
            Frequencies::List(values) => values.clone(),
            Frequencies::Range { start, stop, step } => {
                let n = ((stop - start) / step + 1e-9).floor() as usize + 1;
                (0..n).map(|i| start + step * i as f64).collect()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Frequencies::List(values) => {
                if values.is_empty() {
                    return Err(ValidationError::new("freq must not be empty"));
                }
                if let Some(f) = values.iter().find(|f| !(**f > 0.0)) {
                    return Err(ValidationError::new(&format!("freq values must be greater than 0.0, got {}", f)));
                }
            }
            Frequencies::Range { start, stop, step } => {
                if !(*start > 0.0) || !(*step > 0.0) || !stop.is_finite() || stop < start {
                    return Err(ValidationError::new(&format!(
                        "freq range needs 0 < start <= stop and step > 0, got {}..{} by {}",
                        start, stop, step
                    )));
                }
            }
        }
        Ok(())
    }
}

/// End window: `"auto"`, `"none"` or explicit parameters.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WinEndsConfig {
    Named(String),
    Explicit {
        portion: f64,
        #[serde(default = "default_ends")]
        ends: String,
    },
}

fn default_ends() -> String {
    "front".into()
}

impl WinEndsConfig {
    pub fn to_winends(&self) -> Result<WinEnds, ValidationError> {
        match self {
            WinEndsConfig::Named(name) => match name.to_ascii_lowercase().as_str() {
                "auto" => Ok(WinEnds::Auto),
                "none" => Ok(WinEnds::Disabled),
                _ => Err(ValidationError::new(&format!("winends must be auto, none or a mapping, got {}", name))),
            },
            WinEndsConfig::Explicit { portion, ends } => {
                if !(*portion > 0.0) {
                    return Err(ValidationError::new(&format!("portion must be greater than 0.0, got {}", portion)));
                }
                let ends = Ends::from_str(ends).map_err(|e| ValidationError::new(&e.to_string()))?;
                Ok(WinEnds::Explicit(WindowEnds { portion: *portion, ends }))
            }
        }
    }
}

fn default_winends() -> WinEndsConfig {
    WinEndsConfig::Named("auto".into())
}

/// Settings of the damage equivalent PSD computation.
///
/// Missing fields fall back to the same defaults as [`FdepsdOptions::default`].
#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    pub freq: Frequencies,
    /// Dynamic amplification factor, must be greater than 0.5.
    pub q: f64,
    /// Response the damage is based on: "absacce" or "pvelo".
    #[serde(default = "default_resp")]
    pub resp: String,
    /// High-pass cutoff in Hz; `null` disables filtering.
    #[serde(default = "default_hpfilter")]
    pub hpfilter: Option<f64>,
    #[serde(default = "default_winends")]
    pub winends: WinEndsConfig,
    #[serde(default = "default_nbins")]
    pub nbins: usize,
    #[serde(default = "default_t0")]
    pub t0: f64,
    /// "fft", "lanczos", "prefilter", "linear" or "none".
    #[serde(default = "default_rolloff")]
    pub rolloff: String,
    #[serde(default = "default_ppc")]
    pub ppc: f64,
    /// "auto", "yes" or "no".
    #[serde(default = "default_parallel")]
    pub parallel: String,
    #[serde(default = "default_maxcpu")]
    pub maxcpu: Option<usize>,
    #[serde(default)]
    pub verbose: bool,
}

fn default_resp() -> String {
    "absacce".into()
}
fn default_hpfilter() -> Option<f64> {
    Some(5.0)
}
fn default_nbins() -> usize {
    300
}
fn default_t0() -> f64 {
    60.0
}
fn default_rolloff() -> String {
    "lanczos".into()
}
fn default_ppc() -> f64 {
    12.0
}
fn default_parallel() -> String {
    "auto".into()
}
fn default_maxcpu() -> Option<usize> {
    Some(14)
}

impl AnalysisConfig {
    /// Validates the analysis settings.
    ///
    /// Checks the frequencies, `q > 0.5`, positive bin count, test duration and
    /// points per cycle, and that every named option is one of its accepted values.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.freq.validate()?;
        if !(self.q > 0.5) {
            return Err(ValidationError::new(&format!("q must be greater than 0.5, got {}", self.q)));
        }
        if let Some(hp) = self.hpfilter {
            if !(hp > 0.0) {
                return Err(ValidationError::new(&format!("hpfilter must be greater than 0.0, got {}", hp)));
            }
        }
        if self.nbins == 0 {
            return Err(ValidationError::new("nbins must be greater than 0"));
        }
        if !(self.t0 > 0.0) {
            return Err(ValidationError::new(&format!("t0 must be greater than 0.0, got {}", self.t0)));
        }
        if !(self.ppc > 0.0) {
            return Err(ValidationError::new(&format!("ppc must be greater than 0.0, got {}", self.ppc)));
        }
        if self.maxcpu == Some(0) {
            return Err(ValidationError::new("maxcpu must be greater than 0"));
        }
        self.to_options().map(|_| ())
    }

    /// Converts the configuration into computation options.
    pub fn to_options(&self) -> Result<FdepsdOptions, ValidationError> {
        let named = |e: crate::error::FdepsdError| ValidationError::new(&e.to_string());
        Ok(FdepsdOptions {
            resp: ResponseModel::from_str(&self.resp).map_err(named)?,
            hpfilter: self.hpfilter,
            winends: self.winends.to_winends()?,
            nbins: self.nbins,
            t0: self.t0,
            rolloff: RollOff::from_str(&self.rolloff).map_err(named)?,
            ppc: self.ppc,
            parallel: ParallelPolicy::from_str(&self.parallel).map_err(named)?,
            maxcpu: self.maxcpu,
            verbose: self.verbose,
        })
    }
}

/// Where and how results are written.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory.
    pub path: String,
    /// "JSON" or "CSV".
    pub format: String,
}

impl OutputConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.trim().is_empty() {
            return Err(ValidationError::new("output path must not be empty"));
        }
        match self.format.as_str() {
            "JSON" | "CSV" => Ok(()),
            _ => Err(ValidationError::new(&format!("format must be JSON or CSV, got {}", self.format))),
        }
    }
}

/// Loads the configuration from a YAML file, or a TOML file when the extension is `.toml`.
///
/// # Arguments
///
/// * `config_path` - A path reference to the configuration file.
///
/// # Errors
///
/// This function will return an error if reading or parsing the configuration file fails.
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<Config, Box<dyn std::error::Error + Send + Sync>> {
    let path = config_path.as_ref();
    let content = fs::read_to_string(path)?;
    let config: Config = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config() {
        let config_path = "tests/config.yaml";
        let config = load_config(config_path).expect("Failed to load config");
        assert!(config.validate().is_ok(), "Expected Ok(()) but got Err with {:?}", config.validate());
        let opts = config.analysis.to_options().unwrap();
        assert_eq!(opts.resp, ResponseModel::AbsAcce);
        assert_eq!(opts.nbins, 100);
        assert_eq!(opts.winends, WinEnds::Disabled);
        assert_eq!(config.analysis.freq.values(), vec![5.0, 10.0, 15.0, 20.0]);
    }

    #[test]
    fn test_load_toml_config() {
        let config = load_config("tests/config.toml").expect("Failed to load config");
        assert!(config.validate().is_ok());
        let opts = config.analysis.to_options().unwrap();
        assert_eq!(opts.resp, ResponseModel::PVelo);
        assert_eq!(opts.hpfilter, Some(5.0));
        assert_eq!(
            opts.winends,
            WinEnds::Explicit(WindowEnds { portion: 10.0, ends: Ends::Both })
        );
        assert_eq!(opts.parallel, ParallelPolicy::Yes);
        assert_eq!(config.analysis.freq.values(), vec![8.0, 12.0, 16.0]);
    }

    #[test]
    fn test_analysis_defaults_and_errors() {
        let yaml = "freq: [10.0, 20.0]\nq: 10\n";
        let analysis: AnalysisConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(analysis.validate().is_ok());
        let opts = analysis.to_options().unwrap();
        assert_eq!(opts.nbins, 300);
        assert_eq!(opts.winends, WinEnds::Auto);
        assert_eq!(opts.rolloff.name(), "lanczos");

        let yaml = "freq: [10.0]\nq: 10\nresp: relacce\n";
        let analysis: AnalysisConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(analysis.validate().is_err());

        let yaml = "freq: [10.0]\nq: 0.4\n";
        let analysis: AnalysisConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(analysis.validate().is_err());

        let yaml = "freq: {start: 5.0, stop: 50.0, step: 5.0}\nq: 10\nwinends: {portion: 0.1, ends: sideways}\n";
        let analysis: AnalysisConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(analysis.freq.values().len(), 10);
        assert!(analysis.validate().is_err());
    }

    #[test]
    fn test_frequency_range_needs_finite_stop() {
        let range = Frequencies::Range { start: 5.0, stop: f64::NAN, step: 5.0 };
        assert!(range.validate().is_err());
        let range = Frequencies::Range { start: 5.0, stop: f64::INFINITY, step: 5.0 };
        assert!(range.validate().is_err());
        let range = Frequencies::Range { start: 5.0, stop: 15.0, step: 5.0 };
        assert!(range.validate().is_ok());
        assert_eq!(range.values(), vec![5.0, 10.0, 15.0]);
    }

    #[test]
    fn test_signal_config_needs_rate() {
        let signal = SignalConfig {
            path: "tests/data/sine.csv".into(),
            column: 1,
            header: 1,
            delimiter: ",".into(),
            sample_rate: None,
            time_column: None,
            scale: 1.0,
        };
        assert!(signal.validate().is_err());
        let signal = SignalConfig { time_column: Some(0), ..signal };
        assert!(signal.validate().is_ok());
    }

    #[test]
    fn test_output_config() {
        let out = OutputConfig { path: "out".into(), format: "XML".into() };
        assert!(out.validate().is_err());
    }
}
