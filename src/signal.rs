//! Reads the base acceleration signal from delimited text files.
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::config::SignalConfig;
use crate::error::{FdepsdError, Result};

/// A uniformly sampled signal.
#[derive(Debug, Clone)]
pub struct Signal {
    pub values: Vec<f64>,
    pub sr: f64,
}

fn parse_field(record: &csv::StringRecord, column: usize, line: usize) -> Result<f64> {
    let field = record.get(column).ok_or_else(|| {
        FdepsdError::invalid(format!("line {}: no column {}", line, column))
    })?;
    field
        .trim()
        .parse()
        .map_err(|_| FdepsdError::invalid(format!("line {}: '{}' is not a number", line, field)))
}

/// Reads the configured column; the sample rate comes from the config or from the time column.
pub fn read_signal(config: &SignalConfig) -> Result<Signal> {
    let file = File::open(Path::new(&config.path))?;
    let mut reader = BufReader::new(file);
    let mut skipped = String::new();
    for _ in 0..config.header {
        skipped.clear();
        if reader.read_line(&mut skipped)? == 0 {
            break;
        }
    }

    let delimiter = config.delimiter.as_bytes().first().copied().unwrap_or(b',');
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut values = Vec::new();
    let mut times = Vec::new();
    for (i, record) in csv_reader.records().enumerate() {
        let record = record?;
        let line = config.header + i + 1;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        values.push(parse_field(&record, config.column, line)? * config.scale);
        if config.sample_rate.is_none() {
            if let Some(tcol) = config.time_column {
                times.push(parse_field(&record, tcol, line)?);
            }
        }
    }

    let sr = match config.sample_rate {
        Some(sr) => sr,
        None => sample_rate_from_times(&times)?,
    };
    Ok(Signal { values, sr })
}

/// Sample rate of a uniformly spaced time vector.
pub fn sample_rate_from_times(times: &[f64]) -> Result<f64> {
    if times.len() < 2 {
        return Err(FdepsdError::invalid("need at least two time values to derive the sample rate"));
    }
    let dt = (times[times.len() - 1] - times[0]) / (times.len() - 1) as f64;
    if !(dt > 0.0) {
        return Err(FdepsdError::invalid(format!("time values must increase, got step {}", dt)));
    }
    Ok(1.0 / dt)
}

/// Writes `values` one per line; used to export the conditioned signal.
pub fn write_column<W: io::Write>(writer: W, header: &str, values: &[f64]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([header])?;
    for v in values {
        wtr.write_record([v.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
