//! A module for the main application logic of the fatigue damage equivalent PSD tool
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::info;
use nalgebra::DMatrix;

use crate::analysis::{fdepsd, ResultSet};
use crate::config::{load_config, OutputConfig};
use crate::damage::{GRow, COLUMNS};
use crate::signal::{read_signal, write_column};

/// Loads the configuration, runs the analysis and writes the results.
///
/// Returns the paths of the written files.
pub fn run(config_path: &str) -> Result<Vec<PathBuf>> {
    info!("Running with configuration: {}", config_path);
    let conf = load_config(config_path).map_err(|e| anyhow!("failed to load {}: {}", config_path, e))?;
    conf.validate().map_err(|e| anyhow!("validation error: {}", e))?;

    let signal = read_signal(&conf.signal)
        .with_context(|| format!("failed to read signal from {}", conf.signal.path))?;
    info!("Read {} samples at {} Hz", signal.values.len(), signal.sr);

    let freq = conf.analysis.freq.values();
    let opts = conf.analysis.to_options().map_err(|e| anyhow!("validation error: {}", e))?;
    let res = fdepsd(&signal.values, signal.sr, &freq, conf.analysis.q, &opts)?;

    let written = write_results(&res, &conf.output)?;
    for path in &written {
        info!("Wrote {}", path.display());
    }
    Ok(written)
}

/// Writes `res` in the configured format.
pub fn write_results(res: &ResultSet, output: &OutputConfig) -> Result<Vec<PathBuf>> {
    let dir = Path::new(&output.path);
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    match output.format.as_str() {
        "JSON" => {
            let path = dir.join("fdepsd.json");
            let writer = BufWriter::new(File::create(&path)?);
            serde_json::to_writer_pretty(writer, res)?;
            Ok(vec![path])
        }
        "CSV" => {
            let mut written = Vec::new();
            for (name, rows) in [("psd.csv", &res.psd), ("peakamp.csv", &res.peakamp)] {
                let path = dir.join(name);
                write_gtable(&path, &res.freq, rows)?;
                written.push(path);
            }
            for (name, table) in [("binamps.csv", &res.binamps), ("count.csv", &res.count)] {
                let path = dir.join(name);
                write_matrix(&path, &res.freq, table)?;
                written.push(path);
            }
            let path = dir.join("srs_var.csv");
            write_srs_var(&path, res)?;
            written.push(path);

            let path = dir.join("signal.csv");
            write_column(File::create(&path)?, "signal", &res.sig)?;
            written.push(path);
            Ok(written)
        }
        other => Err(anyhow!("unsupported output format {}", other)),
    }
}

fn write_gtable(path: &Path, freq: &[f64], rows: &[GRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec!["Frequency"];
    header.extend(COLUMNS);
    wtr.write_record(&header)?;
    for (f, row) in freq.iter().zip(rows) {
        let mut record = vec![f.to_string()];
        record.extend(row.to_array().iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_matrix(path: &Path, freq: &[f64], table: &DMatrix<f64>) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec!["Frequency".to_string()];
    header.extend((0..table.ncols()).map(|i| i.to_string()));
    wtr.write_record(&header)?;
    for (f, row) in freq.iter().zip(table.row_iter()) {
        let mut record = vec![f.to_string()];
        record.extend(row.iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_srs_var(path: &Path, res: &ResultSet) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["Frequency", "SRS", "Var"])?;
    for ((f, s), v) in res.freq.iter().zip(&res.srs).zip(&res.var) {
        wtr.write_record([f.to_string(), s.to_string(), v.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
