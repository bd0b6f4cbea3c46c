use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use perizia_core::AnalysisResult;
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    job_id: &'a str,
    exported_utc: &'a str,
    result: &'a AnalysisResult,
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), ExportError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| ExportError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(ExportError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| ExportError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// File name used for a job's export; characters outside `[A-Za-z0-9_-]` become `_`.
pub fn export_filename(job_id: &str) -> String {
    let stem: String = job_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "job".to_string() } else { stem };
    format!("{stem}.json")
}

/// Atomically writes `{dir}/{job_id}.json` holding the result and export metadata.
pub fn export_result(
    dir: &Path,
    job_id: &str,
    exported_utc: &str,
    result: &AnalysisResult,
) -> Result<PathBuf, ExportError> {
    ensure_output_dir(dir)?;

    let target = dir.join(export_filename(job_id));
    let document = ExportDocument {
        job_id,
        exported_utc,
        result,
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer_pretty(&mut writer, &document)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tmp.as_file_mut().sync_all()?;

    tmp.persist(&target).map_err(|e| ExportError::Io(e.error))?;
    Ok(target)
}
