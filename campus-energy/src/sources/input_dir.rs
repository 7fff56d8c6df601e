use std::{fs, path::Path};

use crate::pipeline::PipelineError;

use super::ReadingCsvFileSource;

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// One source per `*.csv` file directly under `input`, in file-name order.
///
/// `input` may also name a single CSV file.
pub fn discover_csv_sources(input: &Path) -> Result<Vec<ReadingCsvFileSource>, PipelineError> {
    if !input.exists() {
        return Err(PipelineError::FileNotFound(input.to_path_buf()));
    }
    if input.is_file() {
        return Ok(vec![ReadingCsvFileSource::new(input)]);
    }

    let entries = fs::read_dir(input).map_err(|e| {
        PipelineError::Source(format!("failed to list {}: {e}", input.display()))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| PipelineError::Source(format!("failed to list {}: {e}", input.display())))?
            .path();
        if path.is_file() && is_csv(&path) {
            paths.push(path);
        }
    }

    if paths.is_empty() {
        return Err(PipelineError::NoInputFiles(input.to_path_buf()));
    }
    paths.sort();

    tracing::debug!(dir = %input.display(), files = paths.len(), "discovered CSV inputs");

    Ok(paths.into_iter().map(ReadingCsvFileSource::new).collect())
}
