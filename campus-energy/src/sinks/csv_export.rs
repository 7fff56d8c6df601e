use std::{
    fs,
    path::{Path, PathBuf},
};

use energy_model::domain::format_timestamp;
use serde::Serialize;

use crate::pipeline::{PipelineError, Sink};

use super::Analysis;

#[derive(Serialize)]
struct CleanedRow<'a> {
    building_id: &'a str,
    timestamp: String,
    usage_kwh: f64,
    month: String,
}

#[derive(Serialize)]
struct BuildingSummaryRow<'a> {
    building_id: &'a str,
    total_kwh: f64,
    mean_kwh: f64,
    min_kwh: f64,
    max_kwh: f64,
    reading_count: usize,
}

#[derive(Serialize)]
struct RejectedRowOut<'a> {
    file: String,
    line: u64,
    reason: &'static str,
    building_id: &'a str,
    timestamp: &'a str,
    usage_kwh: &'a str,
}

/// Writes the cleaned dataset, the building-wise summary and the rejection
/// list as CSV files.
pub struct CsvExportSink {
    pub cleaned_data: PathBuf,
    pub building_summary: PathBuf,
    pub rejected_rows: PathBuf,
}

fn write_rows<T: Serialize>(
    path: &Path,
    header: &[&str],
    rows: impl IntoIterator<Item = T>,
) -> Result<(), PipelineError> {
    let err = |e: &dyn std::fmt::Display| {
        PipelineError::Sink(format!("failed to write {}: {e}", path.display()))
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| err(&e))?;
    }
    let mut wtr = csv::Writer::from_path(path).map_err(|e| err(&e))?;
    let mut written = 0usize;
    for row in rows {
        wtr.serialize(row).map_err(|e| err(&e))?;
        written += 1;
    }
    // Serialising nothing writes nothing, not even the header.
    if written == 0 {
        wtr.write_record(header).map_err(|e| err(&e))?;
    }
    wtr.flush().map_err(|e| err(&e))?;

    tracing::info!(file = %path.display(), rows = written, "export written");
    Ok(())
}

impl Sink<Analysis<'_>> for CsvExportSink {
    fn run(&self, input: &Analysis<'_>) -> Result<(), PipelineError> {
        write_rows(
            &self.cleaned_data,
            &["building_id", "timestamp", "usage_kwh", "month"],
            input.outcome.readings.iter().map(|r| CleanedRow {
                building_id: r.building_id(),
                timestamp: format_timestamp(r.timestamp()),
                usage_kwh: r.usage_kwh(),
                month: r.timestamp().month().to_string(),
            }),
        )?;

        write_rows(
            &self.building_summary,
            &["building_id", "total_kwh", "mean_kwh", "min_kwh", "max_kwh", "reading_count"],
            input.buildings.iter().map(|b| BuildingSummaryRow {
                building_id: &b.building_id,
                total_kwh: b.total_kwh,
                mean_kwh: b.average_kwh,
                min_kwh: b.min_kwh,
                max_kwh: b.peak_kwh,
                reading_count: b.reading_count,
            }),
        )?;

        write_rows(
            &self.rejected_rows,
            &["file", "line", "reason", "building_id", "timestamp", "usage_kwh"],
            input.outcome.rejected.iter().map(|r| RejectedRowOut {
                file: r.origin.file.display().to_string(),
                line: r.origin.line,
                reason: r.reason.code(),
                building_id: r.raw.building_id.as_deref().unwrap_or(""),
                timestamp: r.raw.timestamp.as_deref().unwrap_or(""),
                usage_kwh: r.raw.usage_kwh.as_deref().unwrap_or(""),
            }),
        )
    }
}
