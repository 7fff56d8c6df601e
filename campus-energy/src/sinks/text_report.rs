use std::{
    fmt::{self, Write as _},
    fs,
    path::PathBuf,
};

use energy_model::domain::format_timestamp;

use crate::pipeline::{PipelineError, Sink};

use super::Analysis;

const RULE: &str = "========================================";

/// `1234567.891` -> `1,234,567.89`. Non-finite values render as `n/a`.
pub fn format_kwh(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// Render the executive summary.
pub fn render_report(analysis: &Analysis<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, analysis);
    out
}

fn write_report(out: &mut String, analysis: &Analysis<'_>) -> fmt::Result {
    let outcome = analysis.outcome;
    let overview = &analysis.overview;

    writeln!(out, "{RULE}")?;
    writeln!(out, "EXECUTIVE ENERGY CONSUMPTION SUMMARY")?;
    writeln!(out, "{RULE}")?;

    writeln!(out, "Data quality:")?;
    writeln!(out, "   - Files read: {}", outcome.files_read)?;
    writeln!(out, "   - Rows read: {}", outcome.rows_read)?;
    writeln!(out, "   - Accepted rows: {}", outcome.accepted())?;
    writeln!(out, "   - Rejected rows: {}", outcome.rejected.len())?;
    for (reason, count) in outcome.rejection_counts() {
        writeln!(out, "       {reason}: {count}")?;
    }
    writeln!(out, "   - Duplicate readings: {}", outcome.duplicates)?;
    writeln!(out, "   - Dataset fingerprint: {}", outcome.fingerprint())?;
    writeln!(out)?;

    writeln!(out, "1. Total Campus Consumption: {} kWh", format_kwh(overview.total_kwh))?;
    writeln!(
        out,
        "2. Highest-Consuming Building: {} ({} kWh)",
        overview.highest_consumer.0,
        format_kwh(overview.highest_consumer.1)
    )?;
    writeln!(
        out,
        "3. Peak Load Event: {} kWh at {} ({})",
        format_kwh(overview.peak.usage_kwh),
        format_timestamp(overview.peak.timestamp),
        overview.peak.building_id
    )?;
    writeln!(out)?;
    writeln!(out, "4. Daily Consumption Trends (Average per Day with Data):")?;
    for avg in &overview.daily_averages {
        writeln!(
            out,
            "   - {}: {} kWh/day (avg over {} days with data)",
            avg.building_id,
            format_kwh(avg.average_kwh),
            avg.periods
        )?;
    }
    writeln!(out, "5. Weekly Consumption (Average per Week with Data):")?;
    for avg in &overview.weekly_averages {
        writeln!(
            out,
            "   - {}: {} kWh/week (avg over {} weeks with data)",
            avg.building_id,
            format_kwh(avg.average_kwh),
            avg.periods
        )?;
    }
    writeln!(out, "{RULE}")?;

    for b in &analysis.buildings {
        writeln!(out)?;
        writeln!(out, "--- Report for Building: {} ---", b.building_id)?;
        writeln!(out, "Readings: {}", b.reading_count)?;
        writeln!(out, "Total Consumption (kWh): {}", format_kwh(b.total_kwh))?;
        writeln!(out, "Mean Consumption (kWh): {}", format_kwh(b.average_kwh))?;
        writeln!(out, "Min Consumption (kWh): {}", format_kwh(b.min_kwh))?;
        writeln!(
            out,
            "Max Consumption (kWh): {} at {}",
            format_kwh(b.peak_kwh),
            format_timestamp(b.peak_at)
        )?;
        writeln!(out, "Monthly Consumption (kWh):")?;
        for month in analysis.monthly.values().filter(|m| m.building_id == b.building_id) {
            let label = month.bucket.map(|bucket| bucket.to_string()).unwrap_or_default();
            writeln!(out, "   {label}: {}", format_kwh(month.total_kwh))?;
        }
    }

    Ok(())
}

pub struct TextReportSink {
    pub path: PathBuf,
}

impl Sink<Analysis<'_>> for TextReportSink {
    fn run(&self, input: &Analysis<'_>) -> Result<(), PipelineError> {
        let report = render_report(input);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                PipelineError::Sink(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        fs::write(&self.path, &report).map_err(|e| {
            PipelineError::Sink(format!("failed to write {}: {e}", self.path.display()))
        })?;

        tracing::info!(file = %self.path.display(), "summary report written\n{report}");
        Ok(())
    }
}
