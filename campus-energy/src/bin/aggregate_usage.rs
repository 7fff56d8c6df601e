use anyhow::Result;
use campus_energy::{
    config::AppConfig,
    metrics_snapshot, observability,
    sinks::{text_report::format_kwh, Analysis},
};
use energy_model::{analytics::Summaries, domain::format_timestamp};

fn log_table(label: &str, summaries: &Summaries) {
    for (key, record) in summaries {
        let bucket = key.bucket.map(|b| b.to_string()).unwrap_or_default();
        tracing::info!(
            table = label,
            building = %key.building_id,
            bucket = %bucket,
            total_kwh = %format_kwh(record.total_kwh),
            average_kwh = %format_kwh(record.average_kwh),
            peak_kwh = %format_kwh(record.peak_kwh),
            readings = record.reading_count,
            "summary row"
        );
    }
}

fn main() -> Result<()> {
    observability::init_tracing();
    metrics_snapshot::init();

    let cfg = AppConfig::load()?;
    let outcome = cfg.ingestion()?.run()?;
    let analysis = Analysis::build(&outcome)?;

    log_table("daily", &analysis.daily);
    log_table("weekly", &analysis.weekly);
    log_table("monthly", &analysis.monthly);

    for b in &analysis.buildings {
        tracing::info!(
            table = "building",
            building = %b.building_id,
            total_kwh = %format_kwh(b.total_kwh),
            mean_kwh = %format_kwh(b.average_kwh),
            min_kwh = %format_kwh(b.min_kwh),
            max_kwh = %format_kwh(b.peak_kwh),
            peak_at = %format_timestamp(b.peak_at),
            readings = b.reading_count,
            "building summary"
        );
    }

    let overview = &analysis.overview;
    tracing::info!(
        total_kwh = %format_kwh(overview.total_kwh),
        highest_consumer = %overview.highest_consumer.0,
        peak_building = %overview.peak.building_id,
        peak_kwh = %format_kwh(overview.peak.usage_kwh),
        peak_at = %format_timestamp(overview.peak.timestamp),
        "campus overview"
    );
    Ok(())
}
