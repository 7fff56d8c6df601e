use anyhow::Result;
use campus_energy::{
    config::AppConfig,
    metrics_snapshot, observability,
    pipeline::Sink,
    sinks::Analysis,
};

fn main() -> Result<()> {
    observability::init_tracing();
    metrics_snapshot::init();

    let cfg = AppConfig::load()?;
    tracing::info!(
        data_dir = %cfg.input.data_dir.display(),
        output_dir = %cfg.output.dir.display(),
        duplicate_policy = ?cfg.ingestion.duplicate_policy,
        "starting campus energy run"
    );

    let outcome = cfg.ingestion()?.run()?;
    let analysis = Analysis::build(&outcome)?;

    cfg.output.csv_export_sink().run(&analysis)?;
    cfg.output.report_sink().run(&analysis)?;

    // Presentation only: a missing font must not discard the exports above.
    if let Err(e) = cfg.output.dashboard_sink().run(&analysis) {
        tracing::error!(error = %e, "dashboard not rendered");
    }

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_snapshot::write_snapshot(&cfg.output.path_for(&metrics_cfg.snapshot_file))?;
    }

    tracing::info!("campus energy run complete");
    Ok(())
}
