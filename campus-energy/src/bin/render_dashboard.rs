use anyhow::Result;
use campus_energy::{config::AppConfig, metrics_snapshot, observability, pipeline::Sink, sinks::Analysis};

fn main() -> Result<()> {
    observability::init_tracing();
    metrics_snapshot::init();

    let cfg = AppConfig::load()?;
    let outcome = cfg.ingestion()?.run()?;
    let analysis = Analysis::build(&outcome)?;

    // Here the dashboard is the only product, so failure is fatal.
    cfg.output.dashboard_sink().run(&analysis)?;
    Ok(())
}
