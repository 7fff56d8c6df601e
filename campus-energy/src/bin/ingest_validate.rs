use anyhow::Result;
use campus_energy::{config::AppConfig, metrics_snapshot, observability};

fn main() -> Result<()> {
    observability::init_tracing();
    metrics_snapshot::init();

    let cfg = AppConfig::load()?;
    let outcome = cfg.ingestion()?.run()?;

    for rejected in &outcome.rejected {
        tracing::warn!(
            file = %rejected.origin.file.display(),
            line = rejected.origin.line,
            reason = %rejected.reason,
            detail = %rejected.detail,
            "rejected row"
        );
    }
    for (reason, count) in outcome.rejection_counts() {
        tracing::info!(%reason, count, "rejections by reason");
    }

    tracing::info!(
        accepted = outcome.accepted(),
        rejected = outcome.rejected.len(),
        duplicates = outcome.duplicates,
        fingerprint = %outcome.fingerprint(),
        "validation complete"
    );
    Ok(())
}
