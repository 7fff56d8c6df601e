//! Process-local Prometheus recorder. The run is one-shot, so instead of
//! serving `/metrics` the rendered exposition text is written to a file at
//! the end.

use std::{fs, path::Path};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

use crate::pipeline::PipelineError;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global recorder. Counters recorded before this call are lost.
pub fn init() {
    if PROM_HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = PROM_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!(error = %e, "failed to install Prometheus metrics recorder"),
    }
}

/// Current exposition text, or `None` when no recorder is installed.
pub fn render() -> Option<String> {
    PROM_HANDLE.get().map(PrometheusHandle::render)
}

pub fn write_snapshot(path: &Path) -> Result<(), PipelineError> {
    let Some(text) = render() else {
        tracing::debug!("metrics recorder not installed, skipping snapshot");
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| PipelineError::Sink(format!("failed to create {}: {e}", parent.display())))?;
    }
    fs::write(path, text)
        .map_err(|e| PipelineError::Sink(format!("failed to write {}: {e}", path.display())))?;

    tracing::info!(file = %path.display(), "metrics snapshot written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_contains_recorded_counters() {
        init();
        metrics::counter!("ingest_files_total").increment(1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output").join("metrics.prom");
        write_snapshot(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("ingest_files_total"));
    }
}
