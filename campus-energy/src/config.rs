use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    pipeline::{DuplicatePolicy, Ingestion, PipelineError},
    sinks::{CsvExportSink, DashboardSink, TextReportSink},
    sources::{discover_csv_sources, ReadingCsvFileSource},
    transform::ReadingValidation,
};

pub const DEFAULT_CONFIG_PATH: &str = "campus-energy.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Directory of `*.csv` files, or a single CSV file.
    pub data_dir: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub dashboard_file: String,
    pub report_file: String,
    pub cleaned_data_file: String,
    pub building_summary_file: String,
    pub rejected_rows_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            dashboard_file: "dashboard.png".to_string(),
            report_file: "summary.txt".to_string(),
            cleaned_data_file: "cleaned_energy_data.csv".to_string(),
            building_summary_file: "building_summary.csv".to_string(),
            rejected_rows_file: "rejected_rows.csv".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn path_for(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn csv_export_sink(&self) -> CsvExportSink {
        CsvExportSink {
            cleaned_data: self.path_for(&self.cleaned_data_file),
            building_summary: self.path_for(&self.building_summary_file),
            rejected_rows: self.path_for(&self.rejected_rows_file),
        }
    }

    pub fn report_sink(&self) -> TextReportSink {
        TextReportSink {
            path: self.path_for(&self.report_file),
        }
    }

    pub fn dashboard_sink(&self) -> DashboardSink {
        DashboardSink::new(self.path_for(&self.dashboard_file))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub duplicate_policy: DuplicatePolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Written inside the output directory.
    pub snapshot_file: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            snapshot_file: "metrics.prom".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub ingestion: IngestionConfig,
    pub metrics: Option<MetricsConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            output: OutputConfig::default(),
            ingestion: IngestionConfig::default(),
            metrics: Some(MetricsConfig::default()),
        }
    }
}

impl AppConfig {
    /// Load from `CAMPUS_ENERGY_CONFIG`, falling back to
    /// `campus-energy.toml`. A missing file means all defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("CAMPUS_ENERGY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        let cfg: AppConfig = toml::from_str(&contents)?;
        Ok(cfg)
    }

    pub fn ingestion(&self) -> Result<Ingestion<ReadingCsvFileSource, ReadingValidation>, PipelineError> {
        Ok(Ingestion {
            sources: discover_csv_sources(&self.input.data_dir)?,
            validation: ReadingValidation,
            duplicate_policy: self.ingestion.duplicate_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.input.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.output.dir, PathBuf::from("output"));
        assert_eq!(cfg.output.report_file, "summary.txt");
        assert_eq!(cfg.ingestion.duplicate_policy, DuplicatePolicy::Keep);
        assert_eq!(
            cfg.metrics.map(|m| m.snapshot_file),
            Some("metrics.prom".to_string())
        );
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campus-energy.toml");
        fs::write(
            &path,
            r#"
[input]
data_dir = "readings"

[output]
dashboard_file = "board.png"

[ingestion]
duplicate_policy = "reject"
"#,
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.input.data_dir, PathBuf::from("readings"));
        assert_eq!(cfg.output.dir, PathBuf::from("output"));
        assert_eq!(
            cfg.output.path_for(&cfg.output.dashboard_file),
            PathBuf::from("output").join("board.png")
        );
        assert_eq!(cfg.ingestion.duplicate_policy, DuplicatePolicy::Reject);
        assert!(cfg.metrics.is_some());
    }

    #[test]
    fn unknown_duplicate_policy_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campus-energy.toml");
        fs::write(&path, "[ingestion]\nduplicate_policy = \"sum\"\n").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn ingestion_fails_for_missing_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = AppConfig {
            input: InputConfig {
                data_dir: dir.path().join("data"),
            },
            ..Default::default()
        };
        assert!(matches!(cfg.ingestion(), Err(PipelineError::FileNotFound(_))));
    }
}
