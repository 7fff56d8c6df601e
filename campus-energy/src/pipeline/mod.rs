use std::{collections::HashSet, path::PathBuf};

use energy_model::{analytics::AggregationError, domain::Reading};
use serde::Deserialize;
use time::PrimitiveDateTime;

pub mod outcome;
pub mod record;

pub use outcome::IngestOutcome;
pub use record::{RawRow, RejectReason, RejectedRow};

/// Position of a raw row in its input file (1-based line number).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOrigin {
    pub file: PathBuf,
    pub line: u64,
}

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub origin: RowOrigin,
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("input path not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("no data rows in {}", .0.display())]
    EmptyDataset(PathBuf),
    #[error("no CSV files found in {}", .0.display())]
    NoInputFiles(PathBuf),
    #[error("source error: {0}")]
    Source(String),
    #[error("sink error: {0}")]
    Sink(String),
    #[error("aggregation error: {0}")]
    Aggregation(#[from] AggregationError),
}

/// Per-record outcome of a source: a row to validate, or a record the
/// source could not decode at all.
pub type SourceItem<T> = Result<Envelope<T>, RejectedRow>;

pub trait Source<T> {
    /// Read the whole input. File-level failures abort; record-level
    /// failures come back as rejected items.
    fn read(&self) -> Result<Vec<SourceItem<T>>, PipelineError>;
}

pub trait Transform<I, O> {
    fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, RejectedRow>;
}

pub trait Sink<T: ?Sized> {
    fn run(&self, input: &T) -> Result<(), PipelineError>;
}

/// What to do with a second reading for the same `(building_id, timestamp)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Keep every row; duplicates are only counted.
    #[default]
    Keep,
    /// Divert second and later occurrences to the rejection list.
    Reject,
}

pub struct Ingestion<S, V> {
    pub sources: Vec<S>,
    pub validation: V,
    pub duplicate_policy: DuplicatePolicy,
}

impl<S, V> Ingestion<S, V>
where
    S: Source<RawRow>,
    V: Transform<RawRow, Reading>,
{
    pub fn run(&self) -> Result<IngestOutcome, PipelineError> {
        let mut outcome = IngestOutcome::default();
        let mut seen: HashSet<(String, PrimitiveDateTime)> = HashSet::new();

        for source in &self.sources {
            let items = source.read()?;
            outcome.files_read += 1;

            for item in items {
                outcome.rows_read += 1;
                metrics::counter!("ingest_rows_total").increment(1);

                let env = match item.and_then(|env| self.validation.apply(env)) {
                    Ok(env) => env,
                    Err(rejected) => {
                        tracing::debug!(
                            file = %rejected.origin.file.display(),
                            line = rejected.origin.line,
                            reason = %rejected.reason,
                            detail = %rejected.detail,
                            "row rejected"
                        );
                        outcome.rejected.push(rejected);
                        continue;
                    }
                };

                let key = (env.payload.building_id().to_string(), env.payload.timestamp());
                if !seen.insert(key) {
                    outcome.duplicates += 1;
                    metrics::counter!("ingest_duplicates_total").increment(1);
                    if self.duplicate_policy == DuplicatePolicy::Reject {
                        metrics::counter!(
                            "ingest_rows_rejected_total",
                            "reason" => RejectReason::DuplicateReading.code()
                        )
                        .increment(1);
                        outcome.rejected.push(RejectedRow::duplicate(env));
                        continue;
                    }
                }

                outcome.readings.push(env.payload);
            }
        }

        tracing::info!(
            files = outcome.files_read,
            rows = outcome.rows_read,
            accepted = outcome.readings.len(),
            rejected = outcome.rejected.len(),
            duplicates = outcome.duplicates,
            "ingestion finished"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sources::discover_csv_sources, transform::ReadingValidation};
    use std::fs;

    struct StaticSource(Vec<(&'static str, &'static str, &'static str)>);

    impl Source<RawRow> for StaticSource {
        fn read(&self) -> Result<Vec<SourceItem<RawRow>>, PipelineError> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(i, (b, t, u))| {
                    Ok(Envelope {
                        payload: RawRow {
                            building_id: Some(b.to_string()),
                            timestamp: Some(t.to_string()),
                            usage_kwh: Some(u.to_string()),
                        },
                        origin: RowOrigin {
                            file: PathBuf::from("static.csv"),
                            line: i as u64 + 2,
                        },
                    })
                })
                .collect())
        }
    }

    fn ingestion(
        rows: Vec<(&'static str, &'static str, &'static str)>,
        duplicate_policy: DuplicatePolicy,
    ) -> Ingestion<StaticSource, ReadingValidation> {
        Ingestion {
            sources: vec![StaticSource(rows)],
            validation: ReadingValidation,
            duplicate_policy,
        }
    }

    #[test]
    fn scenario_rejects_negative_usage_and_keeps_order() {
        let outcome = ingestion(
            vec![
                ("B1", "2024-01-01 00:00", "10"),
                ("B1", "2024-01-02 00:00", "20"),
                ("B2", "2024-01-01 00:00", "-5"),
            ],
            DuplicatePolicy::Keep,
        )
        .run()
        .unwrap();

        assert_eq!(outcome.readings.len(), 2);
        assert!(outcome.readings.iter().all(|r| r.building_id() == "B1"));
        assert_eq!(outcome.readings[0].usage_kwh(), 10.0);
        assert_eq!(outcome.readings[1].usage_kwh(), 20.0);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].reason, RejectReason::NegativeUsage);
        assert_eq!(outcome.rejected[0].raw.building_id.as_deref(), Some("B2"));
        assert_eq!(outcome.rejected[0].origin.line, 4);
    }

    #[test]
    fn duplicates_are_kept_and_counted_by_default() {
        let outcome = ingestion(
            vec![
                ("B1", "2024-01-01 00:00", "10"),
                ("B1", "2024-01-01 00:00:00", "12"),
            ],
            DuplicatePolicy::Keep,
        )
        .run()
        .unwrap();

        assert_eq!(outcome.readings.len(), 2);
        assert_eq!(outcome.duplicates, 1);
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn duplicates_can_be_rejected() {
        let outcome = ingestion(
            vec![
                ("B1", "2024-01-01 00:00", "10"),
                ("B2", "2024-01-01 00:00", "3"),
                ("B1", "2024-01-01 00:00", "12"),
            ],
            DuplicatePolicy::Reject,
        )
        .run()
        .unwrap();

        assert_eq!(outcome.readings.len(), 2);
        assert_eq!(outcome.readings[0].usage_kwh(), 10.0);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].reason, RejectReason::DuplicateReading);
        assert_eq!(outcome.rejected[0].origin.line, 4);
    }

    #[test]
    fn all_rows_rejected_is_not_an_error() {
        let outcome = ingestion(vec![("", "2024-01-01 00:00", "1")], DuplicatePolicy::Keep)
            .run()
            .unwrap();
        assert!(outcome.readings.is_empty());
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].reason, RejectReason::MissingBuildingId);
    }

    #[test]
    fn ingestion_is_idempotent() {
        let rows = vec![
            ("B1", "2024-01-01 00:00", "10"),
            ("B1", "bad", "20"),
            ("B3", "2024-01-03", "x"),
        ];
        let first = ingestion(rows.clone(), DuplicatePolicy::Keep).run().unwrap();
        let second = ingestion(rows, DuplicatePolicy::Keep).run().unwrap();

        assert_eq!(first.readings, second.readings);
        assert_eq!(first.rejected, second.rejected);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn files_are_concatenated_in_name_order_and_duplicates_span_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b.csv"),
            "building_id,timestamp,usage_kwh\nB1,2024-01-01 00:00,5\nB2,2024-01-03 00:00,9\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("a.csv"),
            "timestamp,building_id,usage_kwh\n2024-01-01 00:00:00,B1,7\n2024-01-02 00:00,B1,8\n",
        )
        .unwrap();

        let outcome = Ingestion {
            sources: discover_csv_sources(dir.path()).unwrap(),
            validation: ReadingValidation,
            duplicate_policy: DuplicatePolicy::Reject,
        }
        .run()
        .unwrap();

        assert_eq!(outcome.files_read, 2);
        let usages: Vec<f64> = outcome.readings.iter().map(|r| r.usage_kwh()).collect();
        assert_eq!(usages, vec![7.0, 8.0, 9.0]);

        assert_eq!(outcome.rejected.len(), 1);
        let dup = &outcome.rejected[0];
        assert_eq!(dup.reason, RejectReason::DuplicateReading);
        assert_eq!(dup.origin.file, dir.path().join("b.csv"));
        assert_eq!(dup.origin.line, 2);
        assert_eq!(outcome.duplicates, 1);
    }
}
