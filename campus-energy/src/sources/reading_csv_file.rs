use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use csv::StringRecord;

use crate::pipeline::{
    Envelope, PipelineError, RawRow, RejectReason, RejectedRow, RowOrigin, Source, SourceItem,
};

/// CSV source of raw meter readings.
///
/// Expected header columns (by name, any order, extra columns ignored):
/// - building_id
/// - timestamp
/// - usage_kwh
pub struct ReadingCsvFileSource {
    path: PathBuf,
}

impl ReadingCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn origin(&self, line: u64) -> RowOrigin {
        RowOrigin {
            file: self.path.clone(),
            line,
        }
    }
}

struct Columns {
    building_id: Option<usize>,
    timestamp: Option<usize>,
    usage_kwh: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        };
        Self {
            building_id: find("building_id"),
            timestamp: find("timestamp"),
            usage_kwh: find("usage_kwh"),
        }
    }

    fn missing(&self) -> Vec<&'static str> {
        [
            ("building_id", self.building_id),
            ("timestamp", self.timestamp),
            ("usage_kwh", self.usage_kwh),
        ]
        .into_iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    fn raw_row(&self, record: &StringRecord) -> RawRow {
        let get = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(|s| s.trim().to_string());
        RawRow {
            building_id: get(self.building_id),
            timestamp: get(self.timestamp),
            usage_kwh: get(self.usage_kwh),
        }
    }
}

impl Source<RawRow> for ReadingCsvFileSource {
    fn read(&self) -> Result<Vec<SourceItem<RawRow>>, PipelineError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(PipelineError::FileNotFound(self.path.clone()))
            }
            Err(e) => {
                return Err(PipelineError::Source(format!(
                    "failed to open CSV file {}: {e}",
                    self.path.display()
                )))
            }
        };

        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = rdr
            .headers()
            .map_err(|e| {
                PipelineError::Source(format!(
                    "failed to read CSV headers in {}: {e}",
                    self.path.display()
                ))
            })?
            .clone();

        let columns = Columns::from_headers(&headers);
        let missing = columns.missing();
        if !missing.is_empty() {
            tracing::warn!(
                file = %self.path.display(),
                missing = ?missing,
                "CSV header is missing required columns"
            );
        }

        let mut items = Vec::new();
        for (idx, result) in rdr.records().enumerate() {
            // Header is line 1.
            let fallback_line = idx as u64 + 2;
            match result {
                Ok(record) => {
                    let line = record.position().map_or(fallback_line, |p| p.line());
                    items.push(Ok(Envelope {
                        payload: columns.raw_row(&record),
                        origin: self.origin(line),
                    }));
                }
                Err(e) if e.is_io_error() => {
                    return Err(PipelineError::Source(format!(
                        "failed to read CSV record in {}: {e}",
                        self.path.display()
                    )));
                }
                Err(e) => {
                    metrics::counter!(
                        "ingest_rows_rejected_total",
                        "reason" => RejectReason::MalformedRow.code()
                    )
                    .increment(1);
                    let line = e.position().map_or(fallback_line, |p| p.line());
                    items.push(Err(RejectedRow::new(
                        self.origin(line),
                        RejectReason::MalformedRow,
                        e.to_string(),
                        RawRow::default(),
                    )));
                }
            }
        }

        if items.is_empty() {
            return Err(PipelineError::EmptyDataset(self.path.clone()));
        }

        metrics::counter!("ingest_files_total").increment(1);
        tracing::info!(file = %self.path.display(), rows = items.len(), "read CSV file");

        Ok(items)
    }
}
