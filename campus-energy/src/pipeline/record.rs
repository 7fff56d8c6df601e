use std::fmt;

use energy_model::domain::{format_timestamp, Reading, ReadingError};

use super::{Envelope, RowOrigin};

/// Raw column text for one CSV row. `None` means the column was absent from
/// the header or the row was too short to reach it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub building_id: Option<String>,
    pub timestamp: Option<String>,
    pub usage_kwh: Option<String>,
}

impl From<&Reading> for RawRow {
    fn from(r: &Reading) -> Self {
        RawRow {
            building_id: Some(r.building_id().to_string()),
            timestamp: Some(format_timestamp(r.timestamp())),
            usage_kwh: Some(r.usage_kwh().to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectReason {
    MissingBuildingId,
    InvalidTimestamp,
    InvalidUsageValue,
    NegativeUsage,
    DuplicateReading,
    /// The CSV reader could not decode the record (e.g. invalid UTF-8).
    MalformedRow,
}

impl RejectReason {
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingBuildingId => "MISSING_BUILDING_ID",
            Self::InvalidTimestamp => "INVALID_TIMESTAMP",
            Self::InvalidUsageValue => "INVALID_USAGE_VALUE",
            Self::NegativeUsage => "NEGATIVE_USAGE",
            Self::DuplicateReading => "DUPLICATE_READING",
            Self::MalformedRow => "MALFORMED_ROW",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl From<&ReadingError> for RejectReason {
    fn from(e: &ReadingError) -> Self {
        match e {
            ReadingError::EmptyBuildingId => Self::MissingBuildingId,
            ReadingError::NonFiniteUsage(_) => Self::InvalidUsageValue,
            ReadingError::NegativeUsage(_) => Self::NegativeUsage,
        }
    }
}

/// A row that failed validation. Never part of the clean set.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub origin: RowOrigin,
    pub reason: RejectReason,
    pub detail: String,
    pub raw: RawRow,
}

impl RejectedRow {
    pub fn new(origin: RowOrigin, reason: RejectReason, detail: impl Into<String>, raw: RawRow) -> Self {
        Self {
            origin,
            reason,
            detail: detail.into(),
            raw,
        }
    }

    pub(crate) fn duplicate(env: Envelope<Reading>) -> Self {
        let detail = format!(
            "duplicate reading for {} at {}",
            env.payload.building_id(),
            format_timestamp(env.payload.timestamp())
        );
        let raw = RawRow::from(&env.payload);
        Self::new(env.origin, RejectReason::DuplicateReading, detail, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_are_stable() {
        let codes: Vec<&str> = [
            RejectReason::MissingBuildingId,
            RejectReason::InvalidTimestamp,
            RejectReason::InvalidUsageValue,
            RejectReason::NegativeUsage,
            RejectReason::DuplicateReading,
            RejectReason::MalformedRow,
        ]
        .iter()
        .map(|r| r.code())
        .collect();

        assert_eq!(
            codes,
            vec![
                "MISSING_BUILDING_ID",
                "INVALID_TIMESTAMP",
                "INVALID_USAGE_VALUE",
                "NEGATIVE_USAGE",
                "DUPLICATE_READING",
                "MALFORMED_ROW",
            ]
        );
        assert_eq!(RejectReason::NegativeUsage.to_string(), "NEGATIVE_USAGE");
    }

    #[test]
    fn reading_errors_map_to_reasons() {
        assert_eq!(
            RejectReason::from(&ReadingError::EmptyBuildingId),
            RejectReason::MissingBuildingId
        );
        assert_eq!(
            RejectReason::from(&ReadingError::NegativeUsage(-1.0)),
            RejectReason::NegativeUsage
        );
        assert_eq!(
            RejectReason::from(&ReadingError::NonFiniteUsage(f64::NAN)),
            RejectReason::InvalidUsageValue
        );
    }
}
