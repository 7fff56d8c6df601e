use time::PrimitiveDateTime;

/// One validated meter observation.
///
/// Fields are private so a `Reading` can only be obtained through
/// [`Reading::new`], which enforces:
/// - `building_id` is non-empty,
/// - `usage_kwh` is finite and non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    building_id: String,
    timestamp: PrimitiveDateTime,
    usage_kwh: f64,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ReadingError {
    #[error("building_id must be non-empty")]
    EmptyBuildingId,
    #[error("usage_kwh must be a finite number, got {0}")]
    NonFiniteUsage(f64),
    #[error("usage_kwh must be non-negative, got {0}")]
    NegativeUsage(f64),
}

impl Reading {
    pub fn new(
        building_id: impl Into<String>,
        timestamp: PrimitiveDateTime,
        usage_kwh: f64,
    ) -> Result<Self, ReadingError> {
        let building_id = building_id.into();
        if building_id.trim().is_empty() {
            return Err(ReadingError::EmptyBuildingId);
        }
        if !usage_kwh.is_finite() {
            return Err(ReadingError::NonFiniteUsage(usage_kwh));
        }
        if usage_kwh < 0.0 {
            return Err(ReadingError::NegativeUsage(usage_kwh));
        }

        Ok(Self {
            building_id,
            timestamp,
            // -0.0 + 0.0 is +0.0
            usage_kwh: usage_kwh + 0.0,
        })
    }

    pub fn building_id(&self) -> &str {
        &self.building_id
    }

    pub fn timestamp(&self) -> PrimitiveDateTime {
        self.timestamp
    }

    pub fn usage_kwh(&self) -> f64 {
        self.usage_kwh
    }
}

/// `YYYY-MM-DD HH:MM:SS`, the form used in exports and reports.
pub fn format_timestamp(ts: PrimitiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        ts.year(),
        u8::from(ts.month()),
        ts.day(),
        ts.hour(),
        ts.minute(),
        ts.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn reading_accepts_valid_values() {
        let r = Reading::new("B1", datetime!(2024-01-01 00:00), 10.5).unwrap();
        assert_eq!(r.building_id(), "B1");
        assert_eq!(r.timestamp(), datetime!(2024-01-01 00:00));
        assert_eq!(r.usage_kwh(), 10.5);
    }

    #[test]
    fn reading_accepts_zero_usage() {
        assert!(Reading::new("B1", datetime!(2024-01-01 00:00), 0.0).is_ok());
    }

    #[test]
    fn negative_zero_is_normalised() {
        let r = Reading::new("B1", datetime!(2024-01-01 00:00), -0.0).unwrap();
        assert!(r.usage_kwh().is_sign_positive());
        assert_eq!(r.usage_kwh().to_string(), "0");
    }

    #[test]
    fn reading_rejects_blank_building() {
        let res = Reading::new("   ", datetime!(2024-01-01 00:00), 1.0);
        assert_eq!(res, Err(ReadingError::EmptyBuildingId));
    }

    #[test]
    fn reading_rejects_negative_usage() {
        let res = Reading::new("B2", datetime!(2024-01-01 00:00), -5.0);
        assert_eq!(res, Err(ReadingError::NegativeUsage(-5.0)));
    }

    #[test]
    fn reading_rejects_non_finite_usage() {
        let res = Reading::new("B2", datetime!(2024-01-01 00:00), f64::INFINITY);
        assert!(matches!(res, Err(ReadingError::NonFiniteUsage(_))));
        let res = Reading::new("B2", datetime!(2024-01-01 00:00), f64::NAN);
        assert!(matches!(res, Err(ReadingError::NonFiniteUsage(_))));
    }

    #[test]
    fn timestamp_formats_with_seconds() {
        assert_eq!(
            format_timestamp(datetime!(2024-03-09 07:05:02)),
            "2024-03-09 07:05:02"
        );
    }
}
