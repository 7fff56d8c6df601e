use energy_model::domain::Reading;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};

use crate::pipeline::{Envelope, RawRow, RejectReason, RejectedRow, Transform};

/// Parse a meter timestamp.
///
/// Accepted forms:
/// - `YYYY-MM-DD HH:MM[:SS[.fff]]` and the same with a `T` separator,
/// - `YYYY-MM-DD` (midnight),
/// - RFC 3339 with an offset, normalised to UTC.
pub fn parse_timestamp(raw: &str) -> Option<PrimitiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"))
        .or_else(|_| PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day] [hour]:[minute]")))
        .or_else(|_| PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]")))
        .or_else(|_| PrimitiveDateTime::parse(raw, format_description!("[year]-[month]-[day]T[hour]:[minute]")))
        .ok()
        .or_else(|| {
            Date::parse(raw, format_description!("[year]-[month]-[day]"))
                .ok()
                .map(Date::midnight)
        })
        .or_else(|| {
            let with_offset = OffsetDateTime::parse(raw, &Rfc3339).ok()?;
            let utc = OffsetDateTime::from_unix_timestamp_nanos(with_offset.unix_timestamp_nanos()).ok()?;
            Some(PrimitiveDateTime::new(utc.date(), utc.time()))
        })
}

/// Parse a kWh value. Non-finite numbers count as unparseable.
pub fn parse_usage(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Validate one raw row. Checks run in order and the first failure wins:
/// building id, timestamp, usage value, usage sign.
pub fn validate_reading(env: Envelope<RawRow>) -> Result<Envelope<Reading>, RejectedRow> {
    let Envelope { payload: raw, origin } = env;

    let building_id = raw.building_id.as_deref().unwrap_or("").trim().to_string();
    if building_id.is_empty() {
        return Err(RejectedRow::new(
            origin,
            RejectReason::MissingBuildingId,
            "building_id is missing or empty",
            raw,
        ));
    }

    let ts_raw = raw.timestamp.as_deref().unwrap_or("");
    let Some(timestamp) = parse_timestamp(ts_raw) else {
        let detail = format!("invalid timestamp '{ts_raw}'");
        return Err(RejectedRow::new(origin, RejectReason::InvalidTimestamp, detail, raw));
    };

    let usage_raw = raw.usage_kwh.as_deref().unwrap_or("");
    let Some(usage_kwh) = parse_usage(usage_raw) else {
        let detail = format!("invalid usage_kwh '{usage_raw}'");
        return Err(RejectedRow::new(origin, RejectReason::InvalidUsageValue, detail, raw));
    };

    match Reading::new(building_id, timestamp, usage_kwh) {
        Ok(reading) => Ok(Envelope {
            payload: reading,
            origin,
        }),
        Err(e) => Err(RejectedRow::new(origin, RejectReason::from(&e), e.to_string(), raw)),
    }
}

#[derive(Clone, Copy, Default)]
pub struct ReadingValidation;

impl Transform<RawRow, Reading> for ReadingValidation {
    fn apply(&self, input: Envelope<RawRow>) -> Result<Envelope<Reading>, RejectedRow> {
        match validate_reading(input) {
            Ok(env) => Ok(env),
            Err(rejected) => {
                metrics::counter!("ingest_rows_rejected_total", "reason" => rejected.reason.code())
                    .increment(1);
                Err(rejected)
            }
        }
    }
}
