use std::collections::BTreeMap;

use time::PrimitiveDateTime;

use crate::domain::{
    BuildingAverage, CampusOverview, Granularity, GroupKey, PeakEvent, Reading, SummaryRecord,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregationError {
    #[error("no readings to aggregate")]
    EmptyInput,
    /// Finite readings whose sum exceeds the `f64` range.
    #[error("total kWh for {0} is not finite")]
    NonFiniteTotal(String),
}

/// Summaries keyed by `(building_id, bucket)`, iterated in key order.
pub type Summaries = BTreeMap<GroupKey, SummaryRecord>;

struct Accumulator {
    total: f64,
    count: usize,
    peak: f64,
    min: f64,
    peak_at: PrimitiveDateTime,
}

impl Accumulator {
    fn new(r: &Reading) -> Self {
        Self {
            total: r.usage_kwh(),
            count: 1,
            peak: r.usage_kwh(),
            min: r.usage_kwh(),
            peak_at: r.timestamp(),
        }
    }

    fn add(&mut self, r: &Reading) {
        let kwh = r.usage_kwh();
        self.total += kwh;
        self.count += 1;
        self.min = self.min.min(kwh);
        // Ties resolve to the earliest timestamp so the result does not
        // depend on input order.
        if kwh > self.peak || (kwh == self.peak && r.timestamp() < self.peak_at) {
            self.peak = kwh;
            self.peak_at = r.timestamp();
        }
    }

    fn finish(self, key: GroupKey) -> SummaryRecord {
        SummaryRecord {
            building_id: key.building_id,
            bucket: key.bucket,
            total_kwh: self.total,
            average_kwh: self.total / self.count as f64,
            peak_kwh: self.peak,
            min_kwh: self.min,
            peak_at: self.peak_at,
            reading_count: self.count,
        }
    }
}

/// Group `readings` by building (and time bucket, unless `granularity` is
/// `Building`) in a single pass.
pub fn summarize(
    readings: &[Reading],
    granularity: Granularity,
) -> Result<Summaries, AggregationError> {
    if readings.is_empty() {
        return Err(AggregationError::EmptyInput);
    }

    let mut acc: BTreeMap<GroupKey, Accumulator> = BTreeMap::new();
    for r in readings {
        let key = GroupKey {
            building_id: r.building_id().to_string(),
            bucket: granularity.bucket(r.timestamp()),
        };
        match acc.get_mut(&key) {
            Some(a) => a.add(r),
            None => {
                acc.insert(key, Accumulator::new(r));
            }
        }
    }

    acc.into_iter()
        .map(|(key, a)| {
            if !a.total.is_finite() {
                return Err(AggregationError::NonFiniteTotal(key.building_id));
            }
            Ok((key.clone(), a.finish(key)))
        })
        .collect()
}

/// Total kWh per building per calendar day.
pub fn daily_totals(readings: &[Reading]) -> Result<Summaries, AggregationError> {
    summarize(readings, Granularity::Day)
}

/// Total kWh per building per week (weeks end on Sunday).
pub fn weekly_totals(readings: &[Reading]) -> Result<Summaries, AggregationError> {
    summarize(readings, Granularity::Week)
}

pub fn monthly_totals(readings: &[Reading]) -> Result<Summaries, AggregationError> {
    summarize(readings, Granularity::Month)
}

/// Whole-period statistics for each building, ordered by `building_id`.
pub fn building_summary(readings: &[Reading]) -> Result<Vec<SummaryRecord>, AggregationError> {
    Ok(summarize(readings, Granularity::Building)?
        .into_values()
        .collect())
}

/// Mean of each building's period totals, over the periods that have data.
pub fn average_period_totals(periods: &Summaries) -> Vec<BuildingAverage> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in periods.values() {
        let entry = sums.entry(record.building_id.as_str()).or_insert((0.0, 0));
        entry.0 += record.total_kwh;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(building_id, (total, n))| BuildingAverage {
            building_id: building_id.to_string(),
            average_kwh: total / n as f64,
            periods: n,
        })
        .collect()
}

/// Campus-wide facts for the executive summary.
pub fn campus_overview(readings: &[Reading]) -> Result<CampusOverview, AggregationError> {
    let buildings = building_summary(readings)?;

    let mut highest = (String::new(), f64::NEG_INFINITY);
    for b in &buildings {
        if b.total_kwh > highest.1 {
            highest = (b.building_id.clone(), b.total_kwh);
        }
    }

    // Largest reading; ties go to the earliest timestamp, then smallest id.
    let mut peak: Option<&Reading> = None;
    for r in readings {
        let better = match peak {
            None => true,
            Some(p) => {
                r.usage_kwh() > p.usage_kwh()
                    || (r.usage_kwh() == p.usage_kwh()
                        && (r.timestamp(), r.building_id()) < (p.timestamp(), p.building_id()))
            }
        };
        if better {
            peak = Some(r);
        }
    }
    let peak = peak.ok_or(AggregationError::EmptyInput)?;

    let total_kwh: f64 = buildings.iter().map(|b| b.total_kwh).sum();
    if !total_kwh.is_finite() {
        return Err(AggregationError::NonFiniteTotal("campus".to_string()));
    }

    Ok(CampusOverview {
        total_kwh,
        reading_count: readings.len(),
        building_count: buildings.len(),
        highest_consumer: highest,
        peak: PeakEvent {
            building_id: peak.building_id().to_string(),
            timestamp: peak.timestamp(),
            usage_kwh: peak.usage_kwh(),
        },
        daily_averages: average_period_totals(&daily_totals(readings)?),
        weekly_averages: average_period_totals(&weekly_totals(readings)?),
    })
}
