use time::PrimitiveDateTime;

use super::TimeBucket;

/// Grouping key for summaries. Orders by building first, then bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub building_id: String,
    pub bucket: Option<TimeBucket>,
}

/// Aggregated statistics for one `(building_id, bucket)` group.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    pub building_id: String,
    pub bucket: Option<TimeBucket>,
    pub total_kwh: f64,
    pub average_kwh: f64,
    pub peak_kwh: f64,
    pub min_kwh: f64,
    /// Earliest timestamp at which `peak_kwh` was observed.
    pub peak_at: PrimitiveDateTime,
    pub reading_count: usize,
}

/// Mean of a building's per-period totals (e.g. kWh per day with data).
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingAverage {
    pub building_id: String,
    pub average_kwh: f64,
    pub periods: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeakEvent {
    pub building_id: String,
    pub timestamp: PrimitiveDateTime,
    pub usage_kwh: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampusOverview {
    pub total_kwh: f64,
    pub reading_count: usize,
    pub building_count: usize,
    /// Building with the largest total; ties go to the smaller id.
    pub highest_consumer: (String, f64),
    pub peak: PeakEvent,
    pub daily_averages: Vec<BuildingAverage>,
    pub weekly_averages: Vec<BuildingAverage>,
}
