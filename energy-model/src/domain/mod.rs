pub mod bucket;
pub mod reading;
pub mod summary;

pub use bucket::{Granularity, TimeBucket};
pub use reading::{format_timestamp, Reading, ReadingError};
pub use summary::{BuildingAverage, CampusOverview, GroupKey, PeakEvent, SummaryRecord};
