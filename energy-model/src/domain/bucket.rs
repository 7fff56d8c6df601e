use std::fmt;

use time::{Date, Duration, PrimitiveDateTime};

/// How readings are grouped before summarising.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// One group per building over the whole period.
    Building,
    Day,
    /// Calendar weeks ending on Sunday.
    Week,
    Month,
}

/// A coarsened timestamp used as the time part of a group key.
///
/// Every variant carries the date it is labelled by, so ordering buckets of
/// one granularity is ordering by date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeBucket {
    Day(Date),
    /// Labelled by the Sunday that closes the week.
    WeekEnding(Date),
    /// Labelled by the first day of the month.
    Month(Date),
}

impl Granularity {
    /// Derive the bucket for `ts`. `Building` has no time component.
    pub fn bucket(self, ts: PrimitiveDateTime) -> Option<TimeBucket> {
        let date = ts.date();
        match self {
            Self::Building => None,
            Self::Day => Some(TimeBucket::Day(date)),
            Self::Week => {
                let days_to_sunday = 6 - i64::from(date.weekday().number_days_from_monday());
                let ending = date
                    .checked_add(Duration::days(days_to_sunday))
                    .unwrap_or(Date::MAX);
                Some(TimeBucket::WeekEnding(ending))
            }
            Self::Month => Some(TimeBucket::Month(
                date.replace_day(1).unwrap_or(date),
            )),
        }
    }
}

impl TimeBucket {
    pub fn date(&self) -> Date {
        match *self {
            Self::Day(d) | Self::WeekEnding(d) | Self::Month(d) => d,
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.date();
        match self {
            Self::Month(_) => write!(f, "{:04}-{:02}", d.year(), u8::from(d.month())),
            Self::Day(_) | Self::WeekEnding(_) => {
                write!(f, "{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn building_granularity_has_no_bucket() {
        assert_eq!(Granularity::Building.bucket(datetime!(2024-01-01 10:00)), None);
    }

    #[test]
    fn day_bucket_truncates_time() {
        assert_eq!(
            Granularity::Day.bucket(datetime!(2024-01-01 23:59:59)),
            Some(TimeBucket::Day(date!(2024-01-01)))
        );
    }

    #[test]
    fn week_bucket_ends_on_sunday() {
        // 2024-01-01 is a Monday; 2024-01-07 is the following Sunday.
        let monday = Granularity::Week.bucket(datetime!(2024-01-01 00:00));
        let sunday = Granularity::Week.bucket(datetime!(2024-01-07 18:30));
        let next_monday = Granularity::Week.bucket(datetime!(2024-01-08 00:00));

        assert_eq!(monday, Some(TimeBucket::WeekEnding(date!(2024-01-07))));
        assert_eq!(sunday, monday);
        assert_eq!(next_monday, Some(TimeBucket::WeekEnding(date!(2024-01-14))));
    }

    #[test]
    fn month_bucket_is_first_of_month() {
        assert_eq!(
            Granularity::Month.bucket(datetime!(2024-02-29 12:00)),
            Some(TimeBucket::Month(date!(2024-02-01)))
        );
    }

    #[test]
    fn bucket_labels() {
        assert_eq!(TimeBucket::Day(date!(2024-01-05)).to_string(), "2024-01-05");
        assert_eq!(TimeBucket::WeekEnding(date!(2024-01-07)).to_string(), "2024-01-07");
        assert_eq!(TimeBucket::Month(date!(2024-11-01)).to_string(), "2024-11");
    }
}
