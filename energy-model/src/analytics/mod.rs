pub mod usage_summaries;

pub use usage_summaries::{
    average_period_totals, building_summary, campus_overview, daily_totals, monthly_totals,
    summarize, weekly_totals, AggregationError, Summaries,
};
