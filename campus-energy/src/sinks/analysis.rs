use energy_model::{
    analytics::{self, Summaries},
    domain::{CampusOverview, SummaryRecord},
};

use crate::pipeline::{IngestOutcome, PipelineError};

/// Everything the output sinks consume: the ingestion outcome plus the
/// summaries derived from its clean set.
pub struct Analysis<'a> {
    pub outcome: &'a IngestOutcome,
    pub buildings: Vec<SummaryRecord>,
    pub daily: Summaries,
    pub weekly: Summaries,
    pub monthly: Summaries,
    pub overview: CampusOverview,
}

impl<'a> Analysis<'a> {
    /// Fails with an aggregation error when the clean set is empty.
    pub fn build(outcome: &'a IngestOutcome) -> Result<Self, PipelineError> {
        let readings = &outcome.readings;
        let analysis = Self {
            outcome,
            buildings: analytics::building_summary(readings)?,
            daily: analytics::daily_totals(readings)?,
            weekly: analytics::weekly_totals(readings)?,
            monthly: analytics::monthly_totals(readings)?,
            overview: analytics::campus_overview(readings)?,
        };

        tracing::info!(
            buildings = analysis.buildings.len(),
            daily_groups = analysis.daily.len(),
            weekly_groups = analysis.weekly.len(),
            monthly_groups = analysis.monthly.len(),
            total_kwh = analysis.overview.total_kwh,
            "aggregation finished"
        );

        Ok(analysis)
    }
}
