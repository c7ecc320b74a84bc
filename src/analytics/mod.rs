//! Read-side aggregation over survey responses.
//!
//! Pure functions over already-fetched rows so every computation is unit
//! testable without a database. Row sets at internal-HR-tool volumes fit
//! in memory comfortably; storage-side aggregation is a scaling followup,
//! not a correctness one.

pub mod aggregate;
pub mod csv;
#[cfg(test)]
pub mod test_fixtures;

pub use aggregate::{
    company_insights, demographic_breakdown, section_averages, survey_stats, wellbeing_metrics,
    CompanyInsight, DemographicBreakdown, LabelCount, SectionAverage, SurveyStats,
    WellbeingFilters, WellbeingMetrics,
};
