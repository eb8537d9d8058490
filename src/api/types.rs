//! API response and query types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::sim::stats::Statistics;
use crate::window::aggregate::MembershipStrategy;
use crate::window::filter::DateRange;

/// Optional date bounds, e.g. `?from=2025-03-01T00:00:00&to=2025-04-01T00:00:00`.
#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

impl From<&RangeQuery> for DateRange {
    fn from(q: &RangeQuery) -> Self {
        DateRange::new(q.from, q.to)
    }
}

/// Aggregation parameters for the series endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SeriesQuery {
    /// Window spec, `daily` when absent.
    pub window: Option<String>,
    /// Event membership, `overlap` when absent.
    pub strategy: Option<MembershipStrategy>,
}

/// Statistics over the requested range plus the run's configuration.
#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub config: SimulationConfig,
    pub statistics: Statistics,
    /// Events overlapping the range.
    pub events: usize,
}

/// One tick of telemetry.
#[derive(Debug, Serialize)]
pub struct TickRecord {
    pub tick: usize,
    pub time: NaiveDateTime,
    pub total_kw: f64,
    pub power_kw: Vec<f64>,
}

/// Error body for 4xx responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
