//! Date-range filtering of telemetry and charging events.
//!
//! Dates are read as offsets from January 1st of their own year, so a range
//! like `2030-03-01..2030-04-01` selects March regardless of the year the
//! run is presented in.

use std::ops::Range;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::config::SimulationConfig;
use crate::sim::types::{ChargingEvent, PerTickRecord};

/// Optional lower and upper bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDateTime>,
    pub to: Option<NaiveDateTime>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> Self {
        Self { from, to }
    }

    /// True when both bounds are set and `from` lies after `to`.
    pub fn is_inverted(&self) -> bool {
        matches!((self.from, self.to), (Some(from), Some(to)) if from > to)
    }
}

fn ms_from_start_of_year(t: NaiveDateTime) -> u64 {
    let new_year = NaiveDate::from_ymd_opt(t.year(), 1, 1)
        .unwrap_or_default()
        .and_time(chrono::NaiveTime::MIN);
    (t - new_year).num_milliseconds().max(0) as u64
}

/// Tick indices of `range` within `len` ticks, `None` when nothing is selected.
///
/// `from` rounds down and `to` rounds up to tick boundaries; both are
/// clamped to the data.
pub fn tick_range(config: &SimulationConfig, len: usize, range: DateRange) -> Option<Range<usize>> {
    let g = config.simulation.granularity_ms;
    if g == 0 {
        return None;
    }
    let clamp = |ticks: u64| usize::try_from(ticks).map_or(len, |i| i.min(len));
    let start = range
        .from
        .map_or(0, |from| clamp(ms_from_start_of_year(from) / g));
    let end = range
        .to
        .map_or(len, |to| clamp(ms_from_start_of_year(to).div_ceil(g)));
    (start < end).then_some(start..end)
}

/// Restricts per-tick telemetry to `range`.
///
/// An empty or inverted range yields an empty slice.
pub fn filter_tick_data<'a>(
    config: &SimulationConfig,
    ticks: &'a [PerTickRecord],
    range: DateRange,
) -> &'a [PerTickRecord] {
    match tick_range(config, ticks.len(), range) {
        Some(r) => &ticks[r],
        None => &[],
    }
}

/// Keeps events whose session overlaps `range`.
///
/// An event overlaps when it starts before the range's end tick and ends
/// at or after its start tick.
pub fn filter_charging_events(
    config: &SimulationConfig,
    events: &[ChargingEvent],
    range: DateRange,
) -> Vec<ChargingEvent> {
    let g = config.simulation.granularity_ms;
    if g == 0 {
        return Vec::new();
    }
    let start_tick = range.from.map_or(0, |from| {
        usize::try_from(ms_from_start_of_year(from) / g).unwrap_or(usize::MAX)
    });
    let end_tick = range.to.map_or(usize::MAX, |to| {
        usize::try_from(ms_from_start_of_year(to).div_ceil(g)).unwrap_or(usize::MAX)
    });
    if start_tick >= end_tick {
        return Vec::new();
    }
    events
        .iter()
        .filter(|e| e.start_tick < end_tick && e.end_tick >= start_tick)
        .copied()
        .collect()
}
