//! Simulation outputs: per-tick telemetry, charging events and the run result.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Instantaneous power draw of every chargepoint during one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerTickRecord {
    /// Power per chargepoint (kW), indexed by chargepoint id; 0 when idle.
    pub power_kw: Vec<f64>,
}

impl PerTickRecord {
    /// Site-wide draw during the tick (kW).
    pub fn total_kw(&self) -> f64 {
        self.power_kw.iter().sum()
    }
}

/// A completed charge session.
///
/// `end_tick` is the tick during which completion was detected; the vehicle
/// drew power on ticks `start_tick..end_tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChargingEvent {
    pub chargepoint_id: usize,
    pub start_tick: usize,
    pub end_tick: usize,
}

impl ChargingEvent {
    /// Number of ticks the session drew power.
    pub fn duration_ticks(&self) -> usize {
        self.end_tick - self.start_tick
    }
}

/// Everything one run produced.
///
/// Events are appended in detection order, so they are sorted by `end_tick`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationResult {
    /// One record per tick.
    pub per_tick: Vec<PerTickRecord>,
    /// Completed sessions, non-decreasing in `end_tick`.
    pub events: Vec<ChargingEvent>,
}

impl SimulationResult {
    /// Wall-clock time of tick 0: midnight on January 1st of `year`.
    ///
    /// Falls back to the Unix epoch year for years chrono cannot represent.
    pub fn horizon_start(year: i32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, 1, 1)
            .unwrap_or_default()
            .and_time(chrono::NaiveTime::MIN)
    }
}
