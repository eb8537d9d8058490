//! Post-hoc statistics computed from per-tick telemetry.

use std::fmt;

use serde::Serialize;

use crate::config::SimulationConfig;

use super::types::PerTickRecord;

/// Aggregate scalars derived from a run's per-tick telemetry.
///
/// Computed post-hoc from `&[PerTickRecord]` so that the same function
/// serves the full horizon and any filtered date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    /// Energy delivered across all chargepoints (kWh).
    pub total_energy_kwh: f64,
    /// Sum of all chargepoint ratings (kW).
    pub theoretical_max_power_kw: f64,
    /// Highest site-wide draw observed in any tick (kW).
    pub actual_max_power_kw: f64,
    /// `actual / theoretical`, or 0 when the theoretical maximum is 0.
    pub concurrency_factor: f64,
}

/// Computes statistics for `per_tick` under `config`'s chargepoints and granularity.
///
/// # Arguments
///
/// * `config` - Configuration the telemetry was produced with
/// * `per_tick` - Telemetry records, possibly a filtered sub-range
///
/// # Returns
///
/// A `Statistics` value; energy and actual peak are 0 for empty input.
pub fn compute_statistics(config: &SimulationConfig, per_tick: &[PerTickRecord]) -> Statistics {
    let theoretical = config.theoretical_max_power_kw();
    let tick_hours = config.tick_hours();

    let mut actual_max = 0.0_f64;
    let mut total_energy = 0.0_f64;
    for rec in per_tick {
        let total = rec.total_kw();
        actual_max = actual_max.max(total);
        total_energy += total * tick_hours;
    }

    let concurrency_factor = if theoretical > 0.0 {
        actual_max / theoretical
    } else {
        0.0
    };

    Statistics {
        total_energy_kwh: total_energy,
        theoretical_max_power_kw: theoretical,
        actual_max_power_kw: actual_max,
        concurrency_factor,
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Charging Statistics ---")?;
        writeln!(f, "Total energy:          {:.2} kWh", self.total_energy_kwh)?;
        writeln!(
            f,
            "Theoretical max power: {:.2} kW",
            self.theoretical_max_power_kw
        )?;
        writeln!(f, "Actual max power:      {:.2} kW", self.actual_max_power_kw)?;
        write!(
            f,
            "Concurrency factor:    {:.1}%",
            self.concurrency_factor * 100.0
        )
    }
}
