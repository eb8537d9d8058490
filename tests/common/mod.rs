//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::NaiveDateTime;
use ev_charge_sim::config::{ArrivalPolicyKind, ChargepointType, SimulationConfig};
use ev_charge_sim::sim::types::SimulationResult;

/// Hourly ticks, reference tables, fixed seed.
pub fn hourly_config(seed: u64) -> SimulationConfig {
    let mut cfg = SimulationConfig::baseline();
    cfg.simulation.granularity_ms = 3_600_000;
    cfg.simulation.seed = Some(seed);
    cfg
}

/// One 11 kW chargepoint, an arrival certain at hour 0 only, every vehicle needing 100 km.
pub fn single_daily_arrival() -> SimulationConfig {
    let mut cfg = hourly_config(1);
    cfg.chargepoints = vec![ChargepointType {
        power_kw: 11.0,
        count: 1,
    }];
    cfg.arrivals.hourly = vec![0.0; 24];
    cfg.arrivals.hourly[0] = 1.0;
    cfg.demand.distribution = vec![(100.0, 1.0)];
    cfg
}

/// One 11 kW chargepoint with an arrival certain at every hour.
pub fn single_saturated(policy: ArrivalPolicyKind) -> SimulationConfig {
    let mut cfg = single_daily_arrival();
    cfg.arrivals.hourly = vec![1.0; 24];
    cfg.simulation.policy = policy;
    cfg
}

/// Arrivals only during the first morning hours, so every session ends before the horizon.
pub fn morning_only(policy: ArrivalPolicyKind, chargepoints: usize) -> SimulationConfig {
    let mut cfg = hourly_config(17);
    cfg.simulation.granularity_ms = 900_000;
    cfg.simulation.policy = policy;
    cfg.chargepoints = vec![ChargepointType {
        power_kw: 11.0,
        count: chargepoints,
    }];
    cfg.arrivals.hourly = vec![0.0; 24];
    for p in &mut cfg.arrivals.hourly[..6] {
        *p = 0.5;
    }
    cfg.demand.distribution = vec![(0.0, 0.2), (30.0, 0.4), (100.0, 0.4)];
    cfg
}

pub const ALL_POLICIES: [ArrivalPolicyKind; 3] = [
    ArrivalPolicyKind::NoArrivalIfOccupied,
    ArrivalPolicyKind::PerChargepointQueue,
    ArrivalPolicyKind::FindFreeOrGlobalQueue,
];

/// Wall-clock time of tick 0 for `year`.
pub fn origin(year: i32) -> NaiveDateTime {
    SimulationResult::horizon_start(year)
}
