//! Chargepoint occupancy state.

use crate::config::ChargepointType;

/// An in-progress charge session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargingSession {
    /// Energy still to deliver (kWh). Decreases every tick.
    pub remaining_kwh: f64,
    /// Tick at which charging started.
    pub start_tick: usize,
}

/// A single charging slot with a fixed rating and at most one vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct Chargepoint {
    /// Stable identity, equal to the index in the flattened list.
    pub id: usize,
    /// Rated power (kW).
    pub power_kw: f64,
    /// Current session, `None` when free.
    pub session: Option<ChargingSession>,
}

impl Chargepoint {
    /// Creates a free chargepoint.
    pub fn new(id: usize, power_kw: f64) -> Self {
        Self {
            id,
            power_kw,
            session: None,
        }
    }

    pub fn is_free(&self) -> bool {
        self.session.is_none()
    }

    /// Occupies the chargepoint with a vehicle needing `energy_kwh`.
    pub fn start_charging(&mut self, energy_kwh: f64, tick: usize) {
        self.session = Some(ChargingSession {
            remaining_kwh: energy_kwh,
            start_tick: tick,
        });
    }

    /// Delivers one tick worth of energy.
    ///
    /// Returns the session start tick when the session completes during this
    /// tick; the chargepoint is free afterwards.
    pub fn deliver(&mut self, tick_hours: f64) -> Option<usize> {
        let session = self.session.as_mut()?;
        session.remaining_kwh -= self.power_kw * tick_hours;
        if session.remaining_kwh <= 0.0 {
            let start = session.start_tick;
            self.session = None;
            Some(start)
        } else {
            None
        }
    }

    /// Instantaneous draw: rated power while charging, zero otherwise.
    pub fn power_draw_kw(&self) -> f64 {
        if self.is_free() { 0.0 } else { self.power_kw }
    }
}

/// Expands `(power, count)` groups into individual chargepoints with ids `0..n`.
pub fn flatten(types: &[ChargepointType]) -> Vec<Chargepoint> {
    types
        .iter()
        .flat_map(|t| std::iter::repeat_n(t.power_kw, t.count))
        .enumerate()
        .map(|(id, power_kw)| Chargepoint::new(id, power_kw))
        .collect()
}
