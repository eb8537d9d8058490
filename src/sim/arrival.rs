//! Arrival policies: how newly arrived vehicles are matched to chargepoints.

use std::collections::VecDeque;

use crate::config::{ArrivalPolicyKind, DemandConfig};

use super::chargepoint::Chargepoint;
use super::demand::DemandSampler;
use super::rng::SimRng;

/// A vehicle waiting for a chargepoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedEv {
    /// Energy the vehicle needs (kWh).
    pub energy_kwh: f64,
}

/// Everything a policy reads or mutates during one tick.
pub struct ArrivalContext<'a> {
    /// Current tick index.
    pub tick: usize,
    /// Per-chargepoint arrival probability for this tick (0 off the hour).
    pub probability: f64,
    pub chargepoints: &'a mut [Chargepoint],
    pub rng: &'a mut SimRng,
    pub demand: &'a DemandSampler,
    /// Converts sampled kilometres to kWh.
    pub demand_config: &'a DemandConfig,
}

impl ArrivalContext<'_> {
    /// Rolls for an arrival; on success samples the vehicle's need.
    ///
    /// Returns the energy in kWh only for arrivals that need a charge.
    fn roll_arrival(&mut self) -> Option<f64> {
        if self.rng.next() >= self.probability {
            return None;
        }
        let km = self.demand.sample(self.rng);
        (km > 0.0).then(|| self.demand_config.energy_for_km(km))
    }

    fn start(&mut self, index: usize, energy_kwh: f64) {
        let tick = self.tick;
        self.chargepoints[index].start_charging(energy_kwh, tick);
    }
}

/// Closed set of arrival behaviours, each owning its queue state.
#[derive(Debug, Clone)]
pub enum ArrivalPolicy {
    /// Arrivals only happen at free chargepoints; the rest are lost.
    NoArrivalIfOccupied,
    /// One FIFO queue per chargepoint.
    PerChargepointQueue { queues: Vec<VecDeque<QueuedEv>> },
    /// Redirect to any free chargepoint, otherwise wait in a shared FIFO.
    FindFreeOrGlobalQueue { queue: VecDeque<QueuedEv> },
}

impl ArrivalPolicy {
    /// Creates fresh policy state for `chargepoint_count` chargepoints.
    pub fn new(kind: ArrivalPolicyKind, chargepoint_count: usize) -> Self {
        match kind {
            ArrivalPolicyKind::NoArrivalIfOccupied => Self::NoArrivalIfOccupied,
            ArrivalPolicyKind::PerChargepointQueue => Self::PerChargepointQueue {
                queues: vec![VecDeque::new(); chargepoint_count],
            },
            ArrivalPolicyKind::FindFreeOrGlobalQueue => Self::FindFreeOrGlobalQueue {
                queue: VecDeque::new(),
            },
        }
    }

    pub fn kind(&self) -> ArrivalPolicyKind {
        match self {
            Self::NoArrivalIfOccupied => ArrivalPolicyKind::NoArrivalIfOccupied,
            Self::PerChargepointQueue { .. } => ArrivalPolicyKind::PerChargepointQueue,
            Self::FindFreeOrGlobalQueue { .. } => ArrivalPolicyKind::FindFreeOrGlobalQueue,
        }
    }

    /// Number of vehicles currently waiting.
    pub fn queued(&self) -> usize {
        match self {
            Self::NoArrivalIfOccupied => 0,
            Self::PerChargepointQueue { queues } => queues.iter().map(VecDeque::len).sum(),
            Self::FindFreeOrGlobalQueue { queue } => queue.len(),
        }
    }

    /// Runs one tick of the policy.
    ///
    /// Queued vehicles are served every tick. New arrivals are rolled only
    /// when `ctx.probability > 0`; with probability zero no random numbers
    /// are drawn.
    pub fn simulate_arrivals(&mut self, ctx: &mut ArrivalContext<'_>) {
        match self {
            Self::NoArrivalIfOccupied => no_arrival_if_occupied(ctx),
            Self::PerChargepointQueue { queues } => per_chargepoint_queue(queues, ctx),
            Self::FindFreeOrGlobalQueue { queue } => find_free_or_global_queue(queue, ctx),
        }
    }
}

fn no_arrival_if_occupied(ctx: &mut ArrivalContext<'_>) {
    if ctx.probability == 0.0 {
        return;
    }
    for i in 0..ctx.chargepoints.len() {
        if !ctx.chargepoints[i].is_free() {
            continue;
        }
        if let Some(energy_kwh) = ctx.roll_arrival() {
            ctx.start(i, energy_kwh);
        }
    }
}

fn per_chargepoint_queue(queues: &mut [VecDeque<QueuedEv>], ctx: &mut ArrivalContext<'_>) {
    for (i, queue) in queues.iter_mut().enumerate() {
        if !ctx.chargepoints[i].is_free() {
            continue;
        }
        if let Some(ev) = queue.pop_front() {
            ctx.start(i, ev.energy_kwh);
        }
    }

    if ctx.probability == 0.0 {
        return;
    }
    for (i, queue) in queues.iter_mut().enumerate() {
        let Some(energy_kwh) = ctx.roll_arrival() else {
            continue;
        };
        if ctx.chargepoints[i].is_free() {
            ctx.start(i, energy_kwh);
        } else {
            queue.push_back(QueuedEv { energy_kwh });
        }
    }
}

fn find_free_or_global_queue(queue: &mut VecDeque<QueuedEv>, ctx: &mut ArrivalContext<'_>) {
    for i in 0..ctx.chargepoints.len() {
        if !ctx.chargepoints[i].is_free() {
            continue;
        }
        match queue.pop_front() {
            Some(ev) => ctx.start(i, ev.energy_kwh),
            None => break,
        }
    }

    if ctx.probability == 0.0 {
        return;
    }
    let mut free: VecDeque<usize> = ctx
        .chargepoints
        .iter()
        .enumerate()
        .filter(|(_, cp)| cp.is_free())
        .map(|(i, _)| i)
        .collect();

    for i in 0..ctx.chargepoints.len() {
        let Some(energy_kwh) = ctx.roll_arrival() else {
            continue;
        };
        if ctx.chargepoints[i].is_free() {
            ctx.start(i, energy_kwh);
            continue;
        }
        // Snapshot entries may have been taken directly since the snapshot.
        let target = std::iter::from_fn(|| free.pop_front())
            .find(|&j| ctx.chargepoints[j].is_free());
        match target {
            Some(j) => ctx.start(j, energy_kwh),
            None => queue.push_back(QueuedEv { energy_kwh }),
        }
    }
}
