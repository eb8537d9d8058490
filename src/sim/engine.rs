//! Simulation engine that advances chargepoints, arrivals and telemetry tick by tick.

use tracing::{debug, info, trace};

use crate::config::{DemandConfig, SimulationConfig};
use crate::error::Result;

use super::arrival::{ArrivalContext, ArrivalPolicy};
use super::chargepoint::{Chargepoint, flatten};
use super::clock::Clock;
use super::demand::DemandSampler;
use super::rng::SimRng;
use super::types::{ChargingEvent, PerTickRecord, SimulationResult};

/// Simulation engine owning all per-run state.
///
/// Every run builds its own chargepoints, random source and policy queues
/// from the configuration, so independent engines never share state.
pub struct Engine {
    clock: Clock,
    chargepoints: Vec<Chargepoint>,
    policy: ArrivalPolicy,
    rng: SimRng,
    demand: DemandSampler,
    demand_config: DemandConfig,
    /// `hourly[h] * multiplier` for each hour of the day.
    hourly_probability: Vec<f64>,
    events: Vec<ChargingEvent>,
}

impl Engine {
    /// Creates an engine for one run.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] when the configuration violates
    /// any constraint; nothing is simulated in that case.
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.ensure_valid()?;
        let chargepoints = flatten(&config.chargepoints);
        let multiplier = config.arrivals.multiplier;
        Ok(Self {
            clock: Clock::for_year(config.simulation.granularity_ms),
            policy: ArrivalPolicy::new(config.simulation.policy, chargepoints.len()),
            chargepoints,
            rng: SimRng::new(config.simulation.seed),
            demand: DemandSampler::new(&config.demand.distribution),
            demand_config: config.demand.clone(),
            hourly_probability: config
                .arrivals
                .hourly
                .iter()
                .map(|p| p * multiplier)
                .collect(),
            events: Vec::new(),
        })
    }

    /// Executes one tick and returns its telemetry.
    ///
    /// Order within a tick: energy delivery and completion, arrival
    /// probability lookup, arrival policy, telemetry.
    pub fn step(&mut self, tick: usize) -> PerTickRecord {
        // 1. Deliver energy; finished sessions free their chargepoint
        let tick_hours = self.clock.tick_hours();
        for cp in &mut self.chargepoints {
            if let Some(start_tick) = cp.deliver(tick_hours) {
                trace!(chargepoint = cp.id, start_tick, end_tick = tick, "session complete");
                self.events.push(ChargingEvent {
                    chargepoint_id: cp.id,
                    start_tick,
                    end_tick: tick,
                });
            }
        }

        // 2. Arrivals only roll at the top of each hour
        let probability = self
            .clock
            .hour_of_day(tick)
            .map_or(0.0, |hour| self.hourly_probability[hour]);

        // 3. Policy
        let mut ctx = ArrivalContext {
            tick,
            probability,
            chargepoints: &mut self.chargepoints,
            rng: &mut self.rng,
            demand: &self.demand,
            demand_config: &self.demand_config,
        };
        self.policy.simulate_arrivals(&mut ctx);

        // 4. Telemetry
        PerTickRecord {
            power_kw: self
                .chargepoints
                .iter()
                .map(Chargepoint::power_draw_kw)
                .collect(),
        }
    }

    /// Runs every tick of the horizon and returns the accumulated outputs.
    pub fn run(mut self) -> SimulationResult {
        info!(
            ticks = self.clock.total(),
            chargepoints = self.chargepoints.len(),
            policy = self.policy.kind().as_str(),
            "simulation started"
        );
        let mut per_tick = Vec::with_capacity(self.clock.total());
        let mut clock = self.clock.clone();
        clock.run(|tick| per_tick.push(self.step(tick)));

        debug!(
            still_charging = self.chargepoints.iter().filter(|cp| !cp.is_free()).count(),
            still_queued = self.policy.queued(),
            "horizon reached"
        );
        info!(events = self.events.len(), "simulation finished");
        SimulationResult {
            per_tick,
            events: self.events,
        }
    }

    pub fn chargepoints(&self) -> &[Chargepoint] {
        &self.chargepoints
    }

    pub fn policy(&self) -> &ArrivalPolicy {
        &self.policy
    }
}

/// Runs one full simulation for `config`.
///
/// With a seed the result is a pure function of the configuration.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidConfig`] if the configuration is invalid.
pub fn simulate(config: &SimulationConfig) -> Result<SimulationResult> {
    Ok(Engine::new(config)?.run())
}
