/// Arrival policies and their queue state.
pub mod arrival;
pub mod chargepoint;
/// Simulation clock for tick management.
pub mod clock;
pub mod demand;
pub mod engine;
pub mod rng;
pub mod stats;
pub mod types;

pub use engine::{Engine, simulate};
pub use stats::{Statistics, compute_statistics};
pub use types::{ChargingEvent, PerTickRecord, SimulationResult};
