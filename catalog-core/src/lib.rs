//! Catalog Core - Limits and Deterministic Simulation
//!
//! Shared foundation for the catalog storage layer:
//!
//! - [`constants`] - product field limits, backend timeouts and pool sizes
//! - [`dst`] - deterministic simulation testing (seeded RNG, fault injection)
//!
//! Every simulated backend draws its failures from a [`dst::FaultInjector`],
//! so a failing test replays exactly with the same `DST_SEED`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod constants;
pub mod dst;

pub use constants::*;
pub use dst::{
    create_simulation, DeterministicRng, FaultConfig, FaultInjector, FaultInjectorBuilder,
    FaultType, SimConfig, SimEnvironment, Simulation,
};
