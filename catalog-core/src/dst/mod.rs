//! DST - Deterministic Simulation Testing
//!
//! TigerBeetle/FoundationDB-style deterministic simulation for the catalog
//! backends: a seeded RNG, a fault injector shared by every simulated
//! backend, and a harness that wires them together.
//!
//! # Usage
//!
//! ```rust
//! use catalog_core::dst::{FaultConfig, FaultType, SimConfig, Simulation};
//!
//! let env = Simulation::new(SimConfig::with_seed(42))
//!     .with_fault(FaultConfig::new(FaultType::StorageWriteFail, 1.0).with_filter("product_add"))
//!     .build();
//!
//! assert_eq!(env.faults.should_inject("product_add"), Some(FaultType::StorageWriteFail));
//! assert_eq!(env.faults.should_inject("product_get"), None);
//! ```
//!
//! Run with explicit seed for reproducibility:
//! ```bash
//! DST_SEED=12345 cargo test
//! ```

mod config;
mod fault;
mod rng;
mod simulation;

pub use config::{SimConfig, DST_SEED_ENV};
pub use fault::{FaultConfig, FaultInjector, FaultInjectorBuilder, FaultType};
pub use rng::DeterministicRng;
pub use simulation::{create_simulation, SimEnvironment, Simulation};
