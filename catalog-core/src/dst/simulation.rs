//! Simulation - DST Test Harness
//!
//! `TigerStyle`: One seed controls every random decision in a test run.

use std::future::Future;
use std::sync::Arc;

use super::config::SimConfig;
use super::fault::{FaultConfig, FaultInjector, FaultInjectorBuilder, FaultType};
use super::rng::DeterministicRng;

/// Environment provided to simulation tests.
///
/// The fault injector is shared (via `Arc`) with every simulated backend the
/// test builds from this environment.
pub struct SimEnvironment {
    /// Simulation configuration
    pub config: SimConfig,
    /// Deterministic RNG for the test body (independent of the fault stream)
    pub rng: DeterministicRng,
    /// Fault injector shared with simulated backends
    pub faults: Arc<FaultInjector>,
}

/// DST simulation harness.
///
/// # Example
///
/// ```rust
/// use catalog_core::dst::{FaultConfig, FaultType, SimConfig, Simulation};
///
/// # #[tokio::main]
/// # async fn main() {
/// let sim = Simulation::new(SimConfig::with_seed(42))
///     .with_fault(FaultConfig::new(FaultType::StorageWriteFail, 0.1));
///
/// sim.run(|mut env| async move {
///     let id = env.rng.next_int(1, 10);
///     assert!((1..=10).contains(&id));
///     Ok::<(), std::convert::Infallible>(())
/// })
/// .await
/// .unwrap();
/// # }
/// ```
pub struct Simulation {
    config: SimConfig,
    fault_configs: Vec<FaultConfig>,
}

impl Simulation {
    /// Create a new simulation with the given configuration.
    #[must_use]
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            fault_configs: Vec::new(),
        }
    }

    /// Register a fault to inject during simulation.
    #[must_use]
    pub fn with_fault(mut self, fault_config: FaultConfig) -> Self {
        self.fault_configs.push(fault_config);
        self
    }

    /// Add read and write failures on every storage operation.
    #[must_use]
    pub fn with_storage_faults(self, probability: f64) -> Self {
        self.with_fault(FaultConfig::new(FaultType::StorageWriteFail, probability))
            .with_fault(FaultConfig::new(FaultType::StorageReadFail, probability))
    }

    /// Add connection failures and query timeouts.
    #[must_use]
    pub fn with_db_faults(self, probability: f64) -> Self {
        self.with_fault(FaultConfig::new(FaultType::DbConnectionFail, probability))
            .with_fault(FaultConfig::new(FaultType::DbQueryTimeout, probability))
    }

    /// Run the simulation with the given test function.
    ///
    /// # Errors
    /// Returns any error from the test function.
    pub async fn run<F, Fut, E>(self, test_fn: F) -> Result<(), E>
    where
        F: FnOnce(SimEnvironment) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let env = self.build();
        let seed = env.config.seed();
        let faults = Arc::clone(&env.faults);

        let result = test_fn(env).await;

        tracing::debug!(
            seed,
            injections = faults.total_injections(),
            ok = result.is_ok(),
            "simulation finished"
        );
        result
    }

    /// Build the simulation environment without running a test.
    #[must_use]
    pub fn build(self) -> SimEnvironment {
        let mut rng = DeterministicRng::new(self.config.seed());

        let mut fault_builder = FaultInjectorBuilder::new(rng.fork());
        for fault_config in self.fault_configs {
            fault_builder = fault_builder.with_fault(fault_config);
        }

        SimEnvironment {
            config: self.config,
            faults: Arc::new(fault_builder.build()),
            rng,
        }
    }
}

/// Create a simulation from an explicit seed, or from `DST_SEED`/random.
#[must_use]
pub fn create_simulation(seed: Option<u64>) -> Simulation {
    let config = match seed {
        Some(s) => SimConfig::with_seed(s),
        None => SimConfig::from_env_or_random(),
    };
    Simulation::new(config)
}
