//! SimConfig - Simulation Configuration
//!
//! TigerStyle: Seed management for deterministic testing.

use rand::Rng;
use std::env;

use crate::constants::DST_SIMULATION_STEPS_MAX;

/// Environment variable holding a replay seed.
pub const DST_SEED_ENV: &str = "DST_SEED";

/// Configuration for a simulation run.
///
/// TigerStyle:
/// - Immutable after creation
/// - Seed printed for reproducibility
/// - All limits explicit
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    seed: u64,
    steps_max: u64,
}

impl SimConfig {
    /// Create config with explicit seed.
    ///
    /// # Example
    /// ```
    /// use catalog_core::dst::SimConfig;
    /// let config = SimConfig::with_seed(12345);
    /// assert_eq!(config.seed(), 12345);
    /// ```
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            steps_max: DST_SIMULATION_STEPS_MAX,
        }
    }

    /// Create config from `DST_SEED` or a fresh random seed.
    ///
    /// A random seed is printed to stderr so a failing run can be replayed
    /// with `DST_SEED=<seed> cargo test`.
    ///
    /// # Panics
    /// Panics if `DST_SEED` is set but is not a valid u64.
    #[must_use]
    pub fn from_env_or_random() -> Self {
        let seed = match env::var(DST_SEED_ENV) {
            Ok(seed_str) => seed_str
                .parse::<u64>()
                .unwrap_or_else(|_| panic!("DST_SEED must be a valid u64, got: {seed_str}")),
            Err(_) => {
                let seed = rand::thread_rng().gen::<u64>();
                eprintln!("DST: generated random seed (replay with DST_SEED={seed})");
                seed
            }
        };

        Self::with_seed(seed)
    }

    /// Get the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Get the maximum number of steps.
    #[must_use]
    pub fn steps_max(&self) -> u64 {
        self.steps_max
    }

    /// Create a new config with a different `steps_max`.
    ///
    /// # Panics
    /// Panics if `steps_max` is zero or above `DST_SIMULATION_STEPS_MAX`.
    #[must_use]
    pub fn with_steps_max(self, steps_max: u64) -> Self {
        // Precondition
        assert!(steps_max > 0, "steps_max must be positive");
        assert!(
            steps_max <= DST_SIMULATION_STEPS_MAX,
            "steps_max must be <= {DST_SIMULATION_STEPS_MAX}"
        );

        Self {
            seed: self.seed,
            steps_max,
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::from_env_or_random()
    }
}
