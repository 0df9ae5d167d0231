//! FaultInjector - Probabilistic Fault Injection
//!
//! TigerStyle: Explicit fault injection for chaos testing of backend clients.

use std::collections::HashMap;
use std::sync::Mutex;

use super::rng::DeterministicRng;
use crate::constants::DST_FAULT_PROBABILITY_MAX;

/// Types of faults that can be injected into a simulated backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultType {
    // =========================================================================
    // Storage Faults
    // =========================================================================
    /// Write (insert/replace) fails
    StorageWriteFail,
    /// Read (point lookup or scan) fails
    StorageReadFail,
    /// Delete fails
    StorageDeleteFail,

    // =========================================================================
    // Database Faults
    // =========================================================================
    /// Connection to the database fails
    DbConnectionFail,
    /// Query exceeds its deadline
    DbQueryTimeout,
    /// No pooled connection available
    DbPoolExhausted,

    // =========================================================================
    // Network Faults
    // =========================================================================
    /// Connection refused by the peer
    NetworkConnectionRefused,
    /// Connection reset mid-request
    NetworkReset,
}

impl FaultType {
    /// Get the fault type name as a string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StorageWriteFail => "storage_write_fail",
            Self::StorageReadFail => "storage_read_fail",
            Self::StorageDeleteFail => "storage_delete_fail",
            Self::DbConnectionFail => "db_connection_fail",
            Self::DbQueryTimeout => "db_query_timeout",
            Self::DbPoolExhausted => "db_pool_exhausted",
            Self::NetworkConnectionRefused => "network_connection_refused",
            Self::NetworkReset => "network_reset",
        }
    }
}

impl std::fmt::Display for FaultType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a specific fault.
#[derive(Debug, Clone)]
pub struct FaultConfig {
    /// The type of fault
    pub fault_type: FaultType,
    /// Probability of injection (0.0 to 1.0)
    pub probability: f64,
    /// Optional operation filter (substring match on the operation name)
    pub operation_filter: Option<String>,
    /// Maximum number of injections (None = unlimited)
    pub max_injections: Option<u64>,
}

impl FaultConfig {
    /// Create a new fault configuration.
    ///
    /// # Panics
    /// Panics if probability is not in [0, 1].
    #[must_use]
    pub fn new(fault_type: FaultType, probability: f64) -> Self {
        // Precondition
        assert!(
            (0.0..=DST_FAULT_PROBABILITY_MAX).contains(&probability),
            "probability must be in [0, {DST_FAULT_PROBABILITY_MAX}], got {probability}"
        );

        Self {
            fault_type,
            probability,
            operation_filter: None,
            max_injections: None,
        }
    }

    /// Only inject for operations whose name contains `filter`.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.operation_filter = Some(filter.into());
        self
    }

    /// Set maximum number of injections.
    ///
    /// # Panics
    /// Panics if `max` is zero.
    #[must_use]
    pub fn with_max_injections(mut self, max: u64) -> Self {
        // Precondition
        assert!(max > 0, "max_injections must be positive");
        self.max_injections = Some(max);
        self
    }

    fn applies_to(&self, operation: &str) -> bool {
        self.operation_filter
            .as_deref()
            .map_or(true, |filter| operation.contains(filter))
    }
}

/// Fault injector for simulation testing.
///
/// TigerStyle:
/// - Explicit fault registration before sharing
/// - Deterministic through RNG
/// - Interior mutability so it can be shared via `Arc`
#[derive(Debug)]
pub struct FaultInjector {
    rng: Mutex<DeterministicRng>,
    configs: Vec<FaultConfig>,
    /// Injections so far, per registered config (same index as `configs`)
    injections: Mutex<Vec<u64>>,
}

impl FaultInjector {
    /// Create a new fault injector with no faults registered.
    #[must_use]
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            configs: Vec::new(),
            injections: Mutex::new(Vec::new()),
        }
    }

    /// Register a fault configuration.
    ///
    /// Registration must happen before the injector is shared.
    pub fn register(&mut self, config: FaultConfig) {
        self.configs.push(config);
        self.injections
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(0);
    }

    /// Check if a fault should be injected for the given operation.
    ///
    /// Returns the fault type if one should be injected, None otherwise.
    pub fn should_inject(&self, operation: &str) -> Option<FaultType> {
        let mut injections = self
            .injections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        for (index, config) in self.configs.iter().enumerate() {
            if !config.applies_to(operation) {
                continue;
            }

            if let Some(max) = config.max_injections {
                if injections[index] >= max {
                    continue;
                }
            }

            let roll = {
                let mut rng = self
                    .rng
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                rng.next_bool(config.probability)
            };

            if roll {
                injections[index] += 1;
                tracing::trace!(
                    operation,
                    fault = config.fault_type.as_str(),
                    "injecting simulated fault"
                );
                return Some(config.fault_type);
            }
        }

        None
    }

    /// Injection counts keyed by fault type name.
    #[must_use]
    pub fn injection_stats(&self) -> HashMap<&'static str, u64> {
        let injections = self
            .injections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut stats = HashMap::new();
        for (config, count) in self.configs.iter().zip(injections.iter()) {
            *stats.entry(config.fault_type.as_str()).or_insert(0) += count;
        }
        stats
    }

    /// Get total number of injections.
    #[must_use]
    pub fn total_injections(&self) -> u64 {
        self.injections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .iter()
            .sum()
    }
}

/// Builder for `FaultInjector`.
pub struct FaultInjectorBuilder {
    rng: DeterministicRng,
    configs: Vec<FaultConfig>,
}

impl FaultInjectorBuilder {
    /// Create a new builder with the given RNG.
    #[must_use]
    pub fn new(rng: DeterministicRng) -> Self {
        Self {
            rng,
            configs: Vec::new(),
        }
    }

    /// Add a fault configuration.
    #[must_use]
    pub fn with_fault(mut self, config: FaultConfig) -> Self {
        self.configs.push(config);
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

    /// Build the `FaultInjector`.
    #[must_use]
    pub fn build(self) -> FaultInjector {
        let mut injector = FaultInjector::new(self.rng);
        for config in self.configs {
            injector.register(config);
        }
        injector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_no_faults_registered() {
        let injector = FaultInjector::new(DeterministicRng::new(42));

        for _ in 0..100 {
            assert!(injector.should_inject("product_add").is_none());
        }
    }

    #[test]
    fn test_always_inject() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::StorageWriteFail, 1.0));

        for _ in 0..10 {
            assert_eq!(
                injector.should_inject("product_add"),
                Some(FaultType::StorageWriteFail)
            );
        }
    }

    #[test]
    fn test_never_inject() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::StorageWriteFail, 0.0));

        for _ in 0..100 {
            assert!(injector.should_inject("product_add").is_none());
        }
    }

    #[test]
    fn test_operation_filter() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector
            .register(FaultConfig::new(FaultType::StorageDeleteFail, 1.0).with_filter("delete"));

        assert_eq!(
            injector.should_inject("product_delete"),
            Some(FaultType::StorageDeleteFail)
        );
        assert!(injector.should_inject("product_get").is_none());
    }

    #[test]
    fn test_max_injections() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector
            .register(FaultConfig::new(FaultType::NetworkReset, 1.0).with_max_injections(2));

        assert_eq!(injector.should_inject("op"), Some(FaultType::NetworkReset));
        assert_eq!(injector.should_inject("op"), Some(FaultType::NetworkReset));
        assert!(injector.should_inject("op").is_none());
    }

    #[test]
    fn test_max_injections_counted_per_config() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(
            FaultConfig::new(FaultType::StorageReadFail, 1.0)
                .with_filter("get")
                .with_max_injections(1),
        );
        injector.register(
            FaultConfig::new(FaultType::StorageReadFail, 1.0)
                .with_filter("scan")
                .with_max_injections(1),
        );

        assert!(injector.should_inject("product_get").is_some());
        assert!(injector.should_inject("product_scan").is_some());
        assert!(injector.should_inject("product_get").is_none());
        assert!(injector.should_inject("product_scan").is_none());
    }

    #[test]
    fn test_injection_stats() {
        let mut injector = FaultInjector::new(DeterministicRng::new(42));
        injector.register(FaultConfig::new(FaultType::StorageWriteFail, 1.0));

        injector.should_inject("op");
        injector.should_inject("op");
        injector.should_inject("op");

        let stats = injector.injection_stats();
        assert_eq!(stats.get("storage_write_fail"), Some(&3));
        assert_eq!(injector.total_injections(), 3);
    }

    #[test]
    #[should_panic(expected = "probability must be in")]
    fn test_invalid_probability() {
        let _ = FaultConfig::new(FaultType::StorageWriteFail, 1.5);
    }

    #[test]
    #[should_panic(expected = "max_injections must be positive")]
    fn test_invalid_max_injections() {
        let _ = FaultConfig::new(FaultType::StorageWriteFail, 0.5).with_max_injections(0);
    }

    #[test]
    fn test_builder_and_arc_sharing() {
        let injector = Arc::new(
            FaultInjectorBuilder::new(DeterministicRng::new(42))
                .with_fault(FaultConfig::new(FaultType::DbQueryTimeout, 1.0))
                .build(),
        );

        let shared = Arc::clone(&injector);
        assert_eq!(
            shared.should_inject("product_scan"),
            Some(FaultType::DbQueryTimeout)
        );
        assert_eq!(injector.total_injections(), 1);
    }

    #[test]
    fn test_fault_type_as_str() {
        assert_eq!(FaultType::StorageWriteFail.as_str(), "storage_write_fail");
        assert_eq!(FaultType::DbPoolExhausted.to_string(), "db_pool_exhausted");
    }
}
