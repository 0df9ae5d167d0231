//! `SimStorageBackend` - In-Memory Storage for Testing
//!
//! `TigerStyle`: Deterministic testing with fault injection.
//!
//! # Simulation-First
//!
//! The simulated backend is the reference implementation of the
//! [`StorageBackend`] contract. Each instance emulates one [`BackendKind`]
//! so errors carry the same backend identity a real client would report.
//!
//! Fault injection points, by operation name:
//! `product_get`, `product_scan`, `product_add`, `product_update`,
//! `product_delete`, `ping`, `close`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use catalog_core::dst::{DeterministicRng, FaultConfig, FaultInjector, SimConfig};

use super::backend::{BackendKind, Operation, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::product::{Product, ProductId};

// =============================================================================
// SimStorageBackend
// =============================================================================

/// In-memory storage backend for testing.
///
/// `TigerStyle`:
/// - Deterministic via the shared `FaultInjector`
/// - Conditional writes decided under one write lock
/// - Cheap to clone; clones share the same table
#[derive(Debug, Clone)]
pub struct SimStorageBackend {
    kind: BackendKind,
    /// Stored products indexed by ID
    storage: Arc<RwLock<HashMap<ProductId, Product>>>,
    /// Fault injector for simulating failures
    fault_injector: Arc<FaultInjector>,
    closed: Arc<AtomicBool>,
}

impl SimStorageBackend {
    /// Create a simulated backend with its own (empty) fault injector.
    #[must_use]
    pub fn new(kind: BackendKind, config: SimConfig) -> Self {
        let mut rng = DeterministicRng::new(config.seed());
        Self::with_fault_injector(kind, Arc::new(FaultInjector::new(rng.fork())))
    }

    /// Create a simulated backend sharing an external fault injector,
    /// typically `SimEnvironment::faults`.
    ///
    /// # Example
    /// ```rust
    /// use std::sync::Arc;
    /// use catalog_core::dst::{FaultConfig, FaultType, SimConfig, Simulation};
    /// use catalog_store::storage::{BackendKind, SimStorageBackend};
    ///
    /// let env = Simulation::new(SimConfig::with_seed(42))
    ///     .with_fault(FaultConfig::new(FaultType::StorageWriteFail, 0.1))
    ///     .build();
    /// let backend =
    ///     SimStorageBackend::with_fault_injector(BackendKind::Postgres, Arc::clone(&env.faults));
    /// assert_eq!(backend.product_count(), 0);
    /// ```
    #[must_use]
    pub fn with_fault_injector(kind: BackendKind, fault_injector: Arc<FaultInjector>) -> Self {
        Self {
            kind,
            storage: Arc::new(RwLock::new(HashMap::new())),
            fault_injector,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register a fault on a backend that has not been shared yet.
    ///
    /// # Panics
    /// Panics if the fault injector is already shared with another owner.
    #[must_use]
    pub fn with_faults(mut self, config: FaultConfig) -> Self {
        Arc::get_mut(&mut self.fault_injector)
            .expect("cannot add faults after backend is shared")
            .register(config);
        self
    }

    /// Get fault injector for inspection.
    #[must_use]
    pub fn fault_injector(&self) -> &Arc<FaultInjector> {
        &self.fault_injector
    }

    /// Number of stored products.
    #[must_use]
    pub fn product_count(&self) -> usize {
        self.read().len()
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ProductId, Product>> {
        self.storage.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ProductId, Product>> {
        self.storage.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail like a pool that has been shut down, then roll for a fault.
    fn enter(&self, operation: Operation, fault_point: &str) -> StorageResult<()> {
        if self.is_closed() {
            return Err(StorageError::backend(
                self.kind,
                operation,
                "connection pool is closed",
            ));
        }
        self.maybe_inject_fault(operation, fault_point)
    }

    fn maybe_inject_fault(&self, operation: Operation, fault_point: &str) -> StorageResult<()> {
        match self.fault_injector.should_inject(fault_point) {
            Some(fault_type) => Err(StorageError::backend(
                self.kind,
                operation,
                format!("simulated fault: {fault_type}"),
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl StorageBackend for SimStorageBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    #[tracing::instrument(skip(self), fields(backend = %self.kind, product_id = id))]
    async fn get(&self, id: ProductId) -> StorageResult<Option<Product>> {
        self.enter(Operation::Get, "product_get")?;
        Ok(self.read().get(&id).cloned())
    }

    #[tracing::instrument(skip(self), fields(backend = %self.kind))]
    async fn get_all(&self) -> StorageResult<Vec<Product>> {
        self.enter(Operation::GetAll, "product_scan")?;
        Ok(self.read().values().cloned().collect())
    }

    #[tracing::instrument(skip(self, product), fields(backend = %self.kind, product_id = product.id))]
    async fn add(&self, product: &Product) -> StorageResult<()> {
        product.validate()?;
        self.enter(Operation::Add, "product_add")?;

        match self.write().entry(product.id) {
            Entry::Occupied(_) => {
                tracing::debug!("duplicate product id");
                Err(StorageError::already_exists(self.kind, product.id))
            }
            Entry::Vacant(slot) => {
                slot.insert(product.normalized());
                Ok(())
            }
        }
    }

    #[tracing::instrument(skip(self, product), fields(backend = %self.kind, product_id = product.id))]
    async fn update(&self, product: &Product) -> StorageResult<()> {
        product.validate()?;
        self.enter(Operation::Update, "product_update")?;

        match self.write().get_mut(&product.id) {
            Some(stored) => {
                *stored = product.normalized();
                Ok(())
            }
            None => {
                tracing::debug!("product absent");
                Err(StorageError::not_found(self.kind, product.id))
            }
        }
    }

    #[tracing::instrument(skip(self), fields(backend = %self.kind, product_id = id))]
    async fn delete(&self, id: ProductId) -> StorageResult<()> {
        self.enter(Operation::Delete, "product_delete")?;

        if self.write().remove(&id).is_some() {
            Ok(())
        } else {
            tracing::debug!("product absent");
            Err(StorageError::not_found(self.kind, id))
        }
    }

    async fn ping(&self) -> StorageResult<()> {
        self.enter(Operation::Ping, "ping")
    }

    async fn close(&self) -> StorageResult<()> {
        self.maybe_inject_fault(Operation::Close, "close")?;
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================


// =============================================================================
// DST Tests - Fault Injection
// =============================================================================
