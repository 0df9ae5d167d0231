//! Storage Manager - Lifecycle and Dispatch
//!
//! `TigerStyle`: One explicit owner for the three backend clients.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     StorageManager                        │
//! │   [products_db] ──► MongoBackend     (document store)     │
//! │   [suppliers_db] ─► PostgresBackend  (relational A)       │
//! │   [inventory_db] ─► MySqlBackend     (relational B)       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Dispatch is an array lookup by [`DatabaseName`]; the table is filled once
//! at construction and never changes. The manager adds no locking of its own.

mod name;

use std::future::Future;
use std::sync::Arc;

use catalog_core::dst::{FaultInjector, SimConfig, Simulation};

use crate::config::StorageConfig;
use crate::seed::{self, SeedError, SeedReport};
use crate::storage::{
    BackendKind, Operation, Product, ProductId, SimStorageBackend, StorageBackend, StorageError,
    StorageResult,
};

pub use name::{DatabaseName, UnknownDatabase};

/// Owns one client per logical database name.
///
/// Cloning is cheap and shares the underlying clients.
///
/// # Example
///
/// ```rust
/// use catalog_store::manager::{DatabaseName, StorageManager};
/// use catalog_store::storage::Product;
/// use rust_decimal::Decimal;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = StorageManager::sim(42);
/// let brick = Product::new(1, "Brick", "Wall", Decimal::new(1550, 2), true, "S");
///
/// manager.add(DatabaseName::Products, &brick).await?;
/// assert_eq!(manager.get(DatabaseName::Products, 1).await?, Some(brick));
/// assert_eq!(manager.get(DatabaseName::Suppliers, 1).await?, None);
///
/// manager.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct StorageManager {
    backends: [Arc<dyn StorageBackend>; 3],
}

impl StorageManager {
    /// Connect to all three backends in order: MongoDB, PostgreSQL, MySQL.
    ///
    /// Never returns a partially ready manager: if any backend fails, the
    /// ones already opened are closed and the failure is returned.
    ///
    /// # Errors
    /// Returns `StorageError::Initialization` for the first backend whose
    /// settings are invalid or that failed to come up.
    pub async fn initialize(config: &StorageConfig) -> StorageResult<Self> {
        Self::initialize_with(config, |name| open(name, config)).await
    }

    /// `initialize` with the per-name client constructor supplied by the
    /// caller.
    pub(crate) async fn initialize_with<F, Fut>(
        config: &StorageConfig,
        opener: F,
    ) -> StorageResult<Self>
    where
        F: Fn(DatabaseName) -> Fut,
        Fut: Future<Output = StorageResult<Arc<dyn StorageBackend>>>,
    {
        // Settings for every backend are checked before anything connects.
        for kind in BackendKind::ALL {
            config.validate_for(kind)?;
        }

        let open_logged = |name: DatabaseName| {
            tracing::info!(database = %name, backend = %name.backend_kind(), "initializing");
            let fut = opener(name);
            async move {
                let result = fut.await;
                if let Err(e) = &result {
                    tracing::error!(database = %name, error = %e, "initialization failed");
                }
                result
            }
        };

        let products = open_logged(DatabaseName::Products).await?;

        let suppliers = match open_logged(DatabaseName::Suppliers).await {
            Ok(backend) => backend,
            Err(e) => {
                close_each(&[(DatabaseName::Products, &products)]).await;
                return Err(e);
            }
        };

        let inventory = match open_logged(DatabaseName::Inventory).await {
            Ok(backend) => backend,
            Err(e) => {
                close_each(&[
                    (DatabaseName::Products, &products),
                    (DatabaseName::Suppliers, &suppliers),
                ])
                .await;
                return Err(e);
            }
        };

        tracing::info!("storage initialized");
        Ok(Self::from_backends(products, suppliers, inventory))
    }

    /// Wire pre-built clients.
    ///
    /// # Panics
    /// Panics if a client's technology does not match the static mapping
    /// for its slot.
    #[must_use]
    pub fn from_backends(
        products: Arc<dyn StorageBackend>,
        suppliers: Arc<dyn StorageBackend>,
        inventory: Arc<dyn StorageBackend>,
    ) -> Self {
        let backends = [products, suppliers, inventory];

        // Preconditions
        for name in DatabaseName::ALL {
            let kind = backends[name.index()].kind();
            assert_eq!(
                kind,
                name.backend_kind(),
                "{name} must be served by {}, got {kind}",
                name.backend_kind()
            );
        }

        Self { backends }
    }

    /// All three names served by in-memory backends, without faults.
    #[must_use]
    pub fn sim(seed: u64) -> Self {
        let env = Simulation::new(SimConfig::with_seed(seed)).build();
        Self::sim_with_faults(env.faults)
    }

    /// All three names served by in-memory backends that draw failures from
    /// one shared fault injector.
    #[must_use]
    pub fn sim_with_faults(faults: Arc<FaultInjector>) -> Self {
        let backend = |kind: BackendKind| -> Arc<dyn StorageBackend> {
            Arc::new(SimStorageBackend::with_fault_injector(
                kind,
                Arc::clone(&faults),
            ))
        };

        Self::from_backends(
            backend(BackendKind::MongoDb),
            backend(BackendKind::Postgres),
            backend(BackendKind::MySql),
        )
    }

    /// Client serving `name`.
    #[must_use]
    pub fn backend(&self, name: DatabaseName) -> &dyn StorageBackend {
        self.backends[name.index()].as_ref()
    }

    /// Look up a product. `Ok(None)` means not found.
    ///
    /// # Errors
    /// Returns `StorageError::Backend` on transport or query failure.
    pub async fn get(&self, name: DatabaseName, id: ProductId) -> StorageResult<Option<Product>> {
        self.backend(name).get(id).await
    }

    /// Every product in `name`, in no particular order.
    ///
    /// # Errors
    /// Returns `StorageError::Backend` on transport or query failure.
    pub async fn get_all(&self, name: DatabaseName) -> StorageResult<Vec<Product>> {
        self.backend(name).get_all().await
    }

    /// Insert a product.
    ///
    /// # Errors
    /// `AlreadyExists` if the ID is taken, `Validation` for bad input,
    /// `Backend` otherwise.
    pub async fn add(&self, name: DatabaseName, product: &Product) -> StorageResult<()> {
        self.backend(name).add(product).await
    }

    /// Replace every field of an existing product.
    ///
    /// # Errors
    /// `NotFound` if the ID is absent, `Validation` for bad input,
    /// `Backend` otherwise.
    pub async fn update(&self, name: DatabaseName, product: &Product) -> StorageResult<()> {
        self.backend(name).update(product).await
    }

    /// Remove a product.
    ///
    /// # Errors
    /// `NotFound` if the ID is absent, `Backend` otherwise.
    pub async fn delete(&self, name: DatabaseName, id: ProductId) -> StorageResult<()> {
        self.backend(name).delete(id).await
    }

    /// Ping every backend independently.
    pub async fn health_check(&self) -> Vec<(DatabaseName, StorageResult<()>)> {
        let mut results = Vec::with_capacity(DatabaseName::ALL.len());
        for name in DatabaseName::ALL {
            results.push((name, self.backend(name).ping().await));
        }
        results
    }

    /// Insert fixture products into every empty backend.
    ///
    /// # Errors
    /// Returns `SeedError` carrying the per-backend report if any backend
    /// failed. The other backends are still attempted.
    pub async fn seed_if_empty(&self) -> Result<SeedReport, SeedError> {
        seed::seed_if_empty(self).await
    }

    /// Release all connections. Each backend is attempted even if another
    /// fails; failures are logged, never returned.
    pub async fn close(&self) {
        let named: Vec<(DatabaseName, &Arc<dyn StorageBackend>)> = DatabaseName::ALL
            .into_iter()
            .map(|name| (name, &self.backends[name.index()]))
            .collect();
        close_each(&named).await;
        tracing::info!("storage closed");
    }
}

async fn close_each(backends: &[(DatabaseName, &Arc<dyn StorageBackend>)]) {
    for (name, backend) in backends {
        if let Err(e) = backend.close().await {
            tracing::warn!(database = %name, error = %e, "failed to close backend");
        }
    }
}

/// Connect the client for `name`, or fail if it was compiled out.
async fn open(name: DatabaseName, config: &StorageConfig) -> StorageResult<Arc<dyn StorageBackend>> {
    let kind = name.backend_kind();

    #[allow(unreachable_patterns)]
    match kind {
        #[cfg(feature = "mongodb")]
        BackendKind::MongoDb => crate::storage::MongoBackend::connect(config)
            .await
            .map(|backend| Arc::new(backend) as Arc<dyn StorageBackend>),
        #[cfg(feature = "postgres")]
        BackendKind::Postgres => crate::storage::PostgresBackend::connect(config)
            .await
            .map(|backend| Arc::new(backend) as Arc<dyn StorageBackend>),
        #[cfg(feature = "mysql")]
        BackendKind::MySql => crate::storage::MySqlBackend::connect(config)
            .await
            .map(|backend| Arc::new(backend) as Arc<dyn StorageBackend>),
        _ => {
            let _ = config;
            Err(StorageError::initialization(
                kind,
                Operation::Connect,
                format!("client for {kind} is not compiled in"),
            ))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
