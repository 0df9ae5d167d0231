//! DST Tests for the Storage Manager Lifecycle
//!
//! TigerStyle: Close is best-effort, initialization is all-or-nothing.

use std::sync::Arc;
use std::time::Duration;

use catalog_core::dst::{FaultConfig, FaultType, SimConfig, Simulation};
use catalog_store::config::StorageConfig;
use catalog_store::manager::{DatabaseName, StorageManager};
use catalog_store::storage::{BackendKind, ErrorKind, Product, StorageError};
use rust_decimal::Decimal;

// =============================================================================
// Close
// =============================================================================

#[tokio::test]
async fn test_close_attempts_every_backend_despite_failures() {
    // The first close (products_db) fails; the other two must still run.
    let env = Simulation::new(SimConfig::with_seed(42))
        .with_fault(
            FaultConfig::new(FaultType::NetworkReset, 1.0)
                .with_filter("close")
                .with_max_injections(1),
        )
        .build();
    let manager = StorageManager::sim_with_faults(Arc::clone(&env.faults));

    manager.close().await;
    assert_eq!(env.faults.total_injections(), 1);

    let health = manager.health_check().await;
    assert!(health[0].1.is_ok(), "products_db close failed, so it stays open");
    assert!(health[1].1.is_err());
    assert!(health[2].1.is_err());
}

#[tokio::test]
async fn test_close_twice_is_harmless() {
    let manager = StorageManager::sim(42);
    manager.close().await;
    manager.close().await;

    let err = manager.get(DatabaseName::Suppliers, 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_check_isolates_failing_backend() {
    let env = Simulation::new(SimConfig::with_seed(42))
        .with_fault(
            FaultConfig::new(FaultType::DbConnectionFail, 1.0)
                .with_filter("ping")
                .with_max_injections(1),
        )
        .build();
    let manager = StorageManager::sim_with_faults(Arc::clone(&env.faults));

    let health = manager.health_check().await;
    let failed: Vec<DatabaseName> = health
        .iter()
        .filter(|(_, result)| result.is_err())
        .map(|(name, _)| *name)
        .collect();
    assert_eq!(failed, vec![DatabaseName::Products]);
}

// =============================================================================
// Faults surface as backend errors
// =============================================================================

#[tokio::test]
async fn test_faults_carry_backend_and_operation() {
    let env = Simulation::new(SimConfig::with_seed(42))
        .with_fault(FaultConfig::new(FaultType::DbQueryTimeout, 1.0).with_filter("product_get"))
        .build();
    let manager = StorageManager::sim_with_faults(Arc::clone(&env.faults));

    let err = manager.get(DatabaseName::Inventory, 1).await.unwrap_err();
    assert!(matches!(
        err,
        StorageError::Backend {
            backend: BackendKind::MySql,
            ..
        }
    ));
    assert_eq!(
        err.to_string(),
        "mysql get failed: simulated fault: db_query_timeout"
    );
    assert_eq!(err.kind().http_status(), 500);
}

#[tokio::test]
async fn test_simulation_run_drives_manager() {
    Simulation::new(SimConfig::with_seed(5))
        .with_fault(FaultConfig::new(FaultType::StorageWriteFail, 1.0).with_filter("product_update"))
        .run(|env| async move {
            let manager = StorageManager::sim_with_faults(Arc::clone(&env.faults));
            let product = Product::new(3, "Gravel", "Aggregates", Decimal::new(900, 2), true, "Q");

            manager.add(DatabaseName::Suppliers, &product).await?;

            let changed = Product {
                in_stock: false,
                ..product.clone()
            };
            let err = manager
                .update(DatabaseName::Suppliers, &changed)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Backend);
            assert_eq!(
                manager.get(DatabaseName::Suppliers, 3).await?,
                Some(product)
            );
            Ok::<(), StorageError>(())
        })
        .await
        .unwrap();
}

// =============================================================================
// Initialization
// =============================================================================

#[tokio::test]
async fn test_initialize_unreachable_fails_on_first_backend() {
    // Port 1 on loopback refuses connections; nothing is ever opened.
    let config = StorageConfig::default()
        .with_mongodb_uri("mongodb://127.0.0.1:1/?directConnection=true")
        .with_postgres_url("postgres://nobody@127.0.0.1:1/suppliers_db")
        .with_mysql_url("mysql://nobody@127.0.0.1:1/inventory_db")
        .with_connect_timeout(Duration::from_millis(500));

    let err = StorageManager::initialize(&config).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Initialization);
    assert_eq!(err.backend_kind(), Some(BackendKind::MongoDb));
    assert_eq!(err.kind().http_status(), 500);
}
