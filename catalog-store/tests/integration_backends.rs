//! Integration Tests Against Live Databases
//!
//! TigerStyle: The CRUD contract the simulation checks, replayed on the real
//! clients through `StorageManager::initialize`.
//!
//! Skipped unless `TEST_MONGODB_URI`, `TEST_POSTGRES_URL` and
//! `TEST_MYSQL_URL` are all set. The contract test works in the 940_000 id
//! range and clears it before it starts.

use std::env;
use std::str::FromStr;

use catalog_store::config::StorageConfig;
use catalog_store::manager::{DatabaseName, StorageManager};
use catalog_store::storage::{ErrorKind, Product, ProductId};
use rust_decimal::Decimal;

const ID_BASE: ProductId = 940_000;

fn test_config() -> Option<StorageConfig> {
    let mongodb = env::var("TEST_MONGODB_URI").ok()?;
    let postgres = env::var("TEST_POSTGRES_URL").ok()?;
    let mysql = env::var("TEST_MYSQL_URL").ok()?;
    Some(
        StorageConfig::default()
            .with_mongodb_uri(mongodb)
            .with_postgres_url(postgres)
            .with_mysql_url(mysql),
    )
}

macro_rules! require_dbs {
    () => {
        match test_config() {
            Some(config) => config,
            None => {
                eprintln!(
                    "Skipping test: TEST_MONGODB_URI, TEST_POSTGRES_URL and TEST_MYSQL_URL must all be set"
                );
                return Ok(());
            }
        }
    };
}

fn cement(id: ProductId) -> Product {
    Product::new(
        id,
        "Cement M500",
        "Binders",
        Decimal::from_str("7.10").unwrap(),
        true,
        "Holcim",
    )
    .with_description("Portland cement, 50 kg bag")
}

async fn cleanup(manager: &StorageManager, ids: &[ProductId]) {
    for name in DatabaseName::ALL {
        for id in ids {
            let _ = manager.delete(name, *id).await;
        }
    }
}

#[tokio::test]
async fn test_live_contract_on_every_backend() -> anyhow::Result<()> {
    let config = require_dbs!();
    let manager = StorageManager::initialize(&config).await?;
    let id = ID_BASE + 1;
    cleanup(&manager, &[id]).await;

    for (name, result) in manager.health_check().await {
        result.map_err(|e| anyhow::anyhow!("{name} unhealthy: {e}"))?;
    }

    for name in DatabaseName::ALL {
        assert_eq!(manager.get(name, id).await?, None, "{name}");

        manager.add(name, &cement(id)).await?;
        assert_eq!(manager.get(name, id).await?, Some(cement(id)), "{name}");

        let err = manager.add(name, &cement(id)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists, "{name}");
        assert_eq!(err.backend_kind(), Some(name.backend_kind()));

        let repriced = Product {
            price: Decimal::from_str("8.25")?,
            in_stock: false,
            ..cement(id)
        };
        manager.update(name, &repriced).await?;
        assert_eq!(manager.get(name, id).await?, Some(repriced.clone()), "{name}");

        // An identical rewrite still counts as a hit.
        manager.update(name, &repriced).await?;

        assert!(manager
            .get_all(name)
            .await?
            .iter()
            .any(|p| p.id == id && p.price.to_string() == "8.25"));

        manager.delete(name, id).await?;
        assert_eq!(manager.get(name, id).await?, None, "{name}");
        assert!(manager.delete(name, id).await.unwrap_err().is_not_found());
        assert!(manager
            .update(name, &cement(id))
            .await
            .unwrap_err()
            .is_not_found());
    }

    manager.close().await;
    Ok(())
}

#[tokio::test]
async fn test_live_seed_is_idempotent() -> anyhow::Result<()> {
    let config = require_dbs!();
    let manager = StorageManager::initialize(&config).await?;

    // Databases may hold data from other runs, so only idempotence is checked.
    manager.seed_if_empty().await?;
    let before: Vec<usize> = catalog_sizes(&manager).await?;

    let report = manager.seed_if_empty().await?;
    assert_eq!(report.seeded_total(), 0);
    assert_eq!(catalog_sizes(&manager).await?, before);

    manager.close().await;
    Ok(())
}

async fn catalog_sizes(manager: &StorageManager) -> anyhow::Result<Vec<usize>> {
    let mut lengths = Vec::with_capacity(DatabaseName::ALL.len());
    for name in DatabaseName::ALL {
        lengths.push(manager.get_all(name).await?.len());
    }
    Ok(lengths)
}
