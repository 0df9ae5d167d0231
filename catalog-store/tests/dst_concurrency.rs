//! DST Tests for Concurrent Writers
//!
//! TigerStyle: Conditional writes mean racing callers see exactly one winner.

use catalog_store::manager::{DatabaseName, StorageManager};
use catalog_store::storage::{ErrorKind, Product};
use rust_decimal::Decimal;

const WRITERS_COUNT: usize = 16;

fn product(id: i64, writer: usize) -> Product {
    Product::new(
        id,
        format!("Writer {writer}"),
        "Race",
        Decimal::new(100, 2),
        true,
        "S",
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_have_one_winner() {
    let manager = StorageManager::sim(42);

    for name in DatabaseName::ALL {
        let mut handles = Vec::with_capacity(WRITERS_COUNT);
        for writer in 0..WRITERS_COUNT {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager.add(name, &product(7, writer)).await
            }));
        }

        let mut winners = Vec::new();
        for (writer, handle) in handles.into_iter().enumerate() {
            match handle.await.unwrap() {
                Ok(()) => winners.push(writer),
                Err(e) => assert_eq!(e.kind(), ErrorKind::AlreadyExists, "{name}"),
            }
        }

        assert_eq!(winners.len(), 1, "{name}: winners {winners:?}");
        let stored = manager.get(name, 7).await.unwrap().unwrap();
        assert_eq!(stored.name, format!("Writer {}", winners[0]));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deletes_have_one_winner() {
    let manager = StorageManager::sim(42);
    manager
        .add(DatabaseName::Inventory, &product(9, 0))
        .await
        .unwrap();

    let mut handles = Vec::with_capacity(WRITERS_COUNT);
    for _ in 0..WRITERS_COUNT {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            manager.delete(DatabaseName::Inventory, 9).await
        }));
    }

    let mut deleted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => deleted += 1,
            Err(e) => assert!(e.is_not_found()),
        }
    }
    assert_eq!(deleted, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_update_racing_delete_never_resurrects() {
    for round in 0..20 {
        let manager = StorageManager::sim(round);
        manager
            .add(DatabaseName::Suppliers, &product(1, 0))
            .await
            .unwrap();

        let updater = {
            let manager = manager.clone();
            tokio::spawn(async move {
                manager
                    .update(DatabaseName::Suppliers, &product(1, 1))
                    .await
            })
        };
        let deleter = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.delete(DatabaseName::Suppliers, 1).await })
        };

        let updated = updater.await.unwrap();
        deleter.await.unwrap().unwrap();

        if let Err(e) = updated {
            assert!(e.is_not_found());
        }
        assert_eq!(manager.get(DatabaseName::Suppliers, 1).await.unwrap(), None);
    }
}
