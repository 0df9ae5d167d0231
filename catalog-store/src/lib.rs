//! # Catalog Store
//!
//! One product catalog contract over three independently typed backends,
//! selected by logical database name.
//!
//! | Logical name   | Backend     | Client            |
//! |----------------|-------------|-------------------|
//! | `products_db`  | MongoDB     | `MongoBackend`    |
//! | `suppliers_db` | PostgreSQL  | `PostgresBackend` |
//! | `inventory_db` | MySQL       | `MySqlBackend`    |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catalog_store::config::StorageConfig;
//! use catalog_store::manager::{DatabaseName, StorageManager};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = StorageManager::initialize(&StorageConfig::from_env()?).await?;
//! if let Err(e) = manager.seed_if_empty().await {
//!     eprintln!("warning: {e}");
//! }
//!
//! let products = manager.get_all(DatabaseName::Products).await?;
//! println!("{} products", products.len());
//!
//! manager.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Outcome Taxonomy
//!
//! Every client reports through [`storage::StorageError`]: `NotFound`,
//! `AlreadyExists`, `Validation`, `Backend` and `Initialization`. Mutations
//! are single conditional writes, so two concurrent adds of one ID never
//! both succeed.
//!
//! ## Testing
//!
//! [`manager::StorageManager::sim`] serves all three names from
//! deterministic in-memory backends; see `catalog_core::dst` for fault
//! injection.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod manager;
pub mod seed;
pub mod storage;
pub mod telemetry;

pub use config::StorageConfig;
pub use manager::{DatabaseName, StorageManager};
pub use seed::{SeedError, SeedOutcome, SeedReport};
pub use storage::{
    BackendKind, ErrorKind, Product, ProductId, StorageBackend, StorageError, StorageResult,
};
