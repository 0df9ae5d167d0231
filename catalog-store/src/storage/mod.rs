//! Storage - Backend Trait and Implementations
//!
//! TigerStyle: Abstract storage with simulation-first testing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    StorageBackend Trait                      │
//! └─────────────────────────────────────────────────────────────┘
//!       ↑                 ↑                 ↑                ↑
//!       │                 │                 │                │
//! ┌─────┴──────┐  ┌───────┴──────┐  ┌───────┴───────┐  ┌─────┴──────┐
//! │ SimStorage │  │ MongoBackend │  │PostgresBackend│  │MySqlBackend│
//! │ (testing)  │  │ products_db  │  │ suppliers_db  │  │inventory_db│
//! └────────────┘  └──────────────┘  └───────────────┘  └────────────┘
//! ```
//!
//! # Simulation-First
//!
//! `SimStorageBackend` is the reference for the CRUD contract; the real
//! clients are checked against the same expectations when a database is
//! reachable.

mod backend;
mod error;
mod product;
mod sim;

#[cfg(feature = "mongodb")]
mod mongo;

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "mysql")]
mod mysql;

pub use backend::{BackendKind, Operation, StorageBackend};
pub use error::{ErrorKind, StorageError, StorageResult};
pub use product::{Product, ProductId};
pub use sim::SimStorageBackend;

#[cfg(feature = "mongodb")]
pub use mongo::MongoBackend;

#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;

#[cfg(feature = "mysql")]
pub use mysql::MySqlBackend;
