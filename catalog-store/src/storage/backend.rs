//! Storage Backend Trait
//!
//! TigerStyle: Abstract interface for product storage.
//!
//! # Simulation-First
//!
//! Tests are written against `SimStorageBackend` first. The MongoDB,
//! PostgreSQL and MySQL clients must satisfy the same contract:
//!
//! | Operation | Absent id         | Present id           |
//! |-----------|-------------------|----------------------|
//! | `get`     | `Ok(None)`        | `Ok(Some(product))`  |
//! | `add`     | inserts           | `AlreadyExists`      |
//! | `update`  | `NotFound`        | replaces every field |
//! | `delete`  | `NotFound`        | removes              |
//!
//! Mutations are single conditional writes; no client reads before it
//! writes to decide whether the write is allowed.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use super::error::{StorageError, StorageResult};
use super::product::{Product, ProductId};

/// Storage technology behind a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Document store
    MongoDb,
    /// Relational store A
    Postgres,
    /// Relational store B
    MySql,
}

impl BackendKind {
    /// All backend kinds, in initialization order.
    pub const ALL: [BackendKind; 3] = [Self::MongoDb, Self::Postgres, Self::MySql];

    /// Lowercase name used in logs and errors.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MongoDb => "mongodb",
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step performed against a backend, recorded on errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Check the settings a client needs
    Configure,
    /// Open the connection pool
    Connect,
    /// Liveness round-trip
    Ping,
    /// Create table or unique index
    EnsureSchema,
    /// Point lookup
    Get,
    /// Full scan
    GetAll,
    /// Insert-if-absent
    Add,
    /// Replace-if-present
    Update,
    /// Remove-if-present
    Delete,
    /// Release the connection pool
    Close,
}

impl Operation {
    /// Snake-case name used in logs and errors.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Connect => "connect",
            Self::Ping => "ping",
            Self::EnsureSchema => "ensure_schema",
            Self::Get => "get",
            Self::GetAll => "get_all",
            Self::Add => "add",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstract product storage backend.
///
/// TigerStyle: All operations are async, bounded by a deadline, and return
/// explicit errors. Implementations own their connection pool and must be
/// safe to call from many tasks at once.
#[async_trait]
pub trait StorageBackend: Send + Sync + fmt::Debug {
    /// Technology this client talks to.
    fn kind(&self) -> BackendKind;

    /// Look up a product by ID.
    ///
    /// Returns `None` if the product does not exist; absence is not an error.
    async fn get(&self, id: ProductId) -> StorageResult<Option<Product>>;

    /// Return every product. No ordering is guaranteed.
    async fn get_all(&self) -> StorageResult<Vec<Product>>;

    /// Insert a product.
    ///
    /// Fails with `AlreadyExists` and writes nothing if the ID is taken.
    async fn add(&self, product: &Product) -> StorageResult<()>;

    /// Replace every field of an existing product.
    ///
    /// Fails with `NotFound` and writes nothing if the ID is absent.
    async fn update(&self, product: &Product) -> StorageResult<()>;

    /// Remove a product.
    ///
    /// Fails with `NotFound` if the ID is absent.
    async fn delete(&self, id: ProductId) -> StorageResult<()>;

    /// Verify the backend is reachable.
    async fn ping(&self) -> StorageResult<()>;

    /// Release the connection pool.
    async fn close(&self) -> StorageResult<()>;
}

/// Run `fut`, failing with a backend timeout error once `limit` elapses.
pub(crate) async fn with_deadline<T, F>(
    backend: BackendKind,
    operation: Operation,
    limit: Duration,
    fut: F,
) -> StorageResult<T>
where
    F: Future<Output = StorageResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            let duration_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(%backend, %operation, duration_ms, "deadline expired");
            Err(StorageError::timeout(backend, operation, duration_ms))
        }
    }
}
