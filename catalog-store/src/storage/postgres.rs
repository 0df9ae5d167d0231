//! `PostgresBackend` - Relational Store Serving `suppliers_db`
//!
//! `TigerStyle`: Connection pooling, explicit schema, conditional writes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     PostgresBackend                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Pool: sqlx::PgPool (connection pooling)                     │
//! │  Table: products (id BIGINT PRIMARY KEY, ...)                │
//! │  Add: INSERT ... ON CONFLICT (id) DO NOTHING                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS products (
//!     id BIGINT PRIMARY KEY,
//!     name VARCHAR(100) NOT NULL,
//!     category VARCHAR(50) NOT NULL,
//!     price DECIMAL(10, 2) NOT NULL,
//!     description TEXT,
//!     in_stock BOOLEAN NOT NULL DEFAULT FALSE,
//!     supplier VARCHAR(100) NOT NULL
//! );
//! ```

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

use crate::config::{StorageConfig, TimeoutConfig};

use super::backend::{with_deadline, BackendKind, Operation, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::product::{Product, ProductId};

const KIND: BackendKind = BackendKind::Postgres;

const CREATE_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS products (
        id BIGINT PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        category VARCHAR(50) NOT NULL,
        price DECIMAL(10, 2) NOT NULL,
        description TEXT,
        in_stock BOOLEAN NOT NULL DEFAULT FALSE,
        supplier VARCHAR(100) NOT NULL
    )
";

const SELECT_ONE: &str = r"
    SELECT id, name, category, price, description, in_stock, supplier
    FROM products WHERE id = $1
";

const SELECT_ALL: &str = r"
    SELECT id, name, category, price, description, in_stock, supplier
    FROM products
";

const INSERT_IF_ABSENT: &str = r"
    INSERT INTO products (id, name, category, price, description, in_stock, supplier)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    ON CONFLICT (id) DO NOTHING
";

const UPDATE: &str = r"
    UPDATE products
    SET name = $1, category = $2, price = $3, description = $4, in_stock = $5, supplier = $6
    WHERE id = $7
";

const DELETE: &str = "DELETE FROM products WHERE id = $1";

// =============================================================================
// PostgresBackend
// =============================================================================

/// PostgreSQL client for the `suppliers_db` logical database.
///
/// `TigerStyle`: Connection pooling, explicit schema, proper error handling.
#[derive(Clone, Debug)]
pub struct PostgresBackend {
    pool: PgPool,
    timeouts: TimeoutConfig,
}

impl PostgresBackend {
    /// Connect, verify liveness and ensure the `products` table exists.
    ///
    /// # Errors
    /// Returns `StorageError::Initialization` naming the step that failed.
    /// Each step is bounded by the connect timeout.
    ///
    /// # Example
    /// ```ignore
    /// let backend = PostgresBackend::connect(&StorageConfig::from_env()?).await?;
    /// ```
    pub async fn connect(config: &StorageConfig) -> StorageResult<Self> {
        config.validate_for(KIND)?;

        let timeouts = config.timeouts;
        tracing::info!(backend = %KIND, "connecting");

        let pool = with_deadline(KIND, Operation::Connect, timeouts.connect, async {
            PgPoolOptions::new()
                .max_connections(config.pool_connections_max)
                .acquire_timeout(timeouts.operation)
                .connect(&config.postgres_url)
                .await
                .map_err(query_error(Operation::Connect))
        })
        .await
        .map_err(StorageError::into_initialization)?;

        let backend = Self { pool, timeouts };
        if let Err(e) = backend.prepare().await {
            backend.pool.close().await;
            return Err(e.into_initialization());
        }

        tracing::info!(backend = %KIND, "ready");
        Ok(backend)
    }

    /// Ping and create the schema, each within the connect timeout.
    async fn prepare(&self) -> StorageResult<()> {
        with_deadline(KIND, Operation::Ping, self.timeouts.connect, self.select_one()).await?;

        with_deadline(KIND, Operation::EnsureSchema, self.timeouts.connect, async {
            sqlx::query(CREATE_TABLE)
                .execute(&self.pool)
                .await
                .map_err(query_error(Operation::EnsureSchema))?;
            Ok(())
        })
        .await
    }

    async fn select_one(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(query_error(Operation::Ping))?;
        Ok(())
    }
}

fn query_error(operation: Operation) -> impl FnOnce(sqlx::Error) -> StorageError {
    move |e| StorageError::backend(KIND, operation, e.to_string())
}

/// Convert a database row to a Product.
fn row_to_product(row: &PgRow, operation: Operation) -> StorageResult<Product> {
    let id: i64 = row.try_get("id").map_err(query_error(operation))?;
    let name: String = row.try_get("name").map_err(query_error(operation))?;
    let category: String = row.try_get("category").map_err(query_error(operation))?;
    let price: Decimal = row.try_get("price").map_err(query_error(operation))?;
    let description: Option<String> = row
        .try_get("description")
        .map_err(query_error(operation))?;
    let in_stock: bool = row.try_get("in_stock").map_err(query_error(operation))?;
    let supplier: String = row.try_get("supplier").map_err(query_error(operation))?;

    Ok(Product {
        id,
        name,
        category,
        price,
        description: description.unwrap_or_default(),
        in_stock,
        supplier,
    })
}

#[async_trait]
impl StorageBackend for PostgresBackend {
    fn kind(&self) -> BackendKind {
        KIND
    }

    #[tracing::instrument(skip(self), fields(backend = %KIND, product_id = id))]
    async fn get(&self, id: ProductId) -> StorageResult<Option<Product>> {
        with_deadline(KIND, Operation::Get, self.timeouts.operation, async {
            let row = sqlx::query(SELECT_ONE)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(query_error(Operation::Get))?;

            row.as_ref()
                .map(|r| row_to_product(r, Operation::Get))
                .transpose()
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(backend = %KIND))]
    async fn get_all(&self) -> StorageResult<Vec<Product>> {
        with_deadline(KIND, Operation::GetAll, self.timeouts.scan, async {
            let rows = sqlx::query(SELECT_ALL)
                .fetch_all(&self.pool)
                .await
                .map_err(query_error(Operation::GetAll))?;

            rows.iter()
                .map(|r| row_to_product(r, Operation::GetAll))
                .collect()
        })
        .await
    }

    #[tracing::instrument(skip(self, product), fields(backend = %KIND, product_id = product.id))]
    async fn add(&self, product: &Product) -> StorageResult<()> {
        product.validate()?;
        let product = product.normalized();

        let result = with_deadline(KIND, Operation::Add, self.timeouts.operation, async {
            sqlx::query(INSERT_IF_ABSENT)
                .bind(product.id)
                .bind(&product.name)
                .bind(&product.category)
                .bind(product.price)
                .bind(&product.description)
                .bind(product.in_stock)
                .bind(&product.supplier)
                .execute(&self.pool)
                .await
                .map_err(query_error(Operation::Add))
        })
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("duplicate product id");
            return Err(StorageError::already_exists(KIND, product.id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, product), fields(backend = %KIND, product_id = product.id))]
    async fn update(&self, product: &Product) -> StorageResult<()> {
        product.validate()?;
        let product = product.normalized();

        let result = with_deadline(KIND, Operation::Update, self.timeouts.operation, async {
            sqlx::query(UPDATE)
                .bind(&product.name)
                .bind(&product.category)
                .bind(product.price)
                .bind(&product.description)
                .bind(product.in_stock)
                .bind(&product.supplier)
                .bind(product.id)
                .execute(&self.pool)
                .await
                .map_err(query_error(Operation::Update))
        })
        .await?;

        // Postgres counts matched rows, so an unchanged row still reports 1.
        if result.rows_affected() == 0 {
            tracing::debug!("product absent");
            return Err(StorageError::not_found(KIND, product.id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(backend = %KIND, product_id = id))]
    async fn delete(&self, id: ProductId) -> StorageResult<()> {
        let result = with_deadline(KIND, Operation::Delete, self.timeouts.operation, async {
            sqlx::query(DELETE)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(query_error(Operation::Delete))
        })
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("product absent");
            return Err(StorageError::not_found(KIND, id));
        }
        Ok(())
    }

    async fn ping(&self) -> StorageResult<()> {
        with_deadline(KIND, Operation::Ping, self.timeouts.operation, self.select_one()).await
    }

    async fn close(&self) -> StorageResult<()> {
        with_deadline(KIND, Operation::Close, self.timeouts.close, async {
            self.pool.close().await;
            Ok(())
        })
        .await
    }
}

// =============================================================================
// Tests (require TEST_POSTGRES_URL)
// =============================================================================
