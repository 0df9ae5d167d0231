//! `MySqlBackend` - Relational Store Serving `inventory_db`
//!
//! `TigerStyle`: Connection pooling, explicit schema, conditional writes.
//!
//! MySQL has no `ON CONFLICT DO NOTHING` that reports a conflict, so Add
//! relies on the primary key and maps the duplicate-key error (1062) to
//! `AlreadyExists`. An `UPDATE` that leaves the row unchanged may report zero
//! affected rows; a follow-up existence read tells that apart from an absent
//! row.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;

use crate::config::{StorageConfig, TimeoutConfig};

use super::backend::{with_deadline, BackendKind, Operation, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::product::{Product, ProductId};

const KIND: BackendKind = BackendKind::MySql;

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
    FROM products WHERE id = ?
";

const SELECT_ALL: &str = r"
    SELECT id, name, category, price, description, in_stock, supplier
    FROM products
";

const SELECT_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM products WHERE id = ?) AS present";

const INSERT: &str = r"
    INSERT INTO products (id, name, category, price, description, in_stock, supplier)
    VALUES (?, ?, ?, ?, ?, ?, ?)
";

const UPDATE: &str = r"
    UPDATE products
    SET name = ?, category = ?, price = ?, description = ?, in_stock = ?, supplier = ?
    WHERE id = ?
";

const DELETE: &str = "DELETE FROM products WHERE id = ?";

// =============================================================================
// MySqlBackend
// =============================================================================

/// MySQL client for the `inventory_db` logical database.
#[derive(Clone, Debug)]
pub struct MySqlBackend {
    pool: MySqlPool,
    timeouts: TimeoutConfig,
}

impl MySqlBackend {
    /// Connect, verify liveness and ensure the `products` table exists.
    ///
    /// # Errors
    /// Returns `StorageError::Initialization` naming the step that failed.
    pub async fn connect(config: &StorageConfig) -> StorageResult<Self> {
        config.validate_for(KIND)?;

        let timeouts = config.timeouts;
        tracing::info!(backend = %KIND, "connecting");

        let pool = with_deadline(KIND, Operation::Connect, timeouts.connect, async {
            MySqlPoolOptions::new()
                .max_connections(config.pool_connections_max)
                .acquire_timeout(timeouts.operation)
                .connect(&config.mysql_url)
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

    async fn exists(&self, id: ProductId) -> StorageResult<bool> {
        let row = sqlx::query(SELECT_EXISTS)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(query_error(Operation::Update))?;
        let present: i64 = row.try_get("present").map_err(query_error(Operation::Update))?;
        Ok(present != 0)
    }
}

fn query_error(operation: Operation) -> impl FnOnce(sqlx::Error) -> StorageError {
    move |e| StorageError::backend(KIND, operation, e.to_string())
}

fn row_to_product(row: &MySqlRow, operation: Operation) -> StorageResult<Product> {
    let id: i64 = row.try_get("id").map_err(query_error(operation))?;
    let name: String = row.try_get("name").map_err(query_error(operation))?;
    let category: String = row.try_get("category").map_err(query_error(operation))?;
    let price: Decimal = row.try_get("price").map_err(query_error(operation))?;
    let description: Option<String> = row
        .try_get("description")
        .map_err(query_error(operation))?;
    // BOOLEAN is TINYINT(1) in MySQL
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
impl StorageBackend for MySqlBackend {
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

        with_deadline(KIND, Operation::Add, self.timeouts.operation, async {
            let outcome = sqlx::query(INSERT)
                .bind(product.id)
                .bind(&product.name)
                .bind(&product.category)
                .bind(product.price)
                .bind(&product.description)
                .bind(product.in_stock)
                .bind(&product.supplier)
                .execute(&self.pool)
                .await;

            match outcome {
                Ok(_) => Ok(()),
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    tracing::debug!("duplicate product id");
                    Err(StorageError::already_exists(KIND, product.id))
                }
                Err(e) => Err(query_error(Operation::Add)(e)),
            }
        })
        .await
    }

    #[tracing::instrument(skip(self, product), fields(backend = %KIND, product_id = product.id))]
    async fn update(&self, product: &Product) -> StorageResult<()> {
        product.validate()?;
        let product = product.normalized();

        with_deadline(KIND, Operation::Update, self.timeouts.operation, async {
            let result = sqlx::query(UPDATE)
                .bind(&product.name)
                .bind(&product.category)
                .bind(product.price)
                .bind(&product.description)
                .bind(product.in_stock)
                .bind(&product.supplier)
                .bind(product.id)
                .execute(&self.pool)
                .await
                .map_err(query_error(Operation::Update))?;

            if result.rows_affected() > 0 || self.exists(product.id).await? {
                return Ok(());
            }

            tracing::debug!("product absent");
            Err(StorageError::not_found(KIND, product.id))
        })
        .await
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
// Tests (require TEST_MYSQL_URL)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::str::FromStr;

    fn test_db_url() -> Option<String> {
        env::var("TEST_MYSQL_URL").ok()
    }

    macro_rules! require_db {
        () => {
            match test_db_url() {
                Some(url) => url,
                None => {
                    eprintln!("Skipping test: TEST_MYSQL_URL not set");
                    return;
                }
            }
        };
    }

    async fn connect(url: String) -> MySqlBackend {
        MySqlBackend::connect(&StorageConfig::default().with_mysql_url(url))
            .await
            .unwrap()
    }

    fn drywall(id: ProductId) -> Product {
        Product::new(
            id,
            "Drywall",
            "Sheet materials",
            Decimal::from_str("450.00").unwrap(),
            false,
            "Knauf",
        )
        .with_description("Moisture-resistant drywall, 12.5 mm, 1.2x2.5 m")
    }

    #[tokio::test]
    async fn test_mysql_bad_config_is_initialization_failure() {
        let config = StorageConfig::default().with_pool_connections_max(0);

        let err = MySqlBackend::connect(&config).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Initialization {
                backend: BackendKind::MySql,
                operation: Operation::Configure,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_mysql_crud() {
        let url = require_db!();
        let backend = connect(url).await;
        let id = 920_001;
        let _ = backend.delete(id).await;

        backend.add(&drywall(id)).await.unwrap();
        assert_eq!(backend.get(id).await.unwrap().unwrap(), drywall(id));
        assert!(!backend.get(id).await.unwrap().unwrap().in_stock);
        assert!(backend.add(&drywall(id)).await.unwrap_err().is_already_exists());

        backend.delete(id).await.unwrap();
        assert!(backend.delete(id).await.unwrap_err().is_not_found());
        backend.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_mysql_unchanged_update_is_ok() {
        let url = require_db!();
        let backend = connect(url).await;
        let id = 920_002;
        let _ = backend.delete(id).await;

        backend.add(&drywall(id)).await.unwrap();
        // Same values: zero changed rows, but the product exists.
        backend.update(&drywall(id)).await.unwrap();

        backend.delete(id).await.unwrap();
        assert!(backend.update(&drywall(id)).await.unwrap_err().is_not_found());
        backend.close().await.unwrap();
    }
}
