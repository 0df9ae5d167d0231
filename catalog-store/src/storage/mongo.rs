//! `MongoBackend` - Document Store Serving `products_db`
//!
//! `TigerStyle`: Uniqueness by index, writes guarded by matched counts.
//!
//! Products live in one collection with a unique index on `id`. The document
//! `_id` is left to the server and never exposed. Prices are stored as
//! decimal strings so `15.50` reads back as exactly `15.50`.

use std::fmt;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind as MongoErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{StorageConfig, TimeoutConfig};

use super::backend::{with_deadline, BackendKind, Operation, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::product::{Product, ProductId};

const KIND: BackendKind = BackendKind::MongoDb;

/// Server error code for a duplicate key on a unique index.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// On-disk shape of a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProductDocument {
    id: i64,
    name: String,
    category: String,
    #[serde(with = "rust_decimal::serde::str")]
    price: Decimal,
    #[serde(default)]
    description: String,
    in_stock: bool,
    supplier: String,
}

impl From<Product> for ProductDocument {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            category: product.category,
            price: product.price,
            description: product.description,
            in_stock: product.in_stock,
            supplier: product.supplier,
        }
    }
}

impl From<ProductDocument> for Product {
    fn from(document: ProductDocument) -> Self {
        Self {
            id: document.id,
            name: document.name,
            category: document.category,
            price: document.price,
            description: document.description,
            in_stock: document.in_stock,
            supplier: document.supplier,
        }
    }
}

// =============================================================================
// MongoBackend
// =============================================================================

/// MongoDB client for the `products_db` logical database.
#[derive(Clone)]
pub struct MongoBackend {
    client: Client,
    database: Database,
    collection: Collection<ProductDocument>,
    timeouts: TimeoutConfig,
}

impl fmt::Debug for MongoBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoBackend")
            .field("database", &self.database.name())
            .field("collection", &self.collection.name())
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl MongoBackend {
    /// Connect, ping the database and ensure the unique index on `id`.
    ///
    /// # Errors
    /// Returns `StorageError::Initialization` naming the step that failed.
    pub async fn connect(config: &StorageConfig) -> StorageResult<Self> {
        config.validate_for(KIND)?;

        let timeouts = config.timeouts;
        tracing::info!(backend = %KIND, database = %config.mongodb.database, "connecting");

        let client = with_deadline(KIND, Operation::Connect, timeouts.connect, async {
            let mut options = ClientOptions::parse(config.mongodb.uri.as_str())
                .await
                .map_err(driver_error(Operation::Connect))?;
            options.connect_timeout = Some(timeouts.connect);
            options.server_selection_timeout = Some(timeouts.connect);
            options.max_pool_size = Some(config.pool_connections_max);
            Client::with_options(options).map_err(driver_error(Operation::Connect))
        })
        .await
        .map_err(StorageError::into_initialization)?;

        let database = client.database(&config.mongodb.database);
        let collection = database.collection::<ProductDocument>(&config.mongodb.collection);

        let backend = Self {
            client,
            database,
            collection,
            timeouts,
        };
        if let Err(e) = backend.prepare().await {
            backend.client.clone().shutdown().await;
            return Err(e.into_initialization());
        }

        tracing::info!(backend = %KIND, "ready");
        Ok(backend)
    }

    async fn prepare(&self) -> StorageResult<()> {
        with_deadline(KIND, Operation::Ping, self.timeouts.connect, self.run_ping()).await?;

        with_deadline(KIND, Operation::EnsureSchema, self.timeouts.connect, async {
            let index = IndexModel::builder()
                .keys(doc! { "id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.collection
                .create_index(index)
                .await
                .map_err(driver_error(Operation::EnsureSchema))?;
            Ok(())
        })
        .await
    }

    async fn run_ping(&self) -> StorageResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(driver_error(Operation::Ping))?;
        Ok(())
    }
}

fn driver_error(operation: Operation) -> impl FnOnce(mongodb::error::Error) -> StorageError {
    move |e| StorageError::backend(KIND, operation, e.to_string())
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    matches!(
        error.kind.as_ref(),
        MongoErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY_CODE
    )
}

#[async_trait]
impl StorageBackend for MongoBackend {
    fn kind(&self) -> BackendKind {
        KIND
    }

    #[tracing::instrument(skip(self), fields(backend = %KIND, product_id = id))]
    async fn get(&self, id: ProductId) -> StorageResult<Option<Product>> {
        with_deadline(KIND, Operation::Get, self.timeouts.operation, async {
            let document = self
                .collection
                .find_one(doc! { "id": id })
                .await
                .map_err(driver_error(Operation::Get))?;
            Ok(document.map(Product::from))
        })
        .await
    }

    #[tracing::instrument(skip(self), fields(backend = %KIND))]
    async fn get_all(&self) -> StorageResult<Vec<Product>> {
        with_deadline(KIND, Operation::GetAll, self.timeouts.scan, async {
            let cursor = self
                .collection
                .find(doc! {})
                .await
                .map_err(driver_error(Operation::GetAll))?;
            let documents: Vec<ProductDocument> = cursor
                .try_collect()
                .await
                .map_err(driver_error(Operation::GetAll))?;
            Ok(documents.into_iter().map(Product::from).collect())
        })
        .await
    }

    #[tracing::instrument(skip(self, product), fields(backend = %KIND, product_id = product.id))]
    async fn add(&self, product: &Product) -> StorageResult<()> {
        product.validate()?;
        let document = ProductDocument::from(product.normalized());

        with_deadline(KIND, Operation::Add, self.timeouts.operation, async {
            match self.collection.insert_one(&document).await {
                Ok(_) => Ok(()),
                Err(e) if is_duplicate_key(&e) => {
                    tracing::debug!("duplicate product id");
                    Err(StorageError::already_exists(KIND, document.id))
                }
                Err(e) => Err(driver_error(Operation::Add)(e)),
            }
        })
        .await
    }

    #[tracing::instrument(skip(self, product), fields(backend = %KIND, product_id = product.id))]
    async fn update(&self, product: &Product) -> StorageResult<()> {
        product.validate()?;
        let document = ProductDocument::from(product.normalized());

        let result = with_deadline(KIND, Operation::Update, self.timeouts.operation, async {
            self.collection
                .replace_one(doc! { "id": document.id }, &document)
                .await
                .map_err(driver_error(Operation::Update))
        })
        .await?;

        if result.matched_count == 0 {
            tracing::debug!("product absent");
            return Err(StorageError::not_found(KIND, document.id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(backend = %KIND, product_id = id))]
    async fn delete(&self, id: ProductId) -> StorageResult<()> {
        let result = with_deadline(KIND, Operation::Delete, self.timeouts.operation, async {
            self.collection
                .delete_one(doc! { "id": id })
                .await
                .map_err(driver_error(Operation::Delete))
        })
        .await?;

        if result.deleted_count == 0 {
            tracing::debug!("product absent");
            return Err(StorageError::not_found(KIND, id));
        }
        Ok(())
    }

    async fn ping(&self) -> StorageResult<()> {
        with_deadline(KIND, Operation::Ping, self.timeouts.operation, self.run_ping()).await
    }

    async fn close(&self) -> StorageResult<()> {
        with_deadline(KIND, Operation::Close, self.timeouts.close, async {
            self.client.clone().shutdown().await;
            Ok(())
        })
        .await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::str::FromStr;

    #[test]
    fn test_document_stores_price_as_string() {
        let product = Product::new(
            1,
            "Facing brick",
            "Wall materials",
            Decimal::from_str("15.5").unwrap(),
            true,
            "Brickworks LLC",
        )
        .normalized();

        let bson = mongodb::bson::to_document(&ProductDocument::from(product.clone())).unwrap();
        assert_eq!(bson.get_str("price").unwrap(), "15.50");
        assert_eq!(bson.get_i64("id").unwrap(), 1);
        assert!(bson.get_bool("in_stock").unwrap());

        let back: ProductDocument = mongodb::bson::from_document(bson).unwrap();
        assert_eq!(Product::from(back), product);
    }

    #[test]
    fn test_document_ignores_server_id() {
        let raw = doc! {
            "_id": mongodb::bson::oid::ObjectId::new(),
            "id": 2_i64,
            "name": "Cement M500",
            "category": "Binders",
            "price": "350.00",
            "in_stock": true,
            "supplier": "Eurocement",
        };
        let document: ProductDocument = mongodb::bson::from_document(raw).unwrap();
        assert_eq!(document.description, "");
        assert_eq!(document.price, Decimal::from(350));
    }

    #[tokio::test]
    async fn test_mongodb_bad_config_is_initialization_failure() {
        let config = StorageConfig::default().with_mongodb_database("");

        let err = MongoBackend::connect(&config).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::Initialization {
                backend: BackendKind::MongoDb,
                operation: Operation::Configure,
                ..
            }
        ));
        assert!(err.to_string().contains("mongodb database must not be empty"));
    }

    fn test_db_uri() -> Option<String> {
        env::var("TEST_MONGODB_URI").ok()
    }

    macro_rules! require_db {
        () => {
            match test_db_uri() {
                Some(uri) => uri,
                None => {
                    eprintln!("Skipping test: TEST_MONGODB_URI not set");
                    return;
                }
            }
        };
    }

    #[tokio::test]
    async fn test_mongodb_crud() {
        let uri = require_db!();
        let backend = MongoBackend::connect(
            &StorageConfig::default()
                .with_mongodb_uri(uri)
                .with_mongodb_database("catalog_test"),
        )
        .await
        .unwrap();
        let id = 930_001;
        let _ = backend.delete(id).await;

        let brick = Product::new(
            id,
            "Brick",
            "Wall",
            Decimal::from_str("15.50").unwrap(),
            true,
            "S",
        )
        .with_description("d");

        backend.add(&brick).await.unwrap();
        assert_eq!(backend.get(id).await.unwrap().unwrap(), brick);
        assert!(backend.add(&brick).await.unwrap_err().is_already_exists());

        let updated = Product {
            price: Decimal::from(16),
            ..brick.clone()
        };
        backend.update(&updated).await.unwrap();
        assert_eq!(
            backend.get(id).await.unwrap().unwrap().price.to_string(),
            "16.00"
        );

        backend.delete(id).await.unwrap();
        assert!(backend.delete(id).await.unwrap_err().is_not_found());
        assert!(backend.update(&updated).await.unwrap_err().is_not_found());
        backend.close().await.unwrap();
    }
}
