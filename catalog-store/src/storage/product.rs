//! Product - The Catalog Entity
//!
//! `TigerStyle`: One shape shared by all three backends, validated before I/O.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use catalog_core::constants::{
    PRODUCT_CATEGORY_CHARS_MAX, PRODUCT_DESCRIPTION_BYTES_MAX, PRODUCT_NAME_CHARS_MAX,
    PRODUCT_PRICE_PRECISION, PRODUCT_PRICE_SCALE, PRODUCT_SUPPLIER_CHARS_MAX,
};

use super::error::{StorageError, StorageResult};

/// Caller-assigned product identifier, unique within one backend.
pub type ProductId = i64;

/// A construction-materials catalog entry.
///
/// The same `id` may name unrelated products in different backends; each
/// backend is its own namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Primary key within the backend
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Catalog category
    pub category: String,
    /// Unit price, two fractional digits
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Free-form description (may be empty)
    #[serde(default)]
    pub description: String,
    /// Whether the product is currently stocked
    pub in_stock: bool,
    /// Supplier name
    pub supplier: String,
}

impl Product {
    /// Create a product with an empty description.
    #[must_use]
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        category: impl Into<String>,
        price: Decimal,
        in_stock: bool,
        supplier: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            price,
            description: String::new(),
            in_stock,
            supplier: supplier.into(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check that every field fits the `products` schema.
    ///
    /// Only limits the columns themselves enforce are checked: `VARCHAR`
    /// lengths in characters, the `TEXT` size in bytes, and the
    /// `DECIMAL(10, 2)` scale and integer digits. Empty text and negative
    /// prices are stored as given.
    ///
    /// # Errors
    /// Returns `StorageError::Validation` naming the first offending field.
    pub fn validate(&self) -> StorageResult<()> {
        check_chars("name", &self.name, PRODUCT_NAME_CHARS_MAX)?;
        check_chars("category", &self.category, PRODUCT_CATEGORY_CHARS_MAX)?;
        check_chars("supplier", &self.supplier, PRODUCT_SUPPLIER_CHARS_MAX)?;

        if self.description.len() > PRODUCT_DESCRIPTION_BYTES_MAX {
            return Err(StorageError::validation(format!(
                "description exceeds {PRODUCT_DESCRIPTION_BYTES_MAX} bytes ({} bytes)",
                self.description.len()
            )));
        }

        if self.price.normalize().scale() > PRODUCT_PRICE_SCALE {
            return Err(StorageError::validation(format!(
                "price must have at most {PRODUCT_PRICE_SCALE} fractional digits, got {}",
                self.price
            )));
        }

        if self.price.abs().trunc() >= price_integer_bound() {
            return Err(StorageError::validation(format!(
                "price {} does not fit DECIMAL({PRODUCT_PRICE_PRECISION}, {PRODUCT_PRICE_SCALE})",
                self.price
            )));
        }

        Ok(())
    }

    /// Copy with the price at exactly two fractional digits, the form every
    /// backend stores and returns.
    ///
    /// Only meaningful after [`Product::validate`], which guarantees the
    /// rescale never rounds.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut product = self.clone();
        product.price.rescale(PRODUCT_PRICE_SCALE);
        product
    }
}

/// `10^(precision - scale)`: smallest integer part that overflows the column.
fn price_integer_bound() -> Decimal {
    Decimal::from(10_i64.pow(PRODUCT_PRICE_PRECISION - PRODUCT_PRICE_SCALE))
}

fn check_chars(field: &str, value: &str, max_chars: usize) -> StorageResult<()> {
    let chars_count = value.chars().count();
    if chars_count > max_chars {
        return Err(StorageError::validation(format!(
            "{field} exceeds {max_chars} characters ({chars_count} characters)"
        )));
    }
    Ok(())
}
