//! Logical database names and their static backend mapping.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::storage::BackendKind;

/// One of the three fixed names callers use to pick a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatabaseName {
    /// `products_db`, served by the document store
    Products,
    /// `suppliers_db`, served by PostgreSQL
    Suppliers,
    /// `inventory_db`, served by MySQL
    Inventory,
}

impl DatabaseName {
    /// All names, in initialization order.
    pub const ALL: [DatabaseName; 3] = [Self::Products, Self::Suppliers, Self::Inventory];

    /// External identifier.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "products_db",
            Self::Suppliers => "suppliers_db",
            Self::Inventory => "inventory_db",
        }
    }

    /// Backend technology that serves this name. Never changes at runtime.
    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        match self {
            Self::Products => BackendKind::MongoDb,
            Self::Suppliers => BackendKind::Postgres,
            Self::Inventory => BackendKind::MySql,
        }
    }

    /// Slot in the manager's client table.
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Products => 0,
            Self::Suppliers => 1,
            Self::Inventory => 2,
        }
    }
}

impl fmt::Display for DatabaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A database name outside the fixed set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown database: {name}")]
pub struct UnknownDatabase {
    /// The rejected name
    pub name: String,
}

impl FromStr for DatabaseName {
    type Err = UnknownDatabase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownDatabase {
                name: s.to_string(),
            })
    }
}
