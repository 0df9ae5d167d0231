//! Storage Errors
//!
//! `TigerStyle`: Explicit error types with context.
//!
//! Each backend signals "absent" and "duplicate" differently (a `None` row,
//! a zero affected count, a duplicate-key write error). Clients translate
//! those into the variants below so callers see one taxonomy.

use thiserror::Error;

use super::backend::{BackendKind, Operation};
use super::product::ProductId;

/// Errors from storage operations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Target product of an update or delete does not exist
    #[error("product {id} not found in {backend}")]
    NotFound {
        /// Backend that was searched
        backend: BackendKind,
        /// Product ID that was not found
        id: ProductId,
    },

    /// Product with the same ID is already stored
    #[error("product {id} already exists in {backend}")]
    AlreadyExists {
        /// Backend holding the existing product
        backend: BackendKind,
        /// Conflicting product ID
        id: ProductId,
    },

    /// Input rejected before reaching a backend
    #[error("validation error: {message}")]
    Validation {
        /// Validation error message
        message: String,
    },

    /// Transport, query, timeout or simulated failure during an operation
    #[error("{backend} {operation} failed: {message}")]
    Backend {
        /// Backend that failed
        backend: BackendKind,
        /// Operation that failed
        operation: Operation,
        /// Driver error message
        message: String,
    },

    /// Backend could not be brought up at startup
    #[error("{backend} initialization failed during {operation}: {message}")]
    Initialization {
        /// Backend that failed to initialize
        backend: BackendKind,
        /// Initialization step that failed
        operation: Operation,
        /// Driver error message
        message: String,
    },
}

/// Coarse classification of a [`StorageError`], for callers choosing a
/// response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Product absent
    NotFound,
    /// Product ID taken
    AlreadyExists,
    /// Bad input
    Validation,
    /// Runtime backend failure
    Backend,
    /// Startup failure
    Initialization,
}

impl ErrorKind {
    /// HTTP status conventionally used for this kind.
    #[must_use]
    pub fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::AlreadyExists => 409,
            Self::Validation => 400,
            Self::Backend | Self::Initialization => 500,
        }
    }
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(backend: BackendKind, id: ProductId) -> Self {
        Self::NotFound { backend, id }
    }

    /// Create an already exists error.
    #[must_use]
    pub fn already_exists(backend: BackendKind, id: ProductId) -> Self {
        Self::AlreadyExists { backend, id }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a backend error.
    #[must_use]
    pub fn backend(backend: BackendKind, operation: Operation, message: impl Into<String>) -> Self {
        Self::Backend {
            backend,
            operation,
            message: message.into(),
        }
    }

    /// Create an initialization error.
    #[must_use]
    pub fn initialization(
        backend: BackendKind,
        operation: Operation,
        message: impl Into<String>,
    ) -> Self {
        Self::Initialization {
            backend,
            operation,
            message: message.into(),
        }
    }

    /// Create a backend error for an expired deadline.
    ///
    /// Timeouts are not a distinct kind; they are reported like any other
    /// backend failure.
    #[must_use]
    pub fn timeout(backend: BackendKind, operation: Operation, duration_ms: u64) -> Self {
        Self::backend(backend, operation, format!("timed out after {duration_ms}ms"))
    }

    /// Re-tag a runtime failure as an initialization failure.
    ///
    /// Used by connection initializers, whose steps share the runtime
    /// helpers but must surface as startup errors.
    #[must_use]
    pub fn into_initialization(self) -> Self {
        match self {
            Self::Backend {
                backend,
                operation,
                message,
            } => Self::Initialization {
                backend,
                operation,
                message,
            },
            other => other,
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Backend { .. } => ErrorKind::Backend,
            Self::Initialization { .. } => ErrorKind::Initialization,
        }
    }

    /// Backend the error originated from, if any.
    #[must_use]
    pub fn backend_kind(&self) -> Option<BackendKind> {
        match self {
            Self::NotFound { backend, .. }
            | Self::AlreadyExists { backend, .. }
            | Self::Backend { backend, .. }
            | Self::Initialization { backend, .. } => Some(*backend),
            Self::Validation { .. } => None,
        }
    }

    /// Check if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an already exists error.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constructors() {
        let err = StorageError::not_found(BackendKind::Postgres, 999);
        assert!(matches!(
            err,
            StorageError::NotFound { backend: BackendKind::Postgres, id: 999 }
        ));
        assert_eq!(err.to_string(), "product 999 not found in postgres");

        let err = StorageError::validation("price must not be negative");
        assert!(
            matches!(err, StorageError::Validation { ref message } if message == "price must not be negative")
        );
    }

    #[test]
    fn test_backend_error_carries_context() {
        let err = StorageError::backend(BackendKind::MySql, Operation::GetAll, "broken pipe");
        assert_eq!(err.to_string(), "mysql get_all failed: broken pipe");
        assert_eq!(err.backend_kind(), Some(BackendKind::MySql));
    }

    #[test]
    fn test_timeout_is_backend_kind() {
        let err = StorageError::timeout(BackendKind::MongoDb, Operation::Get, 5000);
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert!(err.to_string().contains("timed out after 5000ms"));
    }

    #[test]
    fn test_into_initialization() {
        let err = StorageError::timeout(BackendKind::Postgres, Operation::Connect, 10_000)
            .into_initialization();
        assert_eq!(err.kind(), ErrorKind::Initialization);
        assert!(err.to_string().starts_with("postgres initialization failed during connect"));

        let untouched = StorageError::validation("bad url").into_initialization();
        assert_eq!(untouched.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_http_status() {
        assert_eq!(
            StorageError::not_found(BackendKind::MongoDb, 1).kind().http_status(),
            404
        );
        assert_eq!(
            StorageError::already_exists(BackendKind::MongoDb, 1)
                .kind()
                .http_status(),
            409
        );
        assert_eq!(ErrorKind::Validation.http_status(), 400);
        assert_eq!(ErrorKind::Backend.http_status(), 500);
        assert_eq!(ErrorKind::Initialization.http_status(), 500);
    }
}
