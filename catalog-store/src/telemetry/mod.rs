//! Tracing Subscriber Setup
//!
//! `TigerStyle`: Explicit configuration, errors instead of panics when the
//! subscriber cannot be installed.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use catalog_store::telemetry::{init_tracing, TelemetryConfig};
//!
//! // Filter from RUST_LOG, or "info"
//! init_tracing(TelemetryConfig::default()).expect("tracing init");
//!
//! // Or configure explicitly
//! let config = TelemetryConfig::builder()
//!     .filter("catalog_store=debug,sqlx=warn")
//!     .ansi(false)
//!     .build();
//! # let _ = config;
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG` - Default filter directives (default: "info")

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const TELEMETRY_FILTER_DEFAULT: &str = "info";

/// Telemetry configuration errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Filter directives could not be parsed
    #[error("invalid filter {filter:?}: {reason}")]
    InvalidFilter {
        /// The rejected directives
        filter: String,
        /// Parser message
        reason: String,
    },

    /// A global subscriber is already installed
    #[error("telemetry initialization failed: {reason}")]
    InitFailed {
        /// The reason for the failure
        reason: String,
    },
}

/// Result type for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Configuration for the `tracing` fmt subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives, e.g. `"info,catalog_store=debug"`
    pub filter: String,

    /// Colorize output
    pub ansi: bool,

    /// Include the event target (module path) in each line
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: std::env::var(EnvFilter::DEFAULT_ENV)
                .unwrap_or_else(|_| TELEMETRY_FILTER_DEFAULT.to_string()),
            ansi: true,
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    /// Create a new builder for `TelemetryConfig`
    #[must_use]
    pub fn builder() -> TelemetryConfigBuilder {
        TelemetryConfigBuilder::default()
    }

    /// Parse the filter directives.
    fn env_filter(&self) -> Result<EnvFilter> {
        if self.filter.trim().is_empty() {
            return Err(TelemetryError::InvalidFilter {
                filter: self.filter.clone(),
                reason: "filter cannot be empty".to_string(),
            });
        }

        EnvFilter::try_new(&self.filter).map_err(|e| TelemetryError::InvalidFilter {
            filter: self.filter.clone(),
            reason: e.to_string(),
        })
    }
}

/// Builder for `TelemetryConfig`
#[derive(Default)]
pub struct TelemetryConfigBuilder {
    filter: Option<String>,
    ansi: Option<bool>,
    with_target: Option<bool>,
}

impl TelemetryConfigBuilder {
    /// Set the filter directives
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Enable or disable colors
    #[must_use]
    pub fn ansi(mut self, ansi: bool) -> Self {
        self.ansi = Some(ansi);
        self
    }

    /// Enable or disable event targets
    #[must_use]
    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = Some(with_target);
        self
    }

    /// Build the `TelemetryConfig`
    #[must_use]
    pub fn build(self) -> TelemetryConfig {
        let default = TelemetryConfig::default();
        TelemetryConfig {
            filter: self.filter.unwrap_or(default.filter),
            ansi: self.ansi.unwrap_or(default.ansi),
            with_target: self.with_target.unwrap_or(default.with_target),
        }
    }
}

/// Install a global fmt subscriber filtered by `config.filter`.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if the directives do not parse.
/// Returns `TelemetryError::InitFailed` if a global subscriber is already set.
pub fn init_tracing(config: TelemetryConfig) -> Result<()> {
    let filter = config.env_filter()?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .with_target(config.with_target)
        .try_init()
        .map_err(|e| TelemetryError::InitFailed {
            reason: e.to_string(),
        })?;

    tracing::debug!(filter = %config.filter, "tracing initialized");
    Ok(())
}
