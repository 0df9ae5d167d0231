//! `TigerStyle` Constants
//!
//! All limits use big-endian naming: `CATEGORY_SPECIFICS_UNIT_LIMIT`
//! Example: `PRODUCT_NAME_CHARS_MAX` (not `MAX_PRODUCT_NAME_LEN`)
//!
//! Every constant includes units in the name:
//! - _`CHARS_MAX` for character-counted limits (`VARCHAR(n)`)
//! - _`BYTES_MAX` for size limits
//! - _`MS_DEFAULT` for time durations in milliseconds
//! - _`COUNT_MAX` for quantity limits

// =============================================================================
// Product Limits
// =============================================================================

/// Maximum characters in a product name (`VARCHAR(100)`)
pub const PRODUCT_NAME_CHARS_MAX: usize = 100;

/// Maximum characters in a product category (`VARCHAR(50)`)
pub const PRODUCT_CATEGORY_CHARS_MAX: usize = 50;

/// Maximum characters in a supplier name (`VARCHAR(100)`)
pub const PRODUCT_SUPPLIER_CHARS_MAX: usize = 100;

/// Maximum size of a product description (MySQL `TEXT`)
pub const PRODUCT_DESCRIPTION_BYTES_MAX: usize = 65_535;

/// Fractional digits stored for a price (`DECIMAL(10, 2)`)
pub const PRODUCT_PRICE_SCALE: u32 = 2;

/// Total significant digits stored for a price (`DECIMAL(10, 2)`)
pub const PRODUCT_PRICE_PRECISION: u32 = 10;

// =============================================================================
// Backend Timeouts
// =============================================================================

/// Bound on opening a backend connection, ping and schema setup
pub const BACKEND_CONNECT_TIMEOUT_MS_DEFAULT: u64 = 10_000;

/// Bound on a point operation (get, add, update, delete)
pub const BACKEND_OPERATION_TIMEOUT_MS_DEFAULT: u64 = 5_000;

/// Bound on a full collection/table scan
pub const BACKEND_SCAN_TIMEOUT_MS_DEFAULT: u64 = 10_000;

/// Bound on releasing a backend connection
pub const BACKEND_CLOSE_TIMEOUT_MS_DEFAULT: u64 = 5_000;

/// Upper bound accepted for any configured timeout
pub const BACKEND_TIMEOUT_MS_MAX: u64 = 300_000; // 5 minutes

// =============================================================================
// Connection Pools
// =============================================================================

/// Default pool size per backend
pub const BACKEND_POOL_CONNECTIONS_COUNT_DEFAULT: u32 = 10;

/// Maximum pool size per backend
pub const BACKEND_POOL_CONNECTIONS_COUNT_MAX: u32 = 100;

// =============================================================================
// DST (Deterministic Simulation Testing)
// =============================================================================

/// Maximum fault probability
pub const DST_FAULT_PROBABILITY_MAX: f64 = 1.0;

/// Maximum number of simulation steps
pub const DST_SIMULATION_STEPS_MAX: u64 = 100_000;

/// Largest product id generated by randomized simulations.
/// Kept small so random adds collide and deletes hit.
pub const DST_PRODUCT_ID_MAX: i64 = 8;
