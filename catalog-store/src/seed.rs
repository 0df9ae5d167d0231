//! Fixture Seeder
//!
//! `TigerStyle`: Independent attempts per backend, aggregated reporting.
//!
//! Each logical database gets one or two construction-materials products
//! when it is empty. A backend that already holds products is left alone,
//! so seeding is idempotent. A failure on one backend never stops the
//! others from being seeded.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::manager::{DatabaseName, StorageManager};
use crate::storage::{Product, StorageBackend, StorageError};

/// Fixed sample products for `name`.
#[must_use]
pub fn fixtures(name: DatabaseName) -> Vec<Product> {
    match name {
        DatabaseName::Products => vec![
            Product::new(
                1,
                "Facing brick",
                "Wall materials",
                Decimal::new(1550, 2),
                true,
                "Brickworks LLC",
            )
            .with_description("Ceramic facing brick"),
            Product::new(
                2,
                "Cement M500",
                "Binders",
                Decimal::new(35000, 2),
                true,
                "Eurocement",
            )
            .with_description("Cement M500 D0, 50 kg bag"),
        ],
        DatabaseName::Suppliers => vec![Product::new(
            1,
            "Tile adhesive",
            "Adhesives",
            Decimal::new(28000, 2),
            true,
            "Cemix",
        )
        .with_description("Ceramic tile adhesive, 25 kg")],
        DatabaseName::Inventory => vec![Product::new(
            1,
            "Drywall",
            "Sheet materials",
            Decimal::new(45000, 2),
            false,
            "Knauf",
        )
        .with_description("Moisture-resistant drywall, 12.5 mm, 1.2x2.5 m")],
    }
}

/// What happened when seeding one backend.
#[derive(Debug, Clone)]
pub enum SeedOutcome {
    /// Backend was empty; this many fixtures were inserted
    Seeded(usize),
    /// Backend already held products; nothing was written
    AlreadyPopulated,
    /// Scan or insert failed
    Failed(StorageError),
}

impl SeedOutcome {
    /// Check if this outcome is a failure.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Per-backend seeding results, in `DatabaseName::ALL` order.
#[derive(Debug, Clone, Default)]
pub struct SeedReport {
    outcomes: Vec<(DatabaseName, SeedOutcome)>,
}

impl SeedReport {
    /// Outcome for `name`, if it was attempted.
    #[must_use]
    pub fn outcome(&self, name: DatabaseName) -> Option<&SeedOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, outcome)| outcome)
    }

    /// All outcomes.
    pub fn iter(&self) -> impl Iterator<Item = &(DatabaseName, SeedOutcome)> {
        self.outcomes.iter()
    }

    /// Names whose seeding failed.
    #[must_use]
    pub fn failed(&self) -> Vec<DatabaseName> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Total fixtures inserted across all backends.
    #[must_use]
    pub fn seeded_total(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                SeedOutcome::Seeded(count) => *count,
                _ => 0,
            })
            .sum()
    }

    fn failure_summary(&self) -> String {
        self.outcomes
            .iter()
            .filter_map(|(name, outcome)| match outcome {
                SeedOutcome::Failed(e) => Some(format!("{name}: {e}")),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Seeding failed on at least one backend.
///
/// Callers treat this as a warning: the manager is still usable.
#[derive(Debug, Clone, Error)]
#[error("seeding failed ({})", .report.failure_summary())]
pub struct SeedError {
    /// Full report, including the backends that succeeded
    pub report: SeedReport,
}

/// Seed every empty backend managed by `manager`.
///
/// # Errors
/// Returns `SeedError` if any backend failed; every backend is attempted.
pub async fn seed_if_empty(manager: &StorageManager) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for name in DatabaseName::ALL {
        let outcome = seed_backend(manager.backend(name), &fixtures(name)).await;
        match &outcome {
            SeedOutcome::Seeded(count) => {
                tracing::info!(database = %name, count, "seeded fixtures");
            }
            SeedOutcome::AlreadyPopulated => {
                tracing::debug!(database = %name, "already populated");
            }
            SeedOutcome::Failed(e) => {
                tracing::warn!(database = %name, error = %e, "seeding failed");
            }
        }
        report.outcomes.push((name, outcome));
    }

    if report.failed().is_empty() {
        Ok(report)
    } else {
        Err(SeedError { report })
    }
}

async fn seed_backend(backend: &dyn StorageBackend, fixtures: &[Product]) -> SeedOutcome {
    match backend.get_all().await {
        Err(e) => return SeedOutcome::Failed(e),
        Ok(existing) if !existing.is_empty() => return SeedOutcome::AlreadyPopulated,
        Ok(_) => {}
    }

    let mut inserted = 0;
    for product in fixtures {
        match backend.add(product).await {
            Ok(()) => inserted += 1,
            // Another seeder got there first.
            Err(e) if e.is_already_exists() => {}
            Err(e) => return SeedOutcome::Failed(e),
        }
    }
    SeedOutcome::Seeded(inserted)
}
