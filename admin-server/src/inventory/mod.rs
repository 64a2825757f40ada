//! Inventory Ledger
//!
//! The ledger owns per-variant stock counts. The order engine only ever
//! touches stock through [`InventoryLedger`], so deployments can point it
//! at the embedded database ([`SurrealLedger`]) or an external service.
//!
//! Reservation semantics: `reserve` moves units from `available` to
//! `reserved` only when enough are available (single guarded statement,
//! atomic and retry-safe); `release` moves them back, clamping `reserved`
//! at zero so replays of a release cannot drive it negative.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::VariantStock;
use std::collections::HashMap;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use thiserror::Error;

const STOCK_TABLE: &str = "variant_stock";

/// Ledger error types
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("No stock record for variant {0}")]
    UnknownVariant(String),

    #[error("Inventory ledger backend error: {0}")]
    Backend(String),
}

impl From<surrealdb::Error> for LedgerError {
    fn from(err: surrealdb::Error) -> Self {
        LedgerError::Backend(err.to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Outcome of a reservation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved,
    Insufficient { available: i64 },
}

/// Per-variant stock operations
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Units currently available for reservation
    async fn availability(&self, variant_id: &str) -> LedgerResult<i64>;

    /// Try to hold `quantity` units against an order
    async fn reserve(&self, variant_id: &str, quantity: i32) -> LedgerResult<ReserveOutcome>;

    /// Return `quantity` units to the available pool
    async fn release(&self, variant_id: &str, quantity: i32) -> LedgerResult<()>;
}

// =============================================================================
// SurrealDB-backed ledger
// =============================================================================

/// Production ledger over the embedded database
///
/// Stock records live in `variant_stock`, keyed by the raw variant id.
#[derive(Clone)]
pub struct SurrealLedger {
    db: Surreal<Db>,
}

impl SurrealLedger {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    /// Create or replace a stock record (catalog sync / seeding)
    pub async fn set_stock(&self, stock: &VariantStock) -> LedgerResult<()> {
        let rid = RecordId::from_table_key(STOCK_TABLE, &stock.product_variant_id);
        let mut content = stock.clone();
        content.id = None;

        self.db
            .query("UPSERT $rid CONTENT $content")
            .bind(("rid", rid))
            .bind(("content", content))
            .await?
            .check()?;
        Ok(())
    }
}

#[async_trait]
impl InventoryLedger for SurrealLedger {
    async fn availability(&self, variant_id: &str) -> LedgerResult<i64> {
        let rid = RecordId::from_table_key(STOCK_TABLE, variant_id);
        let available: Vec<i64> = self
            .db
            .query("SELECT VALUE available FROM variant_stock WHERE id = $rid")
            .bind(("rid", rid))
            .await?
            .take(0)?;
        available
            .into_iter()
            .next()
            .ok_or_else(|| LedgerError::UnknownVariant(variant_id.to_string()))
    }

    async fn reserve(&self, variant_id: &str, quantity: i32) -> LedgerResult<ReserveOutcome> {
        let rid = RecordId::from_table_key(STOCK_TABLE, variant_id);
        let updated: Vec<i64> = self
            .db
            .query(
                "UPDATE variant_stock SET available -= $qty, reserved += $qty \
                 WHERE id = $rid AND available >= $qty RETURN VALUE available",
            )
            .bind(("rid", rid))
            .bind(("qty", quantity as i64))
            .await?
            .take(0)?;

        if updated.is_empty() {
            // Guard refused the update: either missing record or short stock
            let available = self.availability(variant_id).await?;
            Ok(ReserveOutcome::Insufficient { available })
        } else {
            Ok(ReserveOutcome::Reserved)
        }
    }

    async fn release(&self, variant_id: &str, quantity: i32) -> LedgerResult<()> {
        let rid = RecordId::from_table_key(STOCK_TABLE, variant_id);
        let updated: Vec<i64> = self
            .db
            .query(
                "UPDATE variant_stock SET available += $qty, \
                 reserved = math::max(reserved - $qty, 0) \
                 WHERE id = $rid RETURN VALUE available",
            )
            .bind(("rid", rid))
            .bind(("qty", quantity as i64))
            .await?
            .take(0)?;

        if updated.is_empty() {
            return Err(LedgerError::UnknownVariant(variant_id.to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// In-memory ledger (tests, dev wiring)
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct StockEntry {
    available: i64,
    reserved: i64,
}

/// In-memory ledger with the same semantics as [`SurrealLedger`]
#[derive(Default)]
pub struct MemoryLedger {
    entries: RwLock<HashMap<String, StockEntry>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seeding helper
    pub fn with_stock(self, variant_id: &str, available: i64) -> Self {
        self.set_stock(variant_id, available);
        self
    }

    /// Create or replace a stock entry
    pub fn set_stock(&self, variant_id: &str, available: i64) {
        self.entries.write().insert(
            variant_id.to_string(),
            StockEntry {
                available,
                reserved: 0,
            },
        );
    }

    /// Current (available, reserved) pair, for assertions
    pub fn snapshot(&self, variant_id: &str) -> Option<(i64, i64)> {
        self.entries
            .read()
            .get(variant_id)
            .map(|e| (e.available, e.reserved))
    }
}

#[async_trait]
impl InventoryLedger for MemoryLedger {
    async fn availability(&self, variant_id: &str) -> LedgerResult<i64> {
        self.entries
            .read()
            .get(variant_id)
            .map(|e| e.available)
            .ok_or_else(|| LedgerError::UnknownVariant(variant_id.to_string()))
    }

    async fn reserve(&self, variant_id: &str, quantity: i32) -> LedgerResult<ReserveOutcome> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(variant_id)
            .ok_or_else(|| LedgerError::UnknownVariant(variant_id.to_string()))?;

        let qty = quantity as i64;
        if entry.available < qty {
            return Ok(ReserveOutcome::Insufficient {
                available: entry.available,
            });
        }
        entry.available -= qty;
        entry.reserved += qty;
        Ok(ReserveOutcome::Reserved)
    }

    async fn release(&self, variant_id: &str, quantity: i32) -> LedgerResult<()> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(variant_id)
            .ok_or_else(|| LedgerError::UnknownVariant(variant_id.to_string()))?;

        let qty = quantity as i64;
        entry.available += qty;
        entry.reserved = (entry.reserved - qty).max(0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_ledger_reserve_release() {
        let ledger = MemoryLedger::new().with_stock("variant:1", 10);

        assert_eq!(ledger.availability("variant:1").await.unwrap(), 10);

        let outcome = ledger.reserve("variant:1", 4).await.unwrap();
        assert_eq!(outcome, ReserveOutcome::Reserved);
        assert_eq!(ledger.snapshot("variant:1"), Some((6, 4)));

        ledger.release("variant:1", 4).await.unwrap();
        assert_eq!(ledger.snapshot("variant:1"), Some((10, 0)));
    }

    #[tokio::test]
    async fn test_memory_ledger_insufficient() {
        let ledger = MemoryLedger::new().with_stock("variant:1", 3);

        let outcome = ledger.reserve("variant:1", 5).await.unwrap();
        assert_eq!(outcome, ReserveOutcome::Insufficient { available: 3 });
        // Nothing was held
        assert_eq!(ledger.snapshot("variant:1"), Some((3, 0)));
    }

    #[tokio::test]
    async fn test_memory_ledger_release_clamps_reserved() {
        let ledger = MemoryLedger::new().with_stock("variant:1", 10);
        ledger.reserve("variant:1", 2).await.unwrap();

        // Replayed release must not drive reserved negative
        ledger.release("variant:1", 2).await.unwrap();
        ledger.release("variant:1", 2).await.unwrap();
        assert_eq!(ledger.snapshot("variant:1"), Some((14, 0)));
    }

    #[tokio::test]
    async fn test_memory_ledger_unknown_variant() {
        let ledger = MemoryLedger::new();
        assert!(matches!(
            ledger.availability("variant:missing").await,
            Err(LedgerError::UnknownVariant(_))
        ));
        assert!(matches!(
            ledger.reserve("variant:missing", 1).await,
            Err(LedgerError::UnknownVariant(_))
        ));
    }

    #[tokio::test]
    async fn test_surreal_ledger_roundtrip() {
        let db = crate::db::DbService::memory().await.unwrap().db;
        let ledger = SurrealLedger::new(db);

        ledger
            .set_stock(&VariantStock {
                id: None,
                product_variant_id: "variant:7".into(),
                available: 5,
                reserved: 0,
                product_name: "Wayfarer Classic".into(),
                sku: "WF-001".into(),
            })
            .await
            .unwrap();

        assert_eq!(ledger.availability("variant:7").await.unwrap(), 5);

        assert_eq!(
            ledger.reserve("variant:7", 3).await.unwrap(),
            ReserveOutcome::Reserved
        );
        assert_eq!(ledger.availability("variant:7").await.unwrap(), 2);

        assert_eq!(
            ledger.reserve("variant:7", 3).await.unwrap(),
            ReserveOutcome::Insufficient { available: 2 }
        );

        ledger.release("variant:7", 3).await.unwrap();
        assert_eq!(ledger.availability("variant:7").await.unwrap(), 5);
    }
}
