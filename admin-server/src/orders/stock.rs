//! Stock Conflict Resolver
//!
//! Pure availability check against the inventory ledger. Used standalone
//! by the pre-flight stock check endpoint and internally before any
//! reserving transition. Never mutates state.

use std::time::Duration;

use shared::models::{OrderItem, ProductInfo, StockConflictItem};

use super::error::OrderError;
use crate::inventory::{InventoryLedger, LedgerError};

/// Result of an availability check
#[derive(Debug, Clone)]
pub struct StockCheck {
    pub has_conflicts: bool,
    pub conflicts: Vec<StockConflictItem>,
}

/// Check availability for every item of an order
///
/// All conflicts are collected and reported together (no short-circuit on
/// the first shortfall) so the caller can remediate per item. A variant
/// without a stock record counts as zero available.
pub async fn check_items(
    ledger: &dyn InventoryLedger,
    items: &[OrderItem],
    timeout: Duration,
) -> Result<StockCheck, OrderError> {
    let mut conflicts = Vec::new();

    for item in items {
        if let Some(conflict) = check_one(
            ledger,
            &item.product_variant_id,
            &item.product_name,
            &item.sku,
            item.quantity,
            timeout,
        )
        .await?
        {
            conflicts.push(conflict);
        }
    }

    Ok(StockCheck {
        has_conflicts: !conflicts.is_empty(),
        conflicts,
    })
}

/// Check availability of `required` additional units of a single variant
pub async fn check_one(
    ledger: &dyn InventoryLedger,
    variant_id: &str,
    product_name: &str,
    sku: &str,
    required: i32,
    timeout: Duration,
) -> Result<Option<StockConflictItem>, OrderError> {
    if required <= 0 {
        return Ok(None);
    }

    let available = match tokio::time::timeout(timeout, ledger.availability(variant_id)).await {
        Err(_) => return Err(OrderError::ExternalTimeout("inventory ledger".into())),
        Ok(Err(LedgerError::UnknownVariant(_))) => 0,
        Ok(Err(LedgerError::Backend(message))) => {
            return Err(OrderError::ExternalUnavailable {
                dependency: "inventory ledger".into(),
                message,
            });
        }
        Ok(Ok(available)) => available,
    };

    if available < required as i64 {
        return Ok(Some(StockConflictItem {
            product_variant_id: variant_id.to_string(),
            required_quantity: required,
            available_stock: available,
            product_info: ProductInfo {
                name: product_name.to_string(),
                sku: sku.to_string(),
            },
        }));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::MemoryLedger;

    const TIMEOUT: Duration = Duration::from_millis(500);

    fn item(variant_id: &str, quantity: i32) -> OrderItem {
        OrderItem {
            product_variant_id: variant_id.to_string(),
            product_name: format!("Frame {}", variant_id),
            sku: format!("SKU-{}", variant_id),
            quantity,
            cost_usd_at_purchase: 4.0,
            price_usd_at_purchase: 10.0,
            sub_total: 10.0 * quantity as f64,
            cogs_usd: 4.0 * quantity as f64,
            contribution_margin_usd: 6.0 * quantity as f64,
        }
    }

    #[tokio::test]
    async fn test_no_conflicts_when_stocked() {
        let ledger = MemoryLedger::new()
            .with_stock("variant:1", 10)
            .with_stock("variant:2", 10);

        let check = check_items(&ledger, &[item("variant:1", 2), item("variant:2", 5)], TIMEOUT)
            .await
            .unwrap();
        assert!(!check.has_conflicts);
        assert!(check.conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_reports_all_conflicts_together() {
        // Two items short at once: both must be reported, not just the first
        let ledger = MemoryLedger::new()
            .with_stock("variant:1", 1)
            .with_stock("variant:2", 0)
            .with_stock("variant:3", 10);

        let check = check_items(
            &ledger,
            &[item("variant:1", 2), item("variant:2", 3), item("variant:3", 1)],
            TIMEOUT,
        )
        .await
        .unwrap();

        assert!(check.has_conflicts);
        assert_eq!(check.conflicts.len(), 2);
        assert_eq!(check.conflicts[0].product_variant_id, "variant:1");
        assert_eq!(check.conflicts[0].available_stock, 1);
        assert_eq!(check.conflicts[0].required_quantity, 2);
        assert_eq!(check.conflicts[1].product_variant_id, "variant:2");
        assert_eq!(check.conflicts[1].available_stock, 0);
    }

    #[tokio::test]
    async fn test_unknown_variant_counts_as_zero() {
        let ledger = MemoryLedger::new();

        let check = check_items(&ledger, &[item("variant:ghost", 1)], TIMEOUT)
            .await
            .unwrap();
        assert!(check.has_conflicts);
        assert_eq!(check.conflicts[0].available_stock, 0);
        assert_eq!(check.conflicts[0].product_info.sku, "SKU-variant:ghost");
    }

    #[tokio::test]
    async fn test_check_one_ignores_non_positive_delta() {
        let ledger = MemoryLedger::new();
        let conflict = check_one(&ledger, "variant:1", "Frame", "SKU", 0, TIMEOUT)
            .await
            .unwrap();
        assert!(conflict.is_none());
    }
}
