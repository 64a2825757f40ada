//! Variant Stock Model
//!
//! Per-variant stock record owned by the Inventory Ledger, plus the
//! transient conflict payload returned by stock availability checks.

use serde::{Deserialize, Serialize};

/// Denormalized product display data carried on stock records and conflicts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductInfo {
    pub name: String,
    pub sku: String,
}

/// Per-variant stock balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantStock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub product_variant_id: String,
    /// Units available for reservation
    pub available: i64,
    /// Units currently held by live orders
    pub reserved: i64,
    pub product_name: String,
    pub sku: String,
}

impl VariantStock {
    pub fn product_info(&self) -> ProductInfo {
        ProductInfo {
            name: self.product_name.clone(),
            sku: self.sku.clone(),
        }
    }
}

/// One entry of a stock conflict report (transient, never persisted)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockConflictItem {
    pub product_variant_id: String,
    pub required_quantity: i32,
    pub available_stock: i64,
    pub product_info: ProductInfo,
}
