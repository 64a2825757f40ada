//! Order endpoint payloads

use crate::models::{Order, OrderStatus, RefundType, StockConflictItem};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ==================== Requests ====================

/// Status transition request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub new_status: OrderStatus,
}

/// Bulk status transition request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateStatusRequest {
    #[validate(length(min = 1, message = "orderIds must not be empty"))]
    pub order_ids: Vec<String>,
    pub new_status: OrderStatus,
}

/// Apply refund request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRefundRequest {
    #[serde(rename = "type")]
    pub refund_type: RefundType,
    #[validate(range(min = 0.0, message = "amount must be non-negative"))]
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// When true (only legal from COMPLETED), the order moves to REFUNDED
    #[serde(default)]
    pub complete: bool,
}

/// Wire form of an item mutation action
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemActionKind {
    Increase,
    Decrease,
    Remove,
    Add,
    Set,
    UpdatePrices,
    UpdateAll,
}

/// Item update request
///
/// Which optional fields are required depends on `action`; the engine
/// validates the combination before any side effect is attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdateRequest {
    pub product_variant_id: String,
    pub action: ItemActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd_at_purchase: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_usd_at_purchase: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_total: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contribution_margin_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

/// New order line payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_variant_id: String,
    pub product_name: String,
    pub sku: String,
    #[validate(range(min = 1, message = "quantity must be positive"))]
    pub quantity: i32,
    #[validate(range(min = 0.0, message = "cost must be non-negative"))]
    pub cost_usd_at_purchase: f64,
    #[validate(range(min = 0.0, message = "price must be non-negative"))]
    pub price_usd_at_purchase: f64,
}

/// Create order request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: String,
    pub payment_method: crate::models::PaymentMethod,
    #[validate(length(min = 1, message = "order must contain at least one item"), nested)]
    pub items: Vec<NewOrderItem>,
}

/// Display flag toggles (no financial effect)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFlagsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_view_invoice: Option<bool>,
}

// ==================== Responses ====================

/// Status transition response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_conflicts: Option<Vec<StockConflictItem>>,
    pub message: String,
}

/// One failed entry of a bulk status update
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedUpdate {
    pub order_id: String,
    pub error: String,
}

/// Bulk status update response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusResponse {
    pub successful_updates: Vec<String>,
    pub failed_updates: Vec<FailedUpdate>,
    pub total_requested: usize,
    pub total_successful: usize,
    pub total_failed: usize,
}

/// Stock availability check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCheckResponse {
    pub has_conflicts: bool,
    pub conflicts: Vec<StockConflictItem>,
}

/// Monetary before/after diff of a refund application
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefundDetails {
    pub original_sub_total: f64,
    pub refund_amount: f64,
    pub new_sub_total: f64,
    pub original_total_amount: f64,
    pub new_total_amount: f64,
    pub original_contribution_margin_usd: f64,
    pub new_contribution_margin_usd: f64,
}

/// Apply refund response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRefundResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_details: Option<RefundDetails>,
}

/// Monetary diff of a refund cancellation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RefundCancellationDetails {
    pub cancelled_refund_amount: f64,
    pub restored_sub_total: f64,
    pub restored_total_amount: f64,
    pub restored_contribution_margin_usd: f64,
    pub cogs_usd: f64,
}

/// Cancel refund response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRefundResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_cancellation_details: Option<RefundCancellationDetails>,
}
