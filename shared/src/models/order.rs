//! Order Model
//!
//! The authoritative order aggregate. Monetary amounts are stored as `f64`
//! in USD; all arithmetic on them goes through the server's money module
//! (rust_decimal, 2dp). Field names serialize as camelCase for the admin UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Processing,
    OnHold,
    PendingPayment,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Wire/display name (matches the serialized form)
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::OnHold => "ON_HOLD",
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Refunded => "REFUNDED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment method selected for the order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    BankTransfer,
    Card,
}

/// Order line, one per distinct product variant
///
/// `sub_total`, `cogs_usd` and `contribution_margin_usd` are materialized:
/// normally derived from the frozen unit price/cost and quantity, but an
/// explicit manual override (`update_all`) may set them directly, in which
/// case the unit prices are back-derived. Order totals always roll up from
/// these line fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product variant reference (variant lifecycle owned by the catalog)
    pub product_variant_id: String,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    /// Unit cost in USD, frozen at line creation/edit
    pub cost_usd_at_purchase: f64,
    /// Unit price in USD, frozen at line creation/edit
    pub price_usd_at_purchase: f64,
    pub sub_total: f64,
    pub cogs_usd: f64,
    pub contribution_margin_usd: f64,
}

/// Refund kind: absolute USD amount or percentage of the subtotal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundType {
    Fixed,
    Percentage,
}

/// Refund snapshot, at most one live instance per order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    #[serde(rename = "type")]
    pub refund_type: RefundType,
    /// Absolute USD amount (FIXED) or percentage in [0, 100] (PERCENTAGE)
    pub amount: f64,
    /// Resolved USD value actually deducted
    pub applied_amount: f64,
    /// Subtotal captured immediately before the refund was applied
    pub original_sub_total: f64,
    pub processed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Derived financial fields of an order
///
/// Captured as a unit so cancellation can stash it and reactivation can
/// restore it without touching the item list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSnapshot {
    pub sub_total: f64,
    pub total_amount: f64,
    pub total_amount_ars: f64,
    pub total_cogs_usd: f64,
    pub total_contribution_margin_usd: f64,
    pub contribution_margin_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_transfer_expense: Option<f64>,
}

/// Order entity (root aggregate)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Unique, monotonically assigned, immutable
    pub order_number: i64,
    /// Optimistic-concurrency version, bumped on every successful write
    #[serde(default)]
    pub revision: u64,
    pub customer_id: String,
    pub payment_method: PaymentMethod,
    pub order_status: OrderStatus,
    /// Insertion order = display order
    pub items: Vec<OrderItem>,
    /// Sum of item quantities (physical units)
    pub items_count: i32,
    pub sub_total: f64,
    pub total_amount: f64,
    pub total_amount_ars: f64,
    pub total_cogs_usd: f64,
    pub total_contribution_margin_usd: f64,
    pub contribution_margin_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_transfer_expense: Option<f64>,
    /// USD to ARS rate frozen at the last recalculation
    pub exchange_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund: Option<Refund>,
    /// Financial snapshot captured at cancellation, consumed on reactivation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_cancel: Option<FinancialSnapshot>,
    pub is_visible: bool,
    pub allow_view_invoice: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Capture the current derived financial fields as a snapshot
    pub fn financials(&self) -> FinancialSnapshot {
        FinancialSnapshot {
            sub_total: self.sub_total,
            total_amount: self.total_amount,
            total_amount_ars: self.total_amount_ars,
            total_cogs_usd: self.total_cogs_usd,
            total_contribution_margin_usd: self.total_contribution_margin_usd,
            contribution_margin_percentage: self.contribution_margin_percentage,
            bank_transfer_expense: self.bank_transfer_expense,
        }
    }

    /// Overwrite the derived financial fields from a snapshot
    pub fn apply_financials(&mut self, snapshot: &FinancialSnapshot) {
        self.sub_total = snapshot.sub_total;
        self.total_amount = snapshot.total_amount;
        self.total_amount_ars = snapshot.total_amount_ars;
        self.total_cogs_usd = snapshot.total_cogs_usd;
        self.total_contribution_margin_usd = snapshot.total_contribution_margin_usd;
        self.contribution_margin_percentage = snapshot.contribution_margin_percentage;
        self.bank_transfer_expense = snapshot.bank_transfer_expense;
    }

    /// Pin every financial field to zero (cancelled orders)
    pub fn zero_financials(&mut self) {
        self.apply_financials(&FinancialSnapshot::default());
    }

    /// Find an item by its product variant reference
    pub fn item(&self, product_variant_id: &str) -> Option<&OrderItem> {
        self.items
            .iter()
            .find(|i| i.product_variant_id == product_variant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::PendingPayment).unwrap(),
            "\"PENDING_PAYMENT\""
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"ON_HOLD\"").unwrap(),
            OrderStatus::OnHold
        );
    }

    #[test]
    fn test_refund_type_field_name() {
        let refund = Refund {
            refund_type: RefundType::Percentage,
            amount: 50.0,
            applied_amount: 10.0,
            original_sub_total: 20.0,
            processed_at: Utc::now(),
            processed_by: None,
            reason: None,
        };
        let json = serde_json::to_value(&refund).unwrap();
        assert_eq!(json["type"], "PERCENTAGE");
        assert_eq!(json["appliedAmount"], 10.0);
        assert_eq!(json["originalSubTotal"], 20.0);
    }

    #[test]
    fn test_zero_financials() {
        let mut order = Order {
            id: None,
            order_number: 1,
            revision: 0,
            customer_id: "customer:1".into(),
            payment_method: PaymentMethod::Cash,
            order_status: OrderStatus::Processing,
            items: vec![],
            items_count: 0,
            sub_total: 100.0,
            total_amount: 100.0,
            total_amount_ars: 100_000.0,
            total_cogs_usd: 40.0,
            total_contribution_margin_usd: 60.0,
            contribution_margin_percentage: 60.0,
            bank_transfer_expense: Some(4.0),
            exchange_rate: 1000.0,
            refund: None,
            pre_cancel: None,
            is_visible: true,
            allow_view_invoice: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let snapshot = order.financials();
        order.zero_financials();

        assert_eq!(order.sub_total, 0.0);
        assert_eq!(order.total_amount_ars, 0.0);
        assert_eq!(order.bank_transfer_expense, None);

        order.apply_financials(&snapshot);
        assert_eq!(order.sub_total, 100.0);
        assert_eq!(order.bank_transfer_expense, Some(4.0));
    }
}
