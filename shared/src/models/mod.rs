//! Data Models
//!
//! Plain serde types shared between the admin server and the UIs.

pub mod order;
pub mod stock;

pub use order::{
    FinancialSnapshot, Order, OrderItem, OrderStatus, PaymentMethod, Refund, RefundType,
};
pub use stock::{ProductInfo, StockConflictItem, VariantStock};
