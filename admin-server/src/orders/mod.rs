//! Order Engine
//!
//! Everything that mutates the authoritative order record:
//!
//! - `status`: the lifecycle state machine and its stock side effects
//! - `stock`: conflict resolution against the inventory ledger
//! - `money`: pure financial recomputation (rust_decimal)
//! - `refund`: refund application and cancellation
//! - `items`: item-level mutations
//! - `service`: orchestration, atomic persistence, bulk updates

pub mod error;
pub mod items;
pub mod money;
pub mod refund;
pub mod service;
pub mod status;
pub mod stock;

pub use error::OrderError;
pub use service::OrderService;
