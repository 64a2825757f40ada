//! Order engine error types
//!
//! `OrderError` is the engine-internal taxonomy. It converts losslessly
//! into `shared::AppError` at the API boundary; the bulk orchestrator
//! instead folds it into per-order failure entries.

use crate::db::RepoError;
use crate::inventory::LedgerError;
use shared::error::{AppError, ErrorCode};
use shared::models::{OrderStatus, StockConflictItem};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order {0} not found")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Transition {from} -> {to} is not allowed")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("Insufficient stock for {} item(s)", .0.len())]
    StockConflict(Vec<StockConflictItem>),

    #[error("Order {0} was modified by another operator")]
    RevisionConflict(String),

    #[error("Order already has a refund applied")]
    RefundAlreadyApplied,

    #[error("Order has no refund to cancel")]
    RefundNotFound,

    #[error("{0}")]
    RefundNotEligible(String),

    #[error("{0}")]
    RefundAmountInvalid(String),

    #[error("Item {0} not found on order")]
    ItemNotFound(String),

    #[error("Order must contain at least one item")]
    OrderEmpty,

    #[error("No stock record for variant {0}")]
    UnknownVariant(String),

    #[error("{dependency} unavailable: {message}")]
    ExternalUnavailable {
        dependency: String,
        message: String,
    },

    #[error("{0} timed out")]
    ExternalTimeout(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl OrderError {
    /// The stock conflict list, when this error carries one
    pub fn conflicts(&self) -> Option<&[StockConflictItem]> {
        match self {
            OrderError::StockConflict(conflicts) => Some(conflicts),
            _ => None,
        }
    }
}

impl From<RepoError> for OrderError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => OrderError::NotFound(msg),
            RepoError::RevisionConflict(msg) => OrderError::RevisionConflict(msg),
            RepoError::Duplicate(msg) => OrderError::Database(msg),
            RepoError::Database(msg) => OrderError::Database(msg),
            RepoError::Validation(msg) => OrderError::Validation(msg),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {} not found", id))
                    .with_detail("orderId", id)
            }
            OrderError::Validation(msg) => AppError::validation(msg),
            OrderError::InvalidTransition { from, to } => AppError::with_message(
                ErrorCode::InvalidStatusTransition,
                format!("Transition {} -> {} is not allowed", from, to),
            )
            .with_detail("from", from.as_str())
            .with_detail("to", to.as_str()),
            OrderError::StockConflict(conflicts) => AppError::new(ErrorCode::StockConflict)
                .with_detail(
                    "conflicts",
                    serde_json::to_value(&conflicts).unwrap_or_default(),
                ),
            OrderError::RevisionConflict(id) => AppError::revision_conflict(id),
            OrderError::RefundAlreadyApplied => AppError::new(ErrorCode::RefundAlreadyApplied),
            OrderError::RefundNotFound => AppError::new(ErrorCode::RefundNotFound),
            OrderError::RefundNotEligible(msg) => {
                AppError::with_message(ErrorCode::RefundNotEligible, msg)
            }
            OrderError::RefundAmountInvalid(msg) => {
                AppError::with_message(ErrorCode::RefundAmountInvalid, msg)
            }
            OrderError::ItemNotFound(variant_id) => AppError::with_message(
                ErrorCode::OrderItemNotFound,
                format!("Item {} not found on order", variant_id),
            )
            .with_detail("productVariantId", variant_id),
            OrderError::OrderEmpty => AppError::new(ErrorCode::OrderEmpty),
            OrderError::UnknownVariant(variant_id) => AppError::with_message(
                ErrorCode::VariantStockNotFound,
                format!("No stock record for variant {}", variant_id),
            )
            .with_detail("productVariantId", variant_id),
            OrderError::ExternalUnavailable {
                dependency,
                message,
            } => AppError::external_dependency(format!("{} unavailable: {}", dependency, message)),
            OrderError::ExternalTimeout(dependency) => AppError::external_timeout(dependency),
            OrderError::Database(msg) => AppError::database(msg),
        }
    }
}
