//! Unified error codes for the Montura platform
//!
//! This module defines all error codes used across the admin server and
//! the admin UI. Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Refund errors
//! - 6xxx: Stock errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Value out of range
    ValueOutOfRange = 6,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Requested status transition is not allowed
    InvalidStatusTransition = 4002,
    /// Order must contain at least one item
    OrderEmpty = 4003,
    /// Order item not found
    OrderItemNotFound = 4004,
    /// Order was modified concurrently (revision mismatch)
    RevisionConflict = 4005,
    /// Operation not allowed while the order is cancelled
    OrderCancelled = 4006,

    // ==================== 5xxx: Refund ====================
    /// Order already has a live refund
    RefundAlreadyApplied = 5001,
    /// Order has no refund to cancel
    RefundNotFound = 5002,
    /// Order state does not allow refund operations
    RefundNotEligible = 5003,
    /// Refund amount out of range
    RefundAmountInvalid = 5004,

    // ==================== 6xxx: Stock ====================
    /// Insufficient stock for one or more items
    StockConflict = 6001,
    /// No stock record for product variant
    VariantStockNotFound = 6002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// External dependency unavailable
    ExternalDependencyUnavailable = 9003,
    /// External dependency timed out
    ExternalDependencyTimeout = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Whether the caller may usefully retry the same request unchanged
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::RevisionConflict
                | ErrorCode::ExternalDependencyUnavailable
                | ErrorCode::ExternalDependencyTimeout
        )
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidStatusTransition => "Status transition not allowed",
            ErrorCode::OrderEmpty => "Order must contain at least one item",
            ErrorCode::OrderItemNotFound => "Order item not found",
            ErrorCode::RevisionConflict => "Order was modified by another operator",
            ErrorCode::OrderCancelled => "Operation not allowed on a cancelled order",

            // Refund
            ErrorCode::RefundAlreadyApplied => "Order already has a refund applied",
            ErrorCode::RefundNotFound => "Order has no refund to cancel",
            ErrorCode::RefundNotEligible => "Order state does not allow refund operations",
            ErrorCode::RefundAmountInvalid => "Refund amount is out of range",

            // Stock
            ErrorCode::StockConflict => "Insufficient stock for one or more items",
            ErrorCode::VariantStockNotFound => "No stock record for product variant",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ExternalDependencyUnavailable => "External dependency unavailable",
            ErrorCode::ExternalDependencyTimeout => "External dependency timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.message())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            1 => ErrorCode::Unknown,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            5 => ErrorCode::InvalidRequest,
            6 => ErrorCode::ValueOutOfRange,

            4001 => ErrorCode::OrderNotFound,
            4002 => ErrorCode::InvalidStatusTransition,
            4003 => ErrorCode::OrderEmpty,
            4004 => ErrorCode::OrderItemNotFound,
            4005 => ErrorCode::RevisionConflict,
            4006 => ErrorCode::OrderCancelled,

            5001 => ErrorCode::RefundAlreadyApplied,
            5002 => ErrorCode::RefundNotFound,
            5003 => ErrorCode::RefundNotEligible,
            5004 => ErrorCode::RefundAmountInvalid,

            6001 => ErrorCode::StockConflict,
            6002 => ErrorCode::VariantStockNotFound,

            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,
            9003 => ErrorCode::ExternalDependencyUnavailable,
            9004 => ErrorCode::ExternalDependencyTimeout,
            9005 => ErrorCode::ConfigError,

            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}
