//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Success
            Self::Success => StatusCode::OK,

            // 400 Bad Request
            Self::ValidationFailed | Self::InvalidRequest | Self::ValueOutOfRange => {
                StatusCode::BAD_REQUEST
            }

            // 404 Not Found
            Self::NotFound
            | Self::OrderNotFound
            | Self::OrderItemNotFound
            | Self::RefundNotFound
            | Self::VariantStockNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyExists
            | Self::RevisionConflict
            | Self::StockConflict
            | Self::RefundAlreadyApplied => StatusCode::CONFLICT,

            // 422 Unprocessable Entity (business rules)
            Self::InvalidStatusTransition
            | Self::OrderEmpty
            | Self::OrderCancelled
            | Self::RefundNotEligible
            | Self::RefundAmountInvalid => StatusCode::UNPROCESSABLE_ENTITY,

            // 503 Service Unavailable (retryable)
            Self::ExternalDependencyUnavailable | Self::ExternalDependencyTimeout => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
