//! Shared types for the Montura wholesale platform
//!
//! Common types used by the admin server and the admin/storefront UIs:
//! the Order aggregate and its value objects, request/response payloads,
//! and the unified error system.

pub mod error;
pub mod models;
pub mod order;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
