//! Order API payloads
//!
//! Request and response types for the order lifecycle endpoints.

mod dto;

pub use dto::*;
