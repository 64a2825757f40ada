//! Order API Module
//!
//! All order mutations go through the OrderService; handlers stay thin.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        // Bulk status transitions
        .route("/bulk-status", post(handler::bulk_update_status))
        .route("/{id}", get(handler::get_by_id))
        // Single status transition
        .route("/{id}/status", post(handler::update_status))
        // Pre-flight stock check
        .route("/{id}/stock-availability", get(handler::check_stock))
        // Refund lifecycle
        .route(
            "/{id}/refund",
            post(handler::apply_refund).delete(handler::cancel_refund),
        )
        // Item mutations
        .route("/{id}/items", post(handler::update_item))
        // Display flags
        .route("/{id}/flags", post(handler::update_flags))
}
