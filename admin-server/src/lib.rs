//! Montura Admin Server - order lifecycle and financial consistency engine
//!
//! # Architecture overview
//!
//! This crate is the admin-facing order server of the Montura wholesale
//! eyewear platform. It owns the authoritative order record and every
//! mutation of it:
//!
//! - **Order engine** (`orders`): status state machine, stock conflict
//!   resolution, financial recomputation, refunds, item mutations, bulk
//!   updates
//! - **Database** (`db`): embedded SurrealDB storage with revision-checked
//!   writes
//! - **Inventory** (`inventory`): ledger interface for per-variant stock
//! - **Rates** (`rates`): read-only USD/ARS exchange rate provider
//! - **HTTP API** (`api`): RESTful endpoints for the admin console
//!
//! # Module structure
//!
//! ```text
//! admin-server/src/
//! ├── core/          # Config, state, server
//! ├── db/            # Database layer
//! ├── inventory/     # Inventory ledger
//! ├── rates/         # Exchange rate provider
//! ├── orders/        # Order engine
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # Logging and helpers
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod inventory;
pub mod orders;
pub mod rates;
pub mod utils;

// Re-export public types
pub use crate::core::{Config, Server, ServerState};
pub use inventory::{InventoryLedger, MemoryLedger, SurrealLedger};
pub use orders::{OrderError, OrderService};
pub use rates::{ExchangeRate, ExchangeRateProvider, FixedRateProvider};

// Re-export unified error types from shared
pub use shared::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
