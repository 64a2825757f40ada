//! Utility module - logging and common helpers

pub mod logger;

pub use logger::{init_logger, init_logger_with_file};
