//! Server configuration
//!
//! All configuration is environment-driven with sensible defaults:
//!
//! | Environment variable | Default | Description |
//! |----------------------|---------|-------------|
//! | WORK_DIR | /var/lib/montura/admin | Work directory (database, logs) |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | ENVIRONMENT | development | development / staging / production |
//! | LOG_LEVEL | info | tracing level filter |
//! | LOG_DIR | (unset) | Directory for rolling log files |
//! | REQUEST_TIMEOUT_MS | 30000 | Per-request timeout |
//! | LEDGER_TIMEOUT_MS | 5000 | Inventory ledger call timeout |
//! | RATE_TIMEOUT_MS | 5000 | Exchange rate provider call timeout |
//! | SHUTDOWN_TIMEOUT_MS | 10000 | Graceful shutdown budget |
//! | EXCHANGE_RATE_OVERRIDE | (unset) | Fixed USD/ARS rate (dev/test) |

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Work directory for database and log files
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Log level filter
    pub log_level: String,
    /// Optional directory for rolling log files
    pub log_dir: Option<String>,
    /// Per-request timeout (milliseconds)
    pub request_timeout_ms: u64,
    /// Inventory ledger call timeout (milliseconds)
    pub ledger_timeout_ms: u64,
    /// Exchange rate provider call timeout (milliseconds)
    pub rate_timeout_ms: u64,
    /// Graceful shutdown budget (milliseconds)
    pub shutdown_timeout_ms: u64,
    /// Fixed USD/ARS rate; when set, the external rate provider is bypassed
    pub exchange_rate_override: Option<f64>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR")
                .unwrap_or_else(|_| "/var/lib/montura/admin".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            ledger_timeout_ms: std::env::var("LEDGER_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            rate_timeout_ms: std::env::var("RATE_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
            exchange_rate_override: std::env::var("EXCHANGE_RATE_OVERRIDE")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Directory holding the embedded database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// Ensure the work directory structure exists
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        if let Some(dir) = &self.log_dir {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
