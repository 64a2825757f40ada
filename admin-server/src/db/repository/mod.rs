//! Repository Module
//!
//! Persistence for the order aggregate. All ID handling follows the
//! "table:id" convention via `surrealdb::RecordId`:
//!   - parse: `let id: RecordId = "order:abc".parse()?;`
//!   - build: `RecordId::from_table_key("order", "abc")`

pub mod order;

pub use order::OrderRepository;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Revision conflict: {0}")]
    RevisionConflict(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<surrealdb::Error> for RepoError {
    fn from(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        // THROW'n sentinels inside transactions surface as plain messages
        if msg.contains("revision_conflict") {
            RepoError::RevisionConflict(msg)
        } else if msg.contains("order_not_found") {
            RepoError::NotFound(msg)
        } else if msg.contains("order_number_idx") {
            RepoError::Duplicate(msg)
        } else {
            RepoError::Database(msg)
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}
