//! Database Module
//!
//! Embedded SurrealDB storage. Production uses the RocksDB engine under
//! the configured work directory; tests run on the in-memory engine.

pub mod repository;

pub use repository::{OrderRepository, RepoError, RepoResult};

use shared::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem, RocksDb};

/// Database service owning the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the database at the given path
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        Self::initialize(db).await
    }

    /// Open a fresh in-memory database (tests and tooling)
    pub async fn memory() -> Result<Self, AppError> {
        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")))?;

        Self::initialize(db).await
    }

    async fn initialize(db: Surreal<Db>) -> Result<Self, AppError> {
        db.use_ns("montura")
            .use_db("admin")
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        define_tables(&db).await?;

        tracing::info!("Database connection established");
        Ok(Self { db })
    }
}

/// Define tables and indexes (idempotent)
async fn define_tables(db: &Surreal<Db>) -> Result<(), AppError> {
    db.query(
        r#"
        DEFINE TABLE IF NOT EXISTS order SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS order_number_idx ON TABLE order FIELDS orderNumber UNIQUE;
        DEFINE TABLE IF NOT EXISTS counter SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS variant_stock SCHEMALESS;
        DEFINE TABLE IF NOT EXISTS rate SCHEMALESS;
        "#,
    )
    .await
    .map_err(|e| AppError::database(format!("Failed to define tables: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_rocksdb_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("montura.db");

        let service = DbService::new(&path.to_string_lossy()).await.unwrap();
        service.db.query("INFO FOR DB").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_database_defines_tables() {
        let service = DbService::memory().await.unwrap();
        // Unique index on orderNumber is part of the schema
        service
            .db
            .query("CREATE order:a SET orderNumber = 1, revision = 0")
            .await
            .unwrap()
            .check()
            .unwrap();
        let duplicate = service
            .db
            .query("CREATE order:b SET orderNumber = 1, revision = 0")
            .await
            .unwrap()
            .check();
        assert!(duplicate.is_err());
    }
}
