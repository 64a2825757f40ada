//! Order Repository
//!
//! Persistence for the order aggregate. Every update is revision-checked
//! inside a database transaction: a concurrent writer makes the second
//! write fail with `RepoError::RevisionConflict` instead of silently
//! overwriting (optimistic concurrency).

use super::{BaseRepository, RepoError, RepoResult};
use serde::Deserialize;
use shared::models::Order;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

const ORDER_TABLE: &str = "order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// List orders, newest first
    pub async fn find_all(&self, limit: i64, start: i64) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT *, <string>id AS id FROM order ORDER BY orderNumber DESC LIMIT $limit START $start",
            )
            .bind(("limit", limit))
            .bind(("start", start))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Find order by id ("order:xxx")
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let rid: RecordId = id
            .parse()
            .map_err(|_| RepoError::NotFound(format!("Invalid order ID format: {}", id)))?;

        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT *, <string>id AS id FROM order WHERE id = $rid")
            .bind(("rid", rid))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Allocate the next order number (monotonic, crash-safe)
    ///
    /// Numbers skipped by a failed create are never reused; the unique
    /// index on `orderNumber` backstops the counter.
    pub async fn next_order_number(&self) -> RepoResult<i64> {
        #[derive(Debug, Deserialize)]
        struct Counter {
            next: i64,
        }

        let counters: Vec<Counter> = self
            .base
            .db()
            .query("UPSERT counter:orders SET next = (next ?? 0) + 1 RETURN AFTER")
            .await?
            .take(0)?;
        counters
            .into_iter()
            .next()
            .map(|c| c.next)
            .ok_or_else(|| RepoError::Database("order counter unavailable".into()))
    }

    /// Persist a new order
    pub async fn create(&self, order: &Order) -> RepoResult<Order> {
        let mut content = order.clone();
        content.id = None;

        let mut result = self
            .base
            .db()
            .query(
                r#"
                LET $created = (CREATE ONLY order CONTENT $content);
                SELECT *, <string>id AS id FROM order WHERE id = $created.id;
                "#,
            )
            .bind(("content", content))
            .await?;

        let orders: Vec<Order> = result.take(1)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("order create returned no record".into()))
    }

    /// Persist an updated order, guarded by its revision
    ///
    /// The stored revision must equal `order.revision`; on success the
    /// persisted document carries `order.revision + 1`.
    pub async fn update(&self, order: &Order) -> RepoResult<Order> {
        let id = order
            .id
            .as_deref()
            .ok_or_else(|| RepoError::Validation("order has no id".into()))?;
        let rid: RecordId = id
            .parse()
            .map_err(|_| RepoError::NotFound(format!("Invalid order ID format: {}", id)))?;

        let mut content = order.clone();
        content.id = None;
        content.revision = order.revision + 1;

        let mut result = self
            .base
            .db()
            .query(
                r#"
                BEGIN TRANSACTION;
                LET $current = (SELECT revision FROM order WHERE id = $rid);
                IF array::len($current) == 0 { THROW 'order_not_found' };
                IF $current[0].revision != $expected { THROW 'revision_conflict' };
                UPDATE $rid CONTENT $content;
                SELECT *, <string>id AS id FROM order WHERE id = $rid;
                COMMIT TRANSACTION;
                "#,
            )
            .bind(("rid", rid))
            .bind(("expected", order.revision))
            .bind(("content", content))
            .await?;

        let orders: Vec<Order> = result.take(4)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::Database("order update returned no record".into()))
    }
}
