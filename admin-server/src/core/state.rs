//! Server state
//!
//! `ServerState` holds shared references to every service the handlers
//! need. Cloning is shallow (Arc) and cheap.

use std::sync::Arc;
use std::time::Duration;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::Config;
use crate::db::{DbService, OrderRepository};
use crate::inventory::{InventoryLedger, SurrealLedger};
use crate::orders::OrderService;
use crate::rates::{DbRateProvider, ExchangeRateProvider, FixedRateProvider};

#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Config,
    /// Embedded database (SurrealDB)
    pub db: Surreal<Db>,
    /// Inventory ledger
    pub ledger: Arc<dyn InventoryLedger>,
    /// Exchange rate provider
    pub rates: Arc<dyn ExchangeRateProvider>,
    /// Order engine
    pub orders: Arc<OrderService>,
}

impl ServerState {
    /// Initialize the full service graph
    ///
    /// 1. Work directory structure
    /// 2. Embedded database (work_dir/database/montura.db)
    /// 3. Inventory ledger and exchange rate provider
    /// 4. Order service
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_dir().join("montura.db");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;
        let db = db_service.db;

        let ledger: Arc<dyn InventoryLedger> = Arc::new(SurrealLedger::new(db.clone()));

        // A fixed override bypasses the externally maintained rate record
        let rates: Arc<dyn ExchangeRateProvider> = match config.exchange_rate_override {
            Some(value) => Arc::new(FixedRateProvider::new(value)),
            None => Arc::new(DbRateProvider::new(db.clone())),
        };

        let orders = Arc::new(OrderService::new(
            OrderRepository::new(db.clone()),
            ledger.clone(),
            rates.clone(),
            Duration::from_millis(config.ledger_timeout_ms),
            Duration::from_millis(config.rate_timeout_ms),
        ));

        Ok(Self {
            config: config.clone(),
            db,
            ledger,
            rates,
            orders,
        })
    }

    /// Get the database instance
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}
