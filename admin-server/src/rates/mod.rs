//! Exchange Rate Provider
//!
//! The USD/ARS rate is maintained by an external fetcher (out of scope
//! here); this module only reads it. The provider is injected into the
//! order engine so recomputation never reaches for global state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

/// A point-in-time USD to ARS rate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub value: f64,
    pub as_of: DateTime<Utc>,
}

/// Rate provider error
#[derive(Debug, Error)]
pub enum RateError {
    #[error("Exchange rate unavailable: {0}")]
    Unavailable(String),
}

pub type RateResult<T> = Result<T, RateError>;

/// Read-only access to the current exchange rate
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    async fn current_rate(&self) -> RateResult<ExchangeRate>;
}

/// Fixed rate (dev/test wiring, `EXCHANGE_RATE_OVERRIDE`)
pub struct FixedRateProvider {
    value: f64,
}

impl FixedRateProvider {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

#[async_trait]
impl ExchangeRateProvider for FixedRateProvider {
    async fn current_rate(&self) -> RateResult<ExchangeRate> {
        Ok(ExchangeRate {
            value: self.value,
            as_of: Utc::now(),
        })
    }
}

/// Production provider reading the `rate:current` record, which the
/// external rate fetcher keeps up to date
pub struct DbRateProvider {
    db: Surreal<Db>,
}

impl DbRateProvider {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExchangeRateProvider for DbRateProvider {
    async fn current_rate(&self) -> RateResult<ExchangeRate> {
        let rates: Vec<ExchangeRate> = self
            .db
            .query("SELECT value, asOf FROM rate WHERE id = rate:current")
            .await
            .map_err(|e| RateError::Unavailable(e.to_string()))?
            .take(0)
            .map_err(|e| RateError::Unavailable(e.to_string()))?;

        rates
            .into_iter()
            .next()
            .ok_or_else(|| RateError::Unavailable("no rate record".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_provider() {
        let provider = FixedRateProvider::new(1042.5);
        let rate = provider.current_rate().await.unwrap();
        assert_eq!(rate.value, 1042.5);
    }

    #[tokio::test]
    async fn test_db_provider_missing_record() {
        let db = crate::db::DbService::memory().await.unwrap().db;
        let provider = DbRateProvider::new(db);
        assert!(matches!(
            provider.current_rate().await,
            Err(RateError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_db_provider_reads_current() {
        let db = crate::db::DbService::memory().await.unwrap().db;
        db.query("UPSERT rate:current SET value = 995.0, asOf = <string>time::now()")
            .await
            .unwrap();

        let provider = DbRateProvider::new(db);
        let rate = provider.current_rate().await.unwrap();
        assert_eq!(rate.value, 995.0);
    }
}
