use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;

use common::models::{ActiveTrade, MarketSnapshot};

use crate::repositories::{AnalysisRepository, EventsRepository, TradesRepository};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable recording of trades, analyses and lifecycle events. Callers
/// treat every method as fire-and-forget: failures are logged at the call
/// site and never stop trading.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    async fn record_trade_open(
        &self,
        session_id: &str,
        trade: &ActiveTrade,
    ) -> Result<(), StorageError>;

    async fn record_trade_close(&self, trade: &ActiveTrade) -> Result<(), StorageError>;

    async fn record_analysis(&self, snapshot: &MarketSnapshot) -> Result<(), StorageError>;

    async fn record_event(
        &self,
        level: &str,
        module: &str,
        message: &str,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<(), StorageError>;
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersistenceStore for SqliteStore {
    async fn record_trade_open(
        &self,
        session_id: &str,
        trade: &ActiveTrade,
    ) -> Result<(), StorageError> {
        TradesRepository::insert_open(&self.pool, session_id, trade).await?;
        Ok(())
    }

    async fn record_trade_close(&self, trade: &ActiveTrade) -> Result<(), StorageError> {
        TradesRepository::update_close(&self.pool, trade).await?;
        Ok(())
    }

    async fn record_analysis(&self, snapshot: &MarketSnapshot) -> Result<(), StorageError> {
        AnalysisRepository::insert(&self.pool, snapshot).await?;
        Ok(())
    }

    async fn record_event(
        &self,
        level: &str,
        module: &str,
        message: &str,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<(), StorageError> {
        EventsRepository::insert(&self.pool, level, module, message, user_id, session_id).await?;
        Ok(())
    }
}
