use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use common::models::{Quote, TradeAction};

#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("market data unavailable for {symbol}: {reason}")]
    Unavailable { symbol: String, reason: String },
}

impl MarketDataError {
    pub fn unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("order rejected: {0}")]
    Rejected(String),
    #[error("broker transport error: {0}")]
    Transport(String),
}

/// OHLCV source for one symbol at a time.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Recent close series, oldest first, for the indicator engine.
    async fn recent_closes(&self, symbol: &str, len: usize) -> Result<Vec<f64>, MarketDataError>;
}

#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub symbol: String,
    pub action: TradeAction,
    pub volume: f64,
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
}

#[derive(Debug, Clone)]
pub struct OrderFill {
    pub order_id: String,
    pub symbol: String,
    pub price: f64,
    pub volume: f64,
    pub filled_at: DateTime<Utc>,
}

/// Order execution boundary. The engine treats fills as authoritative but
/// never assumes whether they are simulated or routed to a live account.
#[async_trait]
pub trait BrokerGateway: Send + Sync {
    async fn open_position(&self, order: &OrderRequest) -> Result<OrderFill, BrokerError>;

    async fn close_position(
        &self,
        trade_id: &str,
        symbol: &str,
        volume: f64,
        price: f64,
    ) -> Result<OrderFill, BrokerError>;
}
