//! Deterministic fakes shared by the engine tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use advisor::{AdvisorError, AiAdvisor};
use common::config::EngineConfig;
use common::models::{
    AdvisorAnalysis, IndicatorSet, MarketSnapshot, Quote, TradeAction, TradingSignal,
};
use market_data::{MarketDataError, MarketDataProvider};
use std::sync::Arc;
use storage::{PersistenceStore, StorageError};
use strategy::{IndicatorEngine, SignalEngine};

pub fn test_config(symbols: &[&str]) -> EngineConfig {
    EngineConfig {
        symbols: symbols.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

pub fn signal_engine(config: &EngineConfig) -> Arc<SignalEngine> {
    Arc::new(SignalEngine::new(
        config.blend,
        config.min_confidence,
        config.sizing,
        config.pip,
    ))
}

/// Feed serving one settable price for every symbol.
pub struct ScriptedFeed {
    price: Mutex<f64>,
}

impl ScriptedFeed {
    pub fn new(price: f64) -> Self {
        Self {
            price: Mutex::new(price),
        }
    }

    pub fn set_price(&self, price: f64) {
        *self.price.lock().unwrap() = price;
    }

    fn price(&self) -> f64 {
        *self.price.lock().unwrap()
    }
}

#[async_trait]
impl MarketDataProvider for ScriptedFeed {
    async fn fetch(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let close = self.price();
        Ok(Quote {
            symbol: symbol.to_string(),
            open: close,
            high: close * 1.0005,
            low: close * 0.9995,
            close,
            volume: 5_000.0,
            timestamp: Utc::now(),
        })
    }

    async fn recent_closes(&self, _symbol: &str, len: usize) -> Result<Vec<f64>, MarketDataError> {
        Ok(vec![self.price(); len])
    }
}

/// Scripted feed that fails for exactly one symbol.
pub struct FlakyFeed {
    pub inner: ScriptedFeed,
    pub failing: String,
}

#[async_trait]
impl MarketDataProvider for FlakyFeed {
    async fn fetch(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        if symbol == self.failing {
            return Err(MarketDataError::unavailable(symbol, "scripted outage"));
        }
        self.inner.fetch(symbol).await
    }

    async fn recent_closes(&self, symbol: &str, len: usize) -> Result<Vec<f64>, MarketDataError> {
        if symbol == self.failing {
            return Err(MarketDataError::unavailable(symbol, "scripted outage"));
        }
        self.inner.recent_closes(symbol, len).await
    }
}

/// Indicator set with all three confidence heuristics firing (sum 2.4 over
/// 3 factors: technical confidence 0.8).
pub struct StrongIndicators;

impl IndicatorEngine for StrongIndicators {
    fn compute(&self, series: &[f64]) -> IndicatorSet {
        let close = series.last().copied().unwrap_or(1.0);
        IndicatorSet {
            rsi: 55.0,
            macd: 0.002,
            macd_signal: 0.001,
            macd_histogram: 0.001,
            bb_upper: close,
            bb_middle: close * 0.99,
            bb_lower: close * 0.98,
            sma_20: close,
            ema_12: close,
            ema_26: close,
            atr: 0.001 * close,
        }
    }
}

pub struct FixedAdvisor {
    pub analysis: AdvisorAnalysis,
}

impl FixedAdvisor {
    pub fn buy(confidence_level: f64, stop_loss: f64, take_profit: f64) -> Self {
        Self {
            analysis: AdvisorAnalysis {
                trend: "bullish".to_string(),
                support_level: 0.0,
                resistance_level: 0.0,
                signal: TradeAction::Buy,
                confidence_level,
                risk_assessment: "low".to_string(),
                expected_profit_range: None,
                stop_loss: Some(stop_loss),
                take_profit: Some(take_profit),
                recommendation: None,
            },
        }
    }
}

#[async_trait]
impl AiAdvisor for FixedAdvisor {
    async fn analyze(
        &self,
        _symbol: &str,
        _quote: &Quote,
        _indicators: &IndicatorSet,
    ) -> Result<AdvisorAnalysis, AdvisorError> {
        Ok(self.analysis.clone())
    }
}

pub struct FailingAdvisor;

#[async_trait]
impl AiAdvisor for FailingAdvisor {
    async fn analyze(
        &self,
        _symbol: &str,
        _quote: &Quote,
        _indicators: &IndicatorSet,
    ) -> Result<AdvisorAnalysis, AdvisorError> {
        Err(AdvisorError::Unavailable("scripted outage".to_string()))
    }
}

pub struct NullStore;

#[async_trait]
impl PersistenceStore for NullStore {
    async fn record_trade_open(
        &self,
        _session_id: &str,
        _trade: &common::models::ActiveTrade,
    ) -> Result<(), StorageError> {
        Ok(())
    }

    async fn record_trade_close(
        &self,
        _trade: &common::models::ActiveTrade,
    ) -> Result<(), StorageError> {
        Ok(())
    }

    async fn record_analysis(&self, _snapshot: &MarketSnapshot) -> Result<(), StorageError> {
        Ok(())
    }

    async fn record_event(
        &self,
        _level: &str,
        _module: &str,
        _message: &str,
        _user_id: Option<&str>,
        _session_id: Option<&str>,
    ) -> Result<(), StorageError> {
        Ok(())
    }
}

pub struct FailingStore;

#[async_trait]
impl PersistenceStore for FailingStore {
    async fn record_trade_open(
        &self,
        _session_id: &str,
        _trade: &common::models::ActiveTrade,
    ) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("scripted outage".to_string()))
    }

    async fn record_trade_close(
        &self,
        _trade: &common::models::ActiveTrade,
    ) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("scripted outage".to_string()))
    }

    async fn record_analysis(&self, _snapshot: &MarketSnapshot) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("scripted outage".to_string()))
    }

    async fn record_event(
        &self,
        _level: &str,
        _module: &str,
        _message: &str,
        _user_id: Option<&str>,
        _session_id: Option<&str>,
    ) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("scripted outage".to_string()))
    }
}

/// Builds a cache entry with the given signal parameters; the quote close
/// doubles as the monitor price for the symbol.
pub fn snapshot(
    symbol: &str,
    close: f64,
    action: TradeAction,
    confidence: f64,
    risk_reward_ratio: f64,
) -> MarketSnapshot {
    let quote = Quote {
        symbol: symbol.to_string(),
        open: close,
        high: close * 1.0005,
        low: close * 0.9995,
        close,
        volume: 5_000.0,
        timestamp: Utc::now(),
    };
    let signal = TradingSignal {
        symbol: symbol.to_string(),
        action,
        confidence,
        entry_price: close,
        stop_loss: close * 0.995,
        take_profit: close * 1.01,
        lot_size: 0.1,
        risk_reward_ratio,
        rationale: "test".to_string(),
        generated_at: Utc::now(),
    };
    MarketSnapshot {
        symbol: symbol.to_string(),
        quote,
        indicators: IndicatorSet::neutral(close),
        advisory: AdvisorAnalysis {
            trend: "neutral".to_string(),
            support_level: 0.0,
            resistance_level: 0.0,
            signal: action,
            confidence_level: confidence * 100.0,
            risk_assessment: "low".to_string(),
            expected_profit_range: None,
            stop_loss: None,
            take_profit: None,
            recommendation: None,
        },
        signal,
        observed_at: Utc::now(),
    }
}
