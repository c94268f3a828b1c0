use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::advisory::AdvisorAnalysis;
use super::indicators::IndicatorSet;
use super::quote::Quote;
use super::signal::TradingSignal;

/// Most recent analysis result for one symbol. The cache keeps exactly one
/// per symbol, overwritten each analysis cycle (last write wins).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub symbol: String,
    pub quote: Quote,
    pub indicators: IndicatorSet,
    pub advisory: AdvisorAnalysis,
    pub signal: TradingSignal,
    pub observed_at: DateTime<Utc>,
}
