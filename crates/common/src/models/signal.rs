use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Error)]
#[error("unknown trade action: {0}")]
pub struct ParseActionError(String);

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            "HOLD" => Ok(Self::Hold),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}

/// Immutable once produced by the signal engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSignal {
    pub symbol: String,
    pub action: TradeAction,
    pub confidence: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub lot_size: f64,
    pub risk_reward_ratio: f64,
    pub rationale: String,
    pub generated_at: DateTime<Utc>,
}

impl TradingSignal {
    /// A no-trade signal with zeroed risk parameters.
    pub fn hold(symbol: &str, price: f64, confidence: f64, rationale: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            action: TradeAction::Hold,
            confidence,
            entry_price: price,
            stop_loss: 0.0,
            take_profit: 0.0,
            lot_size: 0.0,
            risk_reward_ratio: 0.0,
            rationale: rationale.to_string(),
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_round_trips_through_strings() {
        for action in [TradeAction::Buy, TradeAction::Sell, TradeAction::Hold] {
            assert_eq!(action.as_str().parse::<TradeAction>().unwrap(), action);
        }
        assert_eq!("buy".parse::<TradeAction>().unwrap(), TradeAction::Buy);
        assert!("LONG".parse::<TradeAction>().is_err());
    }

    #[test]
    fn hold_signal_has_zeroed_risk_fields() {
        let signal = TradingSignal::hold("EUR/USD", 1.095, 0.4, "low confidence");
        assert_eq!(signal.action, TradeAction::Hold);
        assert_eq!(signal.stop_loss, 0.0);
        assert_eq!(signal.take_profit, 0.0);
        assert_eq!(signal.lot_size, 0.0);
        assert_eq!(signal.risk_reward_ratio, 0.0);
    }
}
