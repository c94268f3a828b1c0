use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::signal::{TradeAction, TradingSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloseReason {
    TakeProfit,
    StopLoss,
    SessionClosed,
}

impl CloseReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TakeProfit => "TAKE_PROFIT",
            Self::StopLoss => "STOP_LOSS",
            Self::SessionClosed => "SESSION_CLOSED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTrade {
    pub trade_id: String,
    pub symbol: String,
    pub action: TradeAction,
    pub volume: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub open_time: DateTime<Utc>,
    pub status: TradeStatus,
    pub exit_price: Option<f64>,
    pub close_time: Option<DateTime<Utc>>,
    pub profit_loss: Option<f64>,
    pub close_reason: Option<CloseReason>,
}

impl ActiveTrade {
    pub fn open(signal: &TradingSignal) -> Self {
        Self {
            trade_id: format!("TRADE_{}", Uuid::new_v4().simple()),
            symbol: signal.symbol.clone(),
            action: signal.action,
            volume: signal.lot_size,
            entry_price: signal.entry_price,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit,
            open_time: Utc::now(),
            status: TradeStatus::Open,
            exit_price: None,
            close_time: None,
            profit_loss: None,
            close_reason: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TradeStatus::Open
    }

    /// Directional price delta times volume times the pip scale.
    pub fn profit_at(&self, exit_price: f64, pip_scale: f64) -> f64 {
        let delta = match self.action {
            TradeAction::Sell => self.entry_price - exit_price,
            _ => exit_price - self.entry_price,
        };
        delta * self.volume * pip_scale
    }

    /// Closed is terminal; callers must not reopen.
    pub fn mark_closed(&mut self, exit_price: f64, profit_loss: f64, reason: CloseReason) {
        self.status = TradeStatus::Closed;
        self.exit_price = Some(exit_price);
        self.close_time = Some(Utc::now());
        self.profit_loss = Some(profit_loss);
        self.close_reason = Some(reason);
    }
}
