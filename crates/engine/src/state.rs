use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use common::models::{
    ActiveTrade, CloseReason, MarketSnapshot, PerformanceMetrics, TradeAction, TradingSession,
};

/// Everything the two workers and the controller share. All mutation goes
/// through the enclosing `RwLock`; trade open/close each commit inside a
/// single write-lock section so balance and counters can never be observed
/// half-updated.
#[derive(Default)]
pub struct EngineState {
    pub session: Option<TradingSession>,
    pub cache: HashMap<String, MarketSnapshot>,
    pub trades: HashMap<String, ActiveTrade>,
    pub metrics: PerformanceMetrics,
}

pub type SharedState = Arc<RwLock<EngineState>>;

impl EngineState {
    pub fn open_trade_count(&self) -> usize {
        self.trades.values().filter(|t| t.is_open()).count()
    }

    /// Removes the symbol's trade and applies the close to the session in
    /// one step: profit/loss, balance, and the profitable counter move
    /// together or not at all.
    pub fn commit_close(
        &mut self,
        symbol: &str,
        exit_price: f64,
        reason: CloseReason,
        pip_scale: f64,
    ) -> Option<ActiveTrade> {
        let mut trade = self.trades.remove(symbol)?;
        if !trade.is_open() {
            return None;
        }

        let profit_loss = trade.profit_at(exit_price, pip_scale);
        trade.mark_closed(exit_price, profit_loss, reason);

        if let Some(session) = self.session.as_mut() {
            session.current_balance += profit_loss;
            if profit_loss > 0.0 {
                session.profitable_trades += 1;
            }
        }
        Some(trade)
    }

    /// Inserts a new trade and bumps the session counter together. Refuses
    /// a symbol that already holds a trade.
    pub fn commit_open(&mut self, trade: ActiveTrade) -> bool {
        if self.trades.contains_key(&trade.symbol) || self.session.is_none() {
            return false;
        }
        self.trades.insert(trade.symbol.clone(), trade);
        if let Some(session) = self.session.as_mut() {
            session.trades_count += 1;
        }
        true
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketOverviewEntry {
    pub symbol: String,
    pub price: f64,
    pub signal: TradeAction,
    pub confidence: f64,
    pub trend: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalSummary {
    pub symbol: String,
    pub action: TradeAction,
    pub confidence: f64,
    pub entry_price: f64,
    pub risk_reward_ratio: f64,
}

/// Read-only view handed to the application layer.
#[derive(Debug, Clone, Serialize)]
pub struct LiveData {
    pub session: Option<TradingSession>,
    pub performance: PerformanceMetrics,
    pub market_overview: Vec<MarketOverviewEntry>,
    pub active_trades: Vec<ActiveTrade>,
    pub signals: Vec<SignalSummary>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::{TradingSignal, TradeStatus};

    fn state_with_session() -> EngineState {
        EngineState {
            session: Some(TradingSession::start("u1", 100.0, 120.0)),
            ..Default::default()
        }
    }

    fn buy_trade(symbol: &str, entry: f64) -> ActiveTrade {
        let signal = TradingSignal {
            symbol: symbol.to_string(),
            action: TradeAction::Buy,
            confidence: 0.9,
            entry_price: entry,
            stop_loss: entry - 0.005,
            take_profit: entry + 0.01,
            lot_size: 0.01,
            risk_reward_ratio: 2.0,
            rationale: "test".to_string(),
            generated_at: Utc::now(),
        };
        ActiveTrade::open(&signal)
    }

    #[test]
    fn commit_open_enforces_one_trade_per_symbol() {
        let mut state = state_with_session();
        assert!(state.commit_open(buy_trade("EUR/USD", 1.1)));
        assert!(!state.commit_open(buy_trade("EUR/USD", 1.1)));
        assert_eq!(state.session.as_ref().unwrap().trades_count, 1);
        assert_eq!(state.open_trade_count(), 1);
    }

    #[test]
    fn commit_close_updates_balance_and_counters_together() {
        let mut state = state_with_session();
        state.commit_open(buy_trade("EUR/USD", 1.1000));

        let closed = state
            .commit_close("EUR/USD", 1.1100, CloseReason::TakeProfit, 10_000.0)
            .unwrap();

        assert_eq!(closed.status, TradeStatus::Closed);
        let expected = (1.1100 - 1.1000) * 0.01 * 10_000.0;
        assert!((closed.profit_loss.unwrap() - expected).abs() < 1e-9);

        let session = state.session.as_ref().unwrap();
        assert!((session.current_balance - (100.0 + expected)).abs() < 1e-9);
        assert_eq!(session.profitable_trades, 1);
        assert!(state.trades.is_empty());
    }

    #[test]
    fn losing_close_does_not_bump_the_profitable_counter() {
        let mut state = state_with_session();
        state.commit_open(buy_trade("EUR/USD", 1.1000));

        state
            .commit_close("EUR/USD", 1.0950, CloseReason::StopLoss, 10_000.0)
            .unwrap();

        let session = state.session.as_ref().unwrap();
        assert_eq!(session.profitable_trades, 0);
        assert!(session.current_balance < 100.0);
    }

    #[test]
    fn commit_close_on_unknown_symbol_is_a_no_op() {
        let mut state = state_with_session();
        assert!(state
            .commit_close("GBP/USD", 1.0, CloseReason::StopLoss, 10_000.0)
            .is_none());
    }
}
