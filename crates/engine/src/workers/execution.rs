use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use common::config::EngineConfig;
use common::models::{ActiveTrade, CloseReason, TradeAction, TradingSignal};
use market_data::{BrokerGateway, OrderRequest};
use storage::PersistenceStore;

use crate::performance;
use crate::state::SharedState;
use crate::workers::backoff_or_stop;

/// Periodic loop: close open trades whose stop or target has been reached,
/// open new trades from fresh qualifying signals, then refresh the derived
/// metrics.
pub struct TradeExecutionWorker {
    config: EngineConfig,
    broker: Arc<dyn BrokerGateway>,
    store: Arc<dyn PersistenceStore>,
    state: SharedState,
    stop_rx: watch::Receiver<bool>,
}

impl TradeExecutionWorker {
    pub fn new(
        config: EngineConfig,
        broker: Arc<dyn BrokerGateway>,
        store: Arc<dyn PersistenceStore>,
        state: SharedState,
        stop_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            broker,
            store,
            state,
            stop_rx,
        }
    }

    pub async fn run(mut self) {
        info!("trade execution worker started");
        let mut ticker = time::interval(self.config.execution_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.stop_rx.changed() => break,
                _ = ticker.tick() => {
                    if *self.stop_rx.borrow() {
                        break;
                    }
                    if let Err(e) = self.cycle().await {
                        error!("trade execution cycle failed: {e:#}");
                        if backoff_or_stop(&mut self.stop_rx, self.config.execution_backoff).await {
                            break;
                        }
                    }
                }
            }
        }
        info!("trade execution worker stopped");
    }

    pub(crate) async fn cycle(&self) -> anyhow::Result<()> {
        self.monitor_trades().await;
        self.open_trades().await;
        self.refresh_metrics().await;
        Ok(())
    }

    async fn monitor_trades(&self) {
        let watched: Vec<(ActiveTrade, f64)> = {
            let state = self.state.read().await;
            state
                .trades
                .values()
                .filter(|t| t.is_open())
                .map(|t| {
                    let price = state
                        .cache
                        .get(&t.symbol)
                        .map(|s| s.quote.close)
                        .unwrap_or(t.entry_price);
                    (t.clone(), price)
                })
                .collect()
        };

        for (trade, price) in watched {
            if *self.stop_rx.borrow() {
                return;
            }
            let Some((reason, close_price)) = close_trigger(&trade, price) else {
                continue;
            };

            if let Err(e) = self
                .broker
                .close_position(&trade.trade_id, &trade.symbol, trade.volume, close_price)
                .await
            {
                warn!(
                    "broker close failed for {}: {}; retrying next cycle",
                    trade.trade_id, e
                );
                continue;
            }

            let (closed, session_id) = {
                let mut state = self.state.write().await;
                let session_id = state.session.as_ref().map(|s| s.session_id.clone());
                let closed = state.commit_close(
                    &trade.symbol,
                    close_price,
                    reason,
                    self.config.pip.scale,
                );
                (closed, session_id)
            };

            if let Some(closed) = closed {
                let pnl = closed.profit_loss.unwrap_or_default();
                info!(
                    "trade closed: {} {} - {} - P/L {:.2}",
                    closed.symbol,
                    closed.trade_id,
                    reason.as_str(),
                    pnl
                );
                if let Err(e) = self.store.record_trade_close(&closed).await {
                    warn!("failed to persist trade close {}: {}", closed.trade_id, e);
                }
                if let Err(e) = self
                    .store
                    .record_event(
                        "INFO",
                        "engine",
                        &format!(
                            "trade closed: {} {} P/L {:.2}",
                            closed.symbol,
                            reason.as_str(),
                            pnl
                        ),
                        None,
                        session_id.as_deref(),
                    )
                    .await
                {
                    warn!("failed to record close event: {}", e);
                }
            }
        }
    }

    async fn open_trades(&self) {
        let (open_count, session_id, candidates) = {
            let state = self.state.read().await;
            let Some(session) = state.session.as_ref() else {
                return;
            };
            let candidates: Vec<TradingSignal> = state
                .cache
                .values()
                .filter(|snap| !state.trades.contains_key(&snap.symbol))
                .map(|snap| snap.signal.clone())
                .filter(|sig| sig.action != TradeAction::Hold)
                .filter(|sig| sig.confidence >= self.config.min_confidence)
                .filter(|sig| sig.risk_reward_ratio >= self.config.min_risk_reward)
                .collect();
            (
                state.open_trade_count(),
                session.session_id.clone(),
                candidates,
            )
        };

        let mut slots = self.config.max_concurrent_trades.saturating_sub(open_count);
        for signal in candidates {
            if slots == 0 {
                break;
            }
            if *self.stop_rx.borrow() {
                return;
            }

            let order = OrderRequest {
                symbol: signal.symbol.clone(),
                action: signal.action,
                volume: signal.lot_size,
                price: signal.entry_price,
                stop_loss: signal.stop_loss,
                take_profit: signal.take_profit,
            };
            let fill = match self.broker.open_position(&order).await {
                Ok(fill) => fill,
                Err(e) => {
                    warn!(
                        "broker open failed for {}: {}; skipping this cycle",
                        signal.symbol, e
                    );
                    continue;
                }
            };

            let mut trade = ActiveTrade::open(&signal);
            trade.entry_price = fill.price;

            let inserted = self.state.write().await.commit_open(trade.clone());
            if !inserted {
                continue;
            }
            slots -= 1;

            info!(
                "trade opened: {} {} {} @ {:.5}",
                trade.symbol, trade.action, trade.volume, trade.entry_price
            );
            if let Err(e) = self.store.record_trade_open(&session_id, &trade).await {
                warn!("failed to persist trade open {}: {}", trade.trade_id, e);
            }
            if let Err(e) = self
                .store
                .record_event(
                    "INFO",
                    "engine",
                    &format!("trade opened: {} {}", trade.symbol, trade.action),
                    None,
                    Some(&session_id),
                )
                .await
            {
                warn!("failed to record open event: {}", e);
            }
        }
    }

    async fn refresh_metrics(&self) {
        let mut state = self.state.write().await;
        let metrics = {
            let Some(session) = state.session.as_ref() else {
                return;
            };
            performance::compute(session, state.open_trade_count(), Utc::now())
        };
        state.metrics = metrics;
    }
}

/// Direction-aware stop/target check. Fills at the configured level, not
/// the observed price, matching how the bracket would execute.
pub(crate) fn close_trigger(trade: &ActiveTrade, price: f64) -> Option<(CloseReason, f64)> {
    match trade.action {
        TradeAction::Buy => {
            if price >= trade.take_profit {
                Some((CloseReason::TakeProfit, trade.take_profit))
            } else if price <= trade.stop_loss {
                Some((CloseReason::StopLoss, trade.stop_loss))
            } else {
                None
            }
        }
        TradeAction::Sell => {
            if price <= trade.take_profit {
                Some((CloseReason::TakeProfit, trade.take_profit))
            } else if price >= trade.stop_loss {
                Some((CloseReason::StopLoss, trade.stop_loss))
            } else {
                None
            }
        }
        TradeAction::Hold => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(action: TradeAction, entry: f64, stop: f64, target: f64) -> ActiveTrade {
        let signal = TradingSignal {
            symbol: "EUR/USD".to_string(),
            action,
            confidence: 0.9,
            entry_price: entry,
            stop_loss: stop,
            take_profit: target,
            lot_size: 0.1,
            risk_reward_ratio: 2.0,
            rationale: "test".to_string(),
            generated_at: Utc::now(),
        };
        ActiveTrade::open(&signal)
    }

    #[test]
    fn buy_trade_hits_take_profit_at_or_above_target() {
        let t = trade(TradeAction::Buy, 1.1000, 1.0950, 1.1100);
        assert_eq!(
            close_trigger(&t, 1.1100),
            Some((CloseReason::TakeProfit, 1.1100))
        );
        assert_eq!(
            close_trigger(&t, 1.1150),
            Some((CloseReason::TakeProfit, 1.1100))
        );
        assert_eq!(close_trigger(&t, 1.1050), None);
    }

    #[test]
    fn buy_trade_hits_stop_loss_at_or_below_stop() {
        let t = trade(TradeAction::Buy, 1.1000, 1.0950, 1.1100);
        assert_eq!(
            close_trigger(&t, 1.0950),
            Some((CloseReason::StopLoss, 1.0950))
        );
        assert_eq!(
            close_trigger(&t, 1.0900),
            Some((CloseReason::StopLoss, 1.0950))
        );
    }

    #[test]
    fn sell_trade_comparisons_are_inverted() {
        let t = trade(TradeAction::Sell, 1.1000, 1.1050, 1.0900);
        assert_eq!(
            close_trigger(&t, 1.0900),
            Some((CloseReason::TakeProfit, 1.0900))
        );
        assert_eq!(
            close_trigger(&t, 1.1050),
            Some((CloseReason::StopLoss, 1.1050))
        );
        assert_eq!(close_trigger(&t, 1.0990), None);
    }

    mod cycles {
        use std::sync::Arc;

        use async_trait::async_trait;
        use mockall::Sequence;
        use tokio::sync::{RwLock, watch};

        use common::models::TradingSession;
        use market_data::{BrokerError, BrokerGateway, OrderFill, SimulatedBroker};

        use super::*;
        use crate::state::EngineState;
        use crate::testutil::*;

        mockall::mock! {
            pub Broker {}

            #[async_trait]
            impl BrokerGateway for Broker {
                async fn open_position(
                    &self,
                    order: &OrderRequest,
                ) -> Result<OrderFill, BrokerError>;

                async fn close_position(
                    &self,
                    trade_id: &str,
                    symbol: &str,
                    volume: f64,
                    price: f64,
                ) -> Result<OrderFill, BrokerError>;
            }
        }

        fn state_with_session() -> crate::state::SharedState {
            Arc::new(RwLock::new(EngineState {
                session: Some(TradingSession::start("u1", 1_000.0, 1_200.0)),
                ..Default::default()
            }))
        }

        fn worker(
            broker: Arc<dyn market_data::BrokerGateway>,
            state: crate::state::SharedState,
        ) -> TradeExecutionWorker {
            // cycle() only reads the stop flag, so the dropped sender is fine
            let (_stop_tx, stop_rx) = watch::channel(false);
            TradeExecutionWorker::new(
                test_config(&["EUR/USD"]),
                broker,
                Arc::new(NullStore),
                state,
                stop_rx,
            )
        }

        #[tokio::test]
        async fn qualifying_signal_opens_exactly_one_trade() {
            let state = state_with_session();
            state.write().await.cache.insert(
                "EUR/USD".to_string(),
                snapshot("EUR/USD", 1.1000, TradeAction::Buy, 0.92, 2.0),
            );

            let w = worker(Arc::new(SimulatedBroker), state.clone());
            w.cycle().await.unwrap();

            let state = state.read().await;
            assert_eq!(state.open_trade_count(), 1);
            assert_eq!(state.session.as_ref().unwrap().trades_count, 1);
            assert_eq!(state.metrics.active_trades, 1);
        }

        #[tokio::test]
        async fn hold_signal_never_opens_a_trade() {
            let state = state_with_session();
            // hold signal even with high confidence and risk-reward
            state.write().await.cache.insert(
                "EUR/USD".to_string(),
                snapshot("EUR/USD", 1.1000, TradeAction::Hold, 0.99, 5.0),
            );

            let w = worker(Arc::new(SimulatedBroker), state.clone());
            w.cycle().await.unwrap();

            let state = state.read().await;
            assert_eq!(state.open_trade_count(), 0);
            assert_eq!(state.session.as_ref().unwrap().trades_count, 0);
        }

        #[tokio::test]
        async fn weak_signals_are_filtered_out() {
            let state = state_with_session();
            {
                let mut s = state.write().await;
                // below the confidence floor
                s.cache.insert(
                    "EUR/USD".to_string(),
                    snapshot("EUR/USD", 1.1000, TradeAction::Buy, 0.5, 2.0),
                );
                // below the risk-reward floor
                s.cache.insert(
                    "GBP/USD".to_string(),
                    snapshot("GBP/USD", 1.2750, TradeAction::Sell, 0.95, 1.0),
                );
            }

            let w = worker(Arc::new(SimulatedBroker), state.clone());
            w.cycle().await.unwrap();
            assert_eq!(state.read().await.open_trade_count(), 0);
        }

        #[tokio::test]
        async fn concurrent_trade_cap_blocks_further_opens() {
            let state = state_with_session();
            {
                let mut s = state.write().await;
                for symbol in ["A/USD", "B/USD", "C/USD"] {
                    let snap = snapshot(symbol, 1.0, TradeAction::Buy, 0.92, 2.0);
                    s.commit_open(common::models::ActiveTrade::open(&snap.signal));
                }
                s.cache.insert(
                    "EUR/USD".to_string(),
                    snapshot("EUR/USD", 1.1000, TradeAction::Buy, 0.92, 2.0),
                );
            }

            let w = worker(Arc::new(SimulatedBroker), state.clone());
            w.cycle().await.unwrap();

            let state = state.read().await;
            assert_eq!(state.open_trade_count(), 3);
            assert!(!state.trades.contains_key("EUR/USD"));
        }

        #[tokio::test]
        async fn broker_close_failure_leaves_the_trade_for_retry() {
            let state = state_with_session();
            {
                let mut s = state.write().await;
                // price cached at the take-profit level; signal is a hold so
                // the open step stays quiet
                let snap = snapshot("EUR/USD", 1.1100, TradeAction::Hold, 0.4, 0.0);
                s.cache.insert("EUR/USD".to_string(), snap);
                s.commit_open(trade(TradeAction::Buy, 1.1000, 1.0950, 1.1100));
            }

            let mut broker = MockBroker::new();
            let mut seq = Sequence::new();
            broker
                .expect_close_position()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _, _, _| Err(BrokerError::Transport("scripted".to_string())));
            broker
                .expect_close_position()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|trade_id, symbol, volume, price| {
                    Ok(OrderFill {
                        order_id: trade_id.to_string(),
                        symbol: symbol.to_string(),
                        price,
                        volume,
                        filled_at: Utc::now(),
                    })
                });

            let w = worker(Arc::new(broker), state.clone());

            w.cycle().await.unwrap();
            {
                let s = state.read().await;
                assert_eq!(s.open_trade_count(), 1, "close must be retried, not dropped");
                assert_eq!(s.session.as_ref().unwrap().current_balance, 1_000.0);
            }

            w.cycle().await.unwrap();
            let s = state.read().await;
            assert_eq!(s.open_trade_count(), 0);
            let expected = (1.1100f64 - 1.1000) * 0.1 * 10_000.0;
            assert!(
                (s.session.as_ref().unwrap().current_balance - (1_000.0 + expected)).abs() < 1e-6
            );
            assert_eq!(s.session.as_ref().unwrap().profitable_trades, 1);
        }

        #[tokio::test]
        async fn failing_store_does_not_block_the_trade_path() {
            let state = state_with_session();
            state.write().await.cache.insert(
                "EUR/USD".to_string(),
                snapshot("EUR/USD", 1.1000, TradeAction::Buy, 0.92, 2.0),
            );

            let (_stop_tx, stop_rx) = watch::channel(false);
            let w = TradeExecutionWorker::new(
                test_config(&["EUR/USD"]),
                Arc::new(SimulatedBroker),
                Arc::new(FailingStore),
                state.clone(),
                stop_rx,
            );
            w.cycle().await.unwrap();

            assert_eq!(state.read().await.open_trade_count(), 1);
        }
    }
}
