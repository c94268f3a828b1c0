use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use advisor::AiAdvisor;
use common::config::EngineConfig;
use common::models::{CloseReason, PerformanceMetrics, TradeAction, TradingSession};
use market_data::{BrokerGateway, MarketDataProvider};
use storage::PersistenceStore;
use strategy::{IndicatorEngine, SignalEngine};

use crate::performance;
use crate::state::{EngineState, LiveData, MarketOverviewEntry, SharedState, SignalSummary};
use crate::workers::{MarketAnalysisWorker, TradeExecutionWorker};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a trading session is already active")]
    AlreadyActive,
    #[error("no trading session is active")]
    NotActive,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStarted {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStopped {
    pub message: String,
    pub performance: PerformanceMetrics,
}

struct WorkerSet {
    stop_tx: watch::Sender<bool>,
    analysis: JoinHandle<()>,
    execution: JoinHandle<()>,
}

/// Owns the session lifecycle and the shared state, and starts/stops the
/// two workers. Collaborators are injected so the engine never assumes a
/// particular feed, broker, advisor or store.
pub struct TradingEngine {
    config: EngineConfig,
    provider: Arc<dyn MarketDataProvider>,
    indicators: Arc<dyn IndicatorEngine>,
    advisor: Arc<dyn AiAdvisor>,
    broker: Arc<dyn BrokerGateway>,
    store: Arc<dyn PersistenceStore>,
    signal_engine: Arc<SignalEngine>,
    state: SharedState,
    runtime: Mutex<Option<WorkerSet>>,
}

impl TradingEngine {
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn MarketDataProvider>,
        indicators: Arc<dyn IndicatorEngine>,
        advisor: Arc<dyn AiAdvisor>,
        broker: Arc<dyn BrokerGateway>,
        store: Arc<dyn PersistenceStore>,
    ) -> Self {
        let signal_engine = Arc::new(SignalEngine::new(
            config.blend,
            config.min_confidence,
            config.sizing,
            config.pip,
        ));
        Self {
            config,
            provider,
            indicators,
            advisor,
            broker,
            store,
            signal_engine,
            state: Arc::new(RwLock::new(EngineState::default())),
            runtime: Mutex::new(None),
        }
    }

    pub async fn start(
        &self,
        user_id: &str,
        initial_balance: f64,
        target_balance: f64,
    ) -> Result<SessionStarted, SessionError> {
        let mut runtime = self.runtime.lock().await;
        if runtime.is_some() {
            return Err(SessionError::AlreadyActive);
        }

        let session = TradingSession::start(user_id, initial_balance, target_balance);
        let session_id = session.session_id.clone();
        {
            let mut state = self.state.write().await;
            state.cache.clear();
            state.trades.clear();
            state.metrics = performance::compute(&session, 0, Utc::now());
            state.session = Some(session);
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let analysis = MarketAnalysisWorker::new(
            self.config.clone(),
            self.provider.clone(),
            self.indicators.clone(),
            self.advisor.clone(),
            self.store.clone(),
            self.signal_engine.clone(),
            self.state.clone(),
            stop_rx.clone(),
        );
        let execution = TradeExecutionWorker::new(
            self.config.clone(),
            self.broker.clone(),
            self.store.clone(),
            self.state.clone(),
            stop_rx,
        );
        *runtime = Some(WorkerSet {
            stop_tx,
            analysis: tokio::spawn(analysis.run()),
            execution: tokio::spawn(execution.run()),
        });

        if let Err(e) = self
            .store
            .record_event(
                "INFO",
                "engine",
                "trading session started",
                Some(user_id),
                Some(&session_id),
            )
            .await
        {
            warn!("failed to record session start: {}", e);
        }
        info!("trading session started: {}", session_id);

        Ok(SessionStarted {
            session_id,
            message: format!(
                "trading session started: {:.2} toward a {:.2} target",
                initial_balance, target_balance
            ),
        })
    }

    /// Raises the stop signal, waits for both workers to exit their current
    /// iteration, then liquidates remaining trades exactly once against the
    /// quiesced state.
    pub async fn stop(&self) -> Result<SessionStopped, SessionError> {
        let mut runtime = self.runtime.lock().await;
        let Some(workers) = runtime.take() else {
            return Err(SessionError::NotActive);
        };

        let _ = workers.stop_tx.send(true);
        let _ = workers.analysis.await;
        let _ = workers.execution.await;

        let pending: Vec<(String, String, f64, f64)> = {
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
                    (t.symbol.clone(), t.trade_id.clone(), t.volume, price)
                })
                .collect()
        };

        let mut closed_trades = Vec::new();
        for (symbol, trade_id, volume, price) in pending {
            if let Err(e) = self
                .broker
                .close_position(&trade_id, &symbol, volume, price)
                .await
            {
                warn!("broker close failed while liquidating {}: {}", trade_id, e);
            }
            let closed = self.state.write().await.commit_close(
                &symbol,
                price,
                CloseReason::SessionClosed,
                self.config.pip.scale,
            );
            if let Some(trade) = closed {
                closed_trades.push(trade);
            }
        }

        let (metrics, session_id, user_id) = {
            let mut state = self.state.write().await;
            if let Some(session) = state.session.as_mut() {
                session.finish();
            }
            let metrics = match state.session.as_ref() {
                Some(session) => {
                    performance::compute(session, state.open_trade_count(), Utc::now())
                }
                None => return Err(SessionError::NotActive),
            };
            state.metrics = metrics.clone();
            let session_id = state.session.as_ref().map(|s| s.session_id.clone());
            let user_id = state.session.as_ref().map(|s| s.user_id.clone());
            (metrics, session_id, user_id)
        };

        for trade in &closed_trades {
            if let Err(e) = self.store.record_trade_close(trade).await {
                warn!("failed to persist liquidation of {}: {}", trade.trade_id, e);
            }
        }
        if let Err(e) = self
            .store
            .record_event(
                "INFO",
                "engine",
                "trading session stopped",
                user_id.as_deref(),
                session_id.as_deref(),
            )
            .await
        {
            warn!("failed to record session stop: {}", e);
        }
        info!(
            "trading session stopped; {} trades force-closed",
            closed_trades.len()
        );

        Ok(SessionStopped {
            message: "trading session stopped".to_string(),
            performance: metrics,
        })
    }

    pub async fn live_data(&self) -> LiveData {
        let state = self.state.read().await;
        LiveData {
            session: state.session.clone(),
            performance: state.metrics.clone(),
            market_overview: state
                .cache
                .values()
                .map(|snap| MarketOverviewEntry {
                    symbol: snap.symbol.clone(),
                    price: snap.quote.close,
                    signal: snap.signal.action,
                    confidence: snap.signal.confidence,
                    trend: snap.advisory.trend.clone(),
                })
                .collect(),
            active_trades: state.trades.values().cloned().collect(),
            signals: state
                .cache
                .values()
                .filter(|snap| snap.signal.action != TradeAction::Hold)
                .map(|snap| SignalSummary {
                    symbol: snap.symbol.clone(),
                    action: snap.signal.action,
                    confidence: snap.signal.confidence,
                    entry_price: snap.signal.entry_price,
                    risk_reward_ratio: snap.signal.risk_reward_ratio,
                })
                .collect(),
            timestamp: Utc::now(),
        }
    }

    pub async fn performance(&self) -> PerformanceMetrics {
        self.state.read().await.metrics.clone()
    }
}
