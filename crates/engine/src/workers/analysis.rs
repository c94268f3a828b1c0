use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use advisor::{AiAdvisor, fallback_analysis};
use common::config::EngineConfig;
use common::models::MarketSnapshot;
use market_data::MarketDataProvider;
use storage::PersistenceStore;
use strategy::{IndicatorEngine, SignalEngine};

use crate::state::SharedState;
use crate::workers::backoff_or_stop;

/// Periodic loop: per symbol, quote -> indicators -> advisory -> signal,
/// published to the snapshot cache. One bad symbol never aborts a cycle;
/// the previous snapshot simply survives.
pub struct MarketAnalysisWorker {
    config: EngineConfig,
    provider: Arc<dyn MarketDataProvider>,
    indicators: Arc<dyn IndicatorEngine>,
    advisor: Arc<dyn AiAdvisor>,
    store: Arc<dyn PersistenceStore>,
    signal_engine: Arc<SignalEngine>,
    state: SharedState,
    stop_rx: watch::Receiver<bool>,
}

impl MarketAnalysisWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn MarketDataProvider>,
        indicators: Arc<dyn IndicatorEngine>,
        advisor: Arc<dyn AiAdvisor>,
        store: Arc<dyn PersistenceStore>,
        signal_engine: Arc<SignalEngine>,
        state: SharedState,
        stop_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            provider,
            indicators,
            advisor,
            store,
            signal_engine,
            state,
            stop_rx,
        }
    }

    pub async fn run(mut self) {
        info!("market analysis worker started");
        let mut ticker = time::interval(self.config.analysis_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.stop_rx.changed() => break,
                _ = ticker.tick() => {
                    if *self.stop_rx.borrow() {
                        break;
                    }
                    if let Err(e) = self.cycle().await {
                        error!("market analysis cycle failed: {e:#}");
                        if backoff_or_stop(&mut self.stop_rx, self.config.analysis_backoff).await {
                            break;
                        }
                    }
                }
            }
        }
        info!("market analysis worker stopped");
    }

    pub(crate) async fn cycle(&self) -> anyhow::Result<()> {
        for symbol in &self.config.symbols {
            if *self.stop_rx.borrow() {
                break;
            }
            if let Err(e) = self.analyze_symbol(symbol).await {
                warn!("analysis skipped for {}: {}", symbol, e);
            }
        }
        Ok(())
    }

    async fn analyze_symbol(&self, symbol: &str) -> anyhow::Result<()> {
        let quote = self.provider.fetch(symbol).await?;
        let closes = self
            .provider
            .recent_closes(symbol, self.config.history_len)
            .await?;
        let indicators = self.indicators.compute(&closes);

        let advisory = match self.advisor.analyze(symbol, &quote, &indicators).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("advisor unavailable for {}: {}; using fallback", symbol, e);
                fallback_analysis(symbol)
            }
        };

        let balance = {
            let state = self.state.read().await;
            state
                .session
                .as_ref()
                .map(|s| s.current_balance)
                .unwrap_or_default()
        };

        let signal = self
            .signal_engine
            .evaluate(&quote, &indicators, &advisory, balance);

        let snapshot = MarketSnapshot {
            symbol: symbol.to_string(),
            quote,
            indicators,
            advisory,
            signal,
            observed_at: Utc::now(),
        };

        if let Err(e) = self.store.record_analysis(&snapshot).await {
            warn!("failed to persist analysis for {}: {}", symbol, e);
        }

        self.state
            .write()
            .await
            .cache
            .insert(symbol.to_string(), snapshot);
        Ok(())
    }
}
