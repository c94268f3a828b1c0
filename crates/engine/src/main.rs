use std::env;
use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{info, warn};

use advisor::{AiAdvisor, GeminiAdvisor, StaticAdvisor};
use common::config::EngineConfig;
use common::logger;
use engine::TradingEngine;
use market_data::{BrokerGateway, MarketDataProvider, SimulatedBroker, SimulatedFeed};
use market_data::remote::ExnessClient;
use storage::{PersistenceStore, SqliteStore};
use strategy::{IndicatorEngine, TaIndicatorEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger();
    dotenv().ok();

    let config = EngineConfig::from_env();
    info!(
        "engine configured for {} symbols, analysis every {:?}",
        config.symbols.len(),
        config.analysis_interval
    );

    let db_path = env::var("TRADING_DB_PATH").unwrap_or_else(|_| "data/trading.db".to_string());
    let pool = storage::db::connect(&db_path).await?;
    let store: Arc<dyn PersistenceStore> = Arc::new(SqliteStore::new(pool));

    // A configured gateway account routes data and orders through the
    // signed REST client; otherwise both sides are simulated.
    let (provider, broker): (Arc<dyn MarketDataProvider>, Arc<dyn BrokerGateway>) =
        match ExnessClient::from_env() {
            Ok(client) => {
                info!("using the signed gateway client for quotes and orders");
                (Arc::new(client.clone()), Arc::new(client))
            }
            Err(_) => {
                info!("no gateway credentials; using the simulated feed and broker");
                (
                    Arc::new(SimulatedFeed::default()),
                    Arc::new(SimulatedBroker),
                )
            }
        };

    let advisor: Arc<dyn AiAdvisor> = match GeminiAdvisor::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!("advisor not configured ({e}); falling back to the static analysis");
            Arc::new(StaticAdvisor)
        }
    };

    let indicators: Arc<dyn IndicatorEngine> = Arc::new(TaIndicatorEngine::default());

    let initial_balance = config.default_initial_balance;
    let target_balance = config.default_target_balance;
    let engine = TradingEngine::new(config, provider, indicators, advisor, broker, store);

    let user = env::var("TRADING_USER").unwrap_or_else(|_| "local".to_string());
    let started = engine.start(&user, initial_balance, target_balance).await?;
    info!("{} ({})", started.message, started.session_id);

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    let stopped = engine.stop().await?;
    info!(
        "final: balance {:.2}, profit {:.2}, {} trades, success rate {:.1}%",
        stopped.performance.current_balance,
        stopped.performance.total_profit,
        stopped.performance.total_trades,
        stopped.performance.success_rate
    );
    Ok(())
}
