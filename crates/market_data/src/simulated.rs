use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tracing::info;
use uuid::Uuid;

use common::models::Quote;

use crate::traits::{
    BrokerError, BrokerGateway, MarketDataError, MarketDataProvider, OrderFill, OrderRequest,
};

/// Random-walk quote source around fixed per-symbol base prices. Unknown
/// symbols walk around 1.0.
pub struct SimulatedFeed {
    base_prices: HashMap<String, f64>,
}

impl Default for SimulatedFeed {
    fn default() -> Self {
        let base_prices = [
            ("EUR/USD", 1.0950),
            ("GBP/USD", 1.2750),
            ("USD/JPY", 148.50),
            ("XAU/USD", 1980.00),
            ("BTC/USD", 42000.00),
        ]
        .into_iter()
        .map(|(s, p)| (s.to_string(), p))
        .collect();
        Self { base_prices }
    }
}

impl SimulatedFeed {
    pub fn new(base_prices: HashMap<String, f64>) -> Self {
        Self { base_prices }
    }

    fn base_price(&self, symbol: &str) -> f64 {
        self.base_prices.get(symbol).copied().unwrap_or(1.0)
    }
}

#[async_trait]
impl MarketDataProvider for SimulatedFeed {
    async fn fetch(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let base = self.base_price(symbol);
        let mut rng = rand::thread_rng();
        let variation: f64 = rng.gen_range(-0.001..0.001);

        Ok(Quote {
            symbol: symbol.to_string(),
            open: base,
            high: base * (1.0 + variation.abs() + 0.0005),
            low: base * (1.0 - variation.abs() - 0.0005),
            close: base * (1.0 + variation),
            volume: rng.gen_range(1_000..10_000) as f64,
            timestamp: Utc::now(),
        })
    }

    async fn recent_closes(&self, symbol: &str, len: usize) -> Result<Vec<f64>, MarketDataError> {
        let base = self.base_price(symbol);
        let mut rng = rand::thread_rng();
        Ok((0..len)
            .map(|_| base * (1.0 + rng.gen_range(-0.001..0.001)))
            .collect())
    }
}

/// Fills every order instantly at the requested price.
#[derive(Default)]
pub struct SimulatedBroker;

#[async_trait]
impl BrokerGateway for SimulatedBroker {
    async fn open_position(&self, order: &OrderRequest) -> Result<OrderFill, BrokerError> {
        info!(
            "simulated fill: {} {} {} @ {}",
            order.action, order.volume, order.symbol, order.price
        );
        Ok(OrderFill {
            order_id: format!("ORDER_{}", Uuid::new_v4().simple()),
            symbol: order.symbol.clone(),
            price: order.price,
            volume: order.volume,
            filled_at: Utc::now(),
        })
    }

    async fn close_position(
        &self,
        trade_id: &str,
        symbol: &str,
        volume: f64,
        price: f64,
    ) -> Result<OrderFill, BrokerError> {
        info!("simulated close: {} {} @ {}", trade_id, symbol, price);
        Ok(OrderFill {
            order_id: trade_id.to_string(),
            symbol: symbol.to_string(),
            price,
            volume,
            filled_at: Utc::now(),
        })
    }
}
