use std::env;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{error, info};

use common::models::Quote;

use crate::traits::{
    BrokerError, BrokerGateway, MarketDataError, MarketDataProvider, OrderFill, OrderRequest,
};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct CandleResponse {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct CandleListResponse {
    candles: Vec<CandleResponse>,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    order_id: String,
    symbol: String,
    open_price: f64,
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct CloseResponse {
    order_id: String,
    close_price: f64,
}

/// Signed REST client for the Exness-style gateway. Every request carries a
/// millisecond timestamp and an HMAC-SHA256 hex signature over the sorted
/// query string.
#[derive(Clone)]
pub struct ExnessClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl ExnessClient {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = env::var("EXNESS_API_KEY")?;
        let api_secret = env::var("EXNESS_API_SECRET")?;
        let base_url =
            env::var("EXNESS_BASE_URL").unwrap_or_else(|_| "https://api.exness.com".to_string());

        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            base_url,
            api_key,
            api_secret,
        })
    }

    fn sign(&self, query: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(query.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn signed_query(&self, mut params: Vec<(String, String)>) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        params.push(("timestamp".to_string(), timestamp.to_string()));
        params.sort();

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let signature = self.sign(&query);
        format!("{}&signature={}", query, signature)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Result<T, String> {
        let url = format!("{}{}?{}", self.base_url, path, self.signed_query(params));
        let resp = self
            .client
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!("gateway request failed: {} {}", path, text);
            return Err(text);
        }
        resp.json::<T>().await.map_err(|e| e.to_string())
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: Vec<(String, String)>,
    ) -> Result<T, String> {
        let url = format!("{}{}?{}", self.base_url, path, self.signed_query(params));
        let resp = self
            .client
            .post(&url)
            .header("X-API-KEY", &self.api_key)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !resp.status().is_success() {
            let text = resp.text().await.unwrap_or_default();
            error!("gateway order failed: {} {}", path, text);
            return Err(text);
        }
        resp.json::<T>().await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl MarketDataProvider for ExnessClient {
    async fn fetch(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let candle: CandleResponse = self
            .get(
                "/api/v1/market_data",
                vec![
                    ("symbol".to_string(), symbol.to_string()),
                    ("timeframe".to_string(), "M1".to_string()),
                ],
            )
            .await
            .map_err(|e| MarketDataError::unavailable(symbol, e))?;

        Ok(Quote {
            symbol: symbol.to_string(),
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
            timestamp: Utc::now(),
        })
    }

    async fn recent_closes(&self, symbol: &str, len: usize) -> Result<Vec<f64>, MarketDataError> {
        let list: CandleListResponse = self
            .get(
                "/api/v1/candles",
                vec![
                    ("symbol".to_string(), symbol.to_string()),
                    ("timeframe".to_string(), "M1".to_string()),
                    ("limit".to_string(), len.to_string()),
                ],
            )
            .await
            .map_err(|e| MarketDataError::unavailable(symbol, e))?;

        Ok(list.candles.iter().map(|c| c.close).collect())
    }
}

#[async_trait]
impl BrokerGateway for ExnessClient {
    async fn open_position(&self, order: &OrderRequest) -> Result<OrderFill, BrokerError> {
        info!(
            "placing order: {} {} {}",
            order.action, order.volume, order.symbol
        );
        let resp: OrderResponse = self
            .post(
                "/api/v1/orders/open",
                vec![
                    ("symbol".to_string(), order.symbol.clone()),
                    ("type".to_string(), order.action.to_string()),
                    ("volume".to_string(), order.volume.to_string()),
                    ("stop_loss".to_string(), order.stop_loss.to_string()),
                    ("take_profit".to_string(), order.take_profit.to_string()),
                ],
            )
            .await
            .map_err(BrokerError::Transport)?;

        Ok(OrderFill {
            order_id: resp.order_id,
            symbol: resp.symbol,
            price: resp.open_price,
            volume: resp.volume,
            filled_at: Utc::now(),
        })
    }

    async fn close_position(
        &self,
        trade_id: &str,
        symbol: &str,
        volume: f64,
        _price: f64,
    ) -> Result<OrderFill, BrokerError> {
        let resp: CloseResponse = self
            .post(
                "/api/v1/orders/close",
                vec![
                    ("order_id".to_string(), trade_id.to_string()),
                    ("volume".to_string(), volume.to_string()),
                ],
            )
            .await
            .map_err(BrokerError::Transport)?;

        Ok(OrderFill {
            order_id: resp.order_id,
            symbol: symbol.to_string(),
            price: resp.close_price,
            volume,
            filled_at: Utc::now(),
        })
    }
}
