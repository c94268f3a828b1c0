use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use common::models::{AdvisorAnalysis, IndicatorSet, Quote};

use crate::extract::parse_analysis;
use crate::{AdvisorError, AiAdvisor};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "topP")]
    top_p: f64,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

/// REST client for the generative advisory model. All failure modes
/// (transport, non-200, empty candidates, unparseable payload) collapse to
/// `AdvisorError::Unavailable` so the caller falls back.
pub struct GeminiAdvisor {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiAdvisor {
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = env::var("GEMINI_API_KEY")?;
        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-pro".to_string());
        let base_url = env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            base_url,
            api_key,
            model,
        })
    }

    fn build_prompt(symbol: &str, quote: &Quote, indicators: &IndicatorSet) -> String {
        format!(
            "You are a professional forex trading analyst. Analyze the market data \
             below and give a trading recommendation.\n\
             \n\
             Symbol: {symbol}\n\
             Timeframe: real-time\n\
             \n\
             Market data:\n\
             - Current price: {close}\n\
             - High: {high}\n\
             - Low: {low}\n\
             - Volume: {volume}\n\
             \n\
             Technical indicators:\n\
             - RSI: {rsi}\n\
             - MACD: {macd}\n\
             - Bollinger Bands: Upper={bb_upper}, Middle={bb_middle}, Lower={bb_lower}\n\
             - SMA 20: {sma_20}\n\
             - EMA 12: {ema_12}\n\
             - EMA 26: {ema_26}\n\
             \n\
             Answer with a single JSON object containing exactly these keys:\n\
             trend_analysis (bullish/bearish/neutral), support_level, resistance_level, \
             trading_signal (BUY/SELL/HOLD), confidence_level (0-100), \
             risk_assessment (low/medium/high), expected_profit_range, \
             stop_loss, take_profit, recommendation.",
            symbol = symbol,
            close = quote.close,
            high = quote.high,
            low = quote.low,
            volume = quote.volume,
            rsi = indicators.rsi,
            macd = indicators.macd,
            bb_upper = indicators.bb_upper,
            bb_middle = indicators.bb_middle,
            bb_lower = indicators.bb_lower,
            sma_20 = indicators.sma_20,
            ema_12 = indicators.ema_12,
            ema_26 = indicators.ema_26,
        )
    }
}

#[async_trait]
impl AiAdvisor for GeminiAdvisor {
    async fn analyze(
        &self,
        symbol: &str,
        quote: &Quote,
        indicators: &IndicatorSet,
    ) -> Result<AdvisorAnalysis, AdvisorError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Self::build_prompt(symbol, quote, indicators),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_p: 0.8,
                top_k: 40,
                max_output_tokens: 2048,
            },
        };

        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AdvisorError::Unavailable(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            warn!("advisor returned {}: {}", status, text);
            return Err(AdvisorError::Unavailable(format!("status {}", status)));
        }

        let body: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| AdvisorError::Unavailable(e.to_string()))?;

        let text = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| AdvisorError::Unavailable("empty response".to_string()))?;

        parse_analysis(text)
    }
}
