use serde::{Deserialize, Serialize};

use super::signal::TradeAction;

/// Structured market analysis returned by the advisory service. Field
/// aliases match the keys the upstream model emits in its JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorAnalysis {
    #[serde(alias = "trend_analysis")]
    pub trend: String,
    #[serde(default)]
    pub support_level: f64,
    #[serde(default)]
    pub resistance_level: f64,
    #[serde(alias = "trading_signal")]
    pub signal: TradeAction,
    /// Percentage scale, 0-100.
    pub confidence_level: f64,
    #[serde(default)]
    pub risk_assessment: String,
    #[serde(default)]
    pub expected_profit_range: Option<String>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

impl AdvisorAnalysis {
    /// Confidence normalized from the 0-100 scale to [0, 1].
    pub fn normalized_confidence(&self) -> f64 {
        (self.confidence_level / 100.0).clamp(0.0, 1.0)
    }
}
