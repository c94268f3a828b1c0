use chrono::Utc;
use tracing::debug;

use common::config::{BlendWeights, PipConfig, SizingConfig};
use common::models::{AdvisorAnalysis, IndicatorSet, Quote, TradingSignal};

use crate::sizing::size_position;

/// Pure signal computation: blends the advisory confidence with the
/// technical heuristics and attaches risk parameters when the result is
/// actionable.
pub struct SignalEngine {
    blend: BlendWeights,
    min_confidence: f64,
    sizing: SizingConfig,
    pip: PipConfig,
}

impl SignalEngine {
    pub fn new(
        blend: BlendWeights,
        min_confidence: f64,
        sizing: SizingConfig,
        pip: PipConfig,
    ) -> Self {
        Self {
            blend,
            min_confidence,
            sizing,
            pip,
        }
    }

    pub fn evaluate(
        &self,
        quote: &Quote,
        indicators: &IndicatorSet,
        advisory: &AdvisorAnalysis,
        balance: f64,
    ) -> TradingSignal {
        let advisory_confidence = advisory.normalized_confidence();
        let technical = technical_confidence(indicators, quote.close);
        let confidence = (self.blend.advisory * advisory_confidence
            + self.blend.technical * technical)
            .clamp(0.0, 1.0);

        debug!(
            symbol = %quote.symbol,
            advisory = advisory_confidence,
            technical,
            blended = confidence,
            "signal confidence"
        );

        if confidence < self.min_confidence {
            return TradingSignal::hold(&quote.symbol, quote.close, confidence, "low confidence");
        }

        let entry_price = quote.close;
        let stop_loss = advisory.stop_loss.unwrap_or(entry_price * 0.995);
        let take_profit = advisory.take_profit.unwrap_or(entry_price * 1.01);
        let lot_size = size_position(
            balance,
            entry_price,
            stop_loss,
            &self.sizing,
            &self.pip,
            &quote.symbol,
        );

        let risk = (entry_price - stop_loss).abs();
        let reward = (take_profit - entry_price).abs();
        let risk_reward_ratio = if risk > 0.0 { reward / risk } else { 0.0 };

        let rationale = advisory
            .recommendation
            .clone()
            .unwrap_or_else(|| format!("{} advisory", advisory.trend));

        TradingSignal {
            symbol: quote.symbol.clone(),
            action: advisory.signal,
            confidence,
            entry_price,
            stop_loss,
            take_profit,
            lot_size,
            risk_reward_ratio,
            rationale,
            generated_at: Utc::now(),
        }
    }
}

/// Average over three always-evaluated heuristics; an unmatched heuristic
/// contributes 0 to the sum.
pub fn technical_confidence(indicators: &IndicatorSet, close: f64) -> f64 {
    let mut score = 0.0;

    // RSI inside the working band, or an extreme confirmed as a reversal by
    // the MACD histogram.
    if (30.0..=70.0).contains(&indicators.rsi) {
        score += 0.7;
    } else if (indicators.rsi < 30.0 && indicators.macd_histogram > 0.0)
        || (indicators.rsi > 70.0 && indicators.macd_histogram < 0.0)
    {
        score += 0.9;
    }

    // MACD aligned with its signal line and histogram.
    if (indicators.macd > indicators.macd_signal && indicators.macd_histogram > 0.0)
        || (indicators.macd < indicators.macd_signal && indicators.macd_histogram < 0.0)
    {
        score += 0.8;
    }

    // Price at a Bollinger extreme.
    if close <= indicators.bb_lower || close >= indicators.bb_upper {
        score += 0.9;
    }

    score / 3.0
}
