use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub sma_20: f64,
    pub ema_12: f64,
    pub ema_26: f64,
    pub atr: f64,
}

impl IndicatorSet {
    /// Deterministic values used when the price series is too short to
    /// warm up the real indicators: neutral RSI, flat MACD, bands at
    /// close +/- 2%, averages pinned to the close.
    pub fn neutral(close: f64) -> Self {
        Self {
            rsi: 50.0,
            macd: 0.0,
            macd_signal: 0.0,
            macd_histogram: 0.0,
            bb_upper: close * 1.02,
            bb_middle: close,
            bb_lower: close * 0.98,
            sma_20: close,
            ema_12: close,
            ema_26: close,
            atr: 0.001 * close,
        }
    }
}
