use common::models::IndicatorSet;
use ta::Next;
use ta::indicators::{
    AverageTrueRange, BollingerBands, ExponentialMovingAverage,
    MovingAverageConvergenceDivergence, RelativeStrengthIndex, SimpleMovingAverage,
};

/// Computes the fixed indicator set from a close-price series.
pub trait IndicatorEngine: Send + Sync {
    fn compute(&self, series: &[f64]) -> IndicatorSet;
}

pub struct TaIndicatorEngine {
    /// Series shorter than this fall back to the neutral set.
    min_periods: usize,
}

impl Default for TaIndicatorEngine {
    fn default() -> Self {
        // Slow EMA length; anything shorter has not warmed up MACD.
        Self { min_periods: 26 }
    }
}

impl TaIndicatorEngine {
    pub fn new(min_periods: usize) -> Self {
        Self { min_periods }
    }
}

impl IndicatorEngine for TaIndicatorEngine {
    fn compute(&self, series: &[f64]) -> IndicatorSet {
        let Some(&close) = series.last() else {
            return IndicatorSet::neutral(0.0);
        };
        if series.len() < self.min_periods {
            return IndicatorSet::neutral(close);
        }

        // Fixed standard periods: RSI(14), MACD(12,26,9), BB(20, 2.0),
        // SMA(20), EMA(12)/EMA(26), ATR(14). Constructor args are constant
        // and in range.
        let mut rsi = RelativeStrengthIndex::new(14).unwrap();
        let mut macd = MovingAverageConvergenceDivergence::new(12, 26, 9).unwrap();
        let mut bb = BollingerBands::new(20, 2.0).unwrap();
        let mut sma_20 = SimpleMovingAverage::new(20).unwrap();
        let mut ema_12 = ExponentialMovingAverage::new(12).unwrap();
        let mut ema_26 = ExponentialMovingAverage::new(26).unwrap();
        let mut atr = AverageTrueRange::new(14).unwrap();

        let neutral = IndicatorSet::neutral(close);
        let mut out = neutral.clone();
        for &price in series {
            let macd_out = macd.next(price);
            let bb_out = bb.next(price);
            out = IndicatorSet {
                rsi: rsi.next(price),
                macd: macd_out.macd,
                macd_signal: macd_out.signal,
                macd_histogram: macd_out.histogram,
                bb_upper: bb_out.upper,
                bb_middle: bb_out.average,
                bb_lower: bb_out.lower,
                sma_20: sma_20.next(price),
                ema_12: ema_12.next(price),
                ema_26: ema_26.next(price),
                atr: atr.next(price),
            };
        }

        IndicatorSet {
            rsi: finite_or(out.rsi, neutral.rsi),
            macd: finite_or(out.macd, neutral.macd),
            macd_signal: finite_or(out.macd_signal, neutral.macd_signal),
            macd_histogram: finite_or(out.macd_histogram, neutral.macd_histogram),
            bb_upper: finite_or(out.bb_upper, neutral.bb_upper),
            bb_middle: finite_or(out.bb_middle, neutral.bb_middle),
            bb_lower: finite_or(out.bb_lower, neutral.bb_lower),
            sma_20: finite_or(out.sma_20, neutral.sma_20),
            ema_12: finite_or(out.ema_12, neutral.ema_12),
            ema_26: finite_or(out.ema_26, neutral.ema_26),
            atr: finite_or(out.atr, neutral.atr),
        }
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}
