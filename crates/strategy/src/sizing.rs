use common::config::{PipConfig, SizingConfig};

/// Pip monetary value and price-to-pip scale for one instrument. The
/// default model keys off price magnitude only; real deployments supply a
/// per-instrument table instead.
pub trait PipValueModel: Send + Sync {
    fn pip_value(&self, symbol: &str, price: f64) -> f64;
    fn pip_scale(&self, symbol: &str) -> f64;
}

impl PipValueModel for PipConfig {
    fn pip_value(&self, _symbol: &str, price: f64) -> f64 {
        if price < self.price_cutoff {
            self.low_price_value
        } else {
            self.high_price_value
        }
    }

    fn pip_scale(&self, _symbol: &str) -> f64 {
        self.scale
    }
}

/// Lot size from the account risk budget and the stop distance, clamped to
/// the configured lot range and rounded to 2 decimals. A zero stop distance
/// returns the minimum lot.
pub fn size_position(
    balance: f64,
    entry_price: f64,
    stop_loss: f64,
    sizing: &SizingConfig,
    pips: &dyn PipValueModel,
    symbol: &str,
) -> f64 {
    let risk_amount = balance * sizing.risk_fraction;
    let stop_pips = (entry_price - stop_loss).abs() * pips.pip_scale(symbol);
    if stop_pips == 0.0 {
        return sizing.min_lot;
    }

    let lot = risk_amount / (stop_pips * pips.pip_value(symbol, entry_price));
    let lot = lot.clamp(sizing.min_lot, sizing.max_lot);
    (lot * 100.0).round() / 100.0
}
