use std::env;
use std::time::Duration;

/// Symbols traded when no override is supplied. Matches the instruments the
/// simulated feed carries base prices for.
pub const DEFAULT_SYMBOLS: &[&str] = &["EUR/USD", "GBP/USD", "USD/JPY", "XAU/USD", "BTC/USD"];

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub symbols: Vec<String>,
    pub analysis_interval: Duration,
    pub analysis_backoff: Duration,
    pub execution_interval: Duration,
    pub execution_backoff: Duration,
    /// Number of recent closes fed to the indicator engine.
    pub history_len: usize,
    pub min_confidence: f64,
    pub min_risk_reward: f64,
    pub max_concurrent_trades: usize,
    pub blend: BlendWeights,
    pub sizing: SizingConfig,
    pub pip: PipConfig,
    pub default_initial_balance: f64,
    pub default_target_balance: f64,
}

/// Advisory/technical confidence blend. The 0.6/0.4 split is an inherited
/// tuning value, kept configurable rather than derived.
#[derive(Debug, Clone, Copy)]
pub struct BlendWeights {
    pub advisory: f64,
    pub technical: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct SizingConfig {
    pub risk_fraction: f64,
    pub min_lot: f64,
    pub max_lot: f64,
}

/// Pip monetary value and price-to-pip scale. The magnitude cutoff (value 10
/// below 100, else 1) and the flat 10000 scale treat every quote as a
/// 4-decimal FX pair; both are inherited simplifications and must stay
/// swappable per instrument.
#[derive(Debug, Clone, Copy)]
pub struct PipConfig {
    pub low_price_value: f64,
    pub high_price_value: f64,
    pub price_cutoff: f64,
    pub scale: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            advisory: 0.6,
            technical: 0.4,
        }
    }
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            risk_fraction: 0.02,
            min_lot: 0.01,
            max_lot: 1.0,
        }
    }
}

impl Default for PipConfig {
    fn default() -> Self {
        Self {
            low_price_value: 10.0,
            high_price_value: 1.0,
            price_cutoff: 100.0,
            scale: 10_000.0,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            analysis_interval: Duration::from_secs(5),
            analysis_backoff: Duration::from_secs(10),
            execution_interval: Duration::from_secs(3),
            execution_backoff: Duration::from_secs(5),
            history_len: 50,
            min_confidence: 0.85,
            min_risk_reward: 1.5,
            max_concurrent_trades: 3,
            blend: BlendWeights::default(),
            sizing: SizingConfig::default(),
            pip: PipConfig::default(),
            default_initial_balance: 5.0,
            default_target_balance: 7.0,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by environment variables where present.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(raw) = env::var("TRADING_SYMBOLS") {
            let symbols: Vec<String> = raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !symbols.is_empty() {
                cfg.symbols = symbols;
            }
        }

        if let Some(secs) = env_f64("ANALYSIS_INTERVAL_SECS") {
            cfg.analysis_interval = Duration::from_secs_f64(secs);
        }
        if let Some(secs) = env_f64("EXECUTION_INTERVAL_SECS") {
            cfg.execution_interval = Duration::from_secs_f64(secs);
        }
        if let Some(v) = env_f64("MIN_CONFIDENCE") {
            cfg.min_confidence = v;
        }
        if let Some(v) = env_f64("MIN_RISK_REWARD") {
            cfg.min_risk_reward = v;
        }
        if let Some(v) = env_f64("MAX_CONCURRENT_TRADES") {
            cfg.max_concurrent_trades = v as usize;
        }
        if let Some(v) = env_f64("RISK_PER_TRADE") {
            cfg.sizing.risk_fraction = v;
        }
        if let Some(v) = env_f64("INITIAL_BALANCE") {
            cfg.default_initial_balance = v;
        }
        if let Some(v) = env_f64("TARGET_BALANCE") {
            cfg.default_target_balance = v;
        }

        cfg
    }
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_parameters() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.min_confidence, 0.85);
        assert_eq!(cfg.min_risk_reward, 1.5);
        assert_eq!(cfg.max_concurrent_trades, 3);
        assert_eq!(cfg.sizing.risk_fraction, 0.02);
        assert_eq!(cfg.pip.scale, 10_000.0);
        assert_eq!(cfg.analysis_interval, Duration::from_secs(5));
        assert_eq!(cfg.execution_interval, Duration::from_secs(3));
    }

    #[test]
    fn blend_weights_sum_to_one() {
        let blend = BlendWeights::default();
        assert!((blend.advisory + blend.technical - 1.0).abs() < f64::EPSILON);
    }
}
