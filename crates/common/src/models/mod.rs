pub mod advisory;
pub mod indicators;
pub mod performance;
pub mod quote;
pub mod session;
pub mod signal;
pub mod snapshot;
pub mod trade;

pub use advisory::AdvisorAnalysis;
pub use indicators::IndicatorSet;
pub use performance::PerformanceMetrics;
pub use quote::Quote;
pub use session::{SessionStatus, TradingSession};
pub use signal::{ParseActionError, TradeAction, TradingSignal};
pub use snapshot::MarketSnapshot;
pub use trade::{ActiveTrade, CloseReason, TradeStatus};
