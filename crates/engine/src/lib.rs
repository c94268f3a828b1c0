pub mod performance;
pub mod session;
pub mod state;
#[cfg(test)]
mod testutil;
pub mod workers;

pub use session::{SessionError, SessionStarted, SessionStopped, TradingEngine};
pub use state::{LiveData, MarketOverviewEntry, SignalSummary};
