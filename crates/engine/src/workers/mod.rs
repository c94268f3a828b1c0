use std::time::Duration;

use tokio::sync::watch;

pub mod analysis;
pub mod execution;

pub use analysis::MarketAnalysisWorker;
pub use execution::TradeExecutionWorker;

/// Sleeps for the backoff delay unless the stop signal fires first.
/// Returns true when the caller should exit its loop.
pub(crate) async fn backoff_or_stop(stop_rx: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    tokio::select! {
        _ = stop_rx.changed() => true,
        _ = tokio::time::sleep(delay) => *stop_rx.borrow(),
    }
}
