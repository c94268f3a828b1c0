use chrono::{DateTime, Utc};

use common::models::{PerformanceMetrics, TradingSession};

/// Recomputes the derived metrics from the session counters and the number
/// of open trades. Pure; called after every execution cycle and on stop.
pub fn compute(
    session: &TradingSession,
    open_trades: usize,
    now: DateTime<Utc>,
) -> PerformanceMetrics {
    let success_rate = if session.trades_count > 0 {
        session.profitable_trades as f64 / session.trades_count as f64 * 100.0
    } else {
        0.0
    };

    let span = session.target_balance - session.initial_balance;
    let progress_percentage = if span != 0.0 {
        (session.current_balance - session.initial_balance) / span * 100.0
    } else {
        0.0
    };

    PerformanceMetrics {
        current_balance: session.current_balance,
        initial_balance: session.initial_balance,
        target_balance: session.target_balance,
        total_trades: session.trades_count,
        profitable_trades: session.profitable_trades,
        success_rate,
        total_profit: session.current_balance - session.initial_balance,
        progress_percentage,
        active_trades: open_trades,
        session_duration_minutes: (now - session.start_time).num_milliseconds() as f64 / 60_000.0,
    }
}
