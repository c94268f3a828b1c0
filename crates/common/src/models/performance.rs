use serde::{Deserialize, Serialize};

/// Derived metrics; recomputed from the session and the active-trade set,
/// never mutated independently.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub current_balance: f64,
    pub initial_balance: f64,
    pub target_balance: f64,
    pub total_trades: u32,
    pub profitable_trades: u32,
    pub success_rate: f64,
    pub total_profit: f64,
    pub progress_percentage: f64,
    pub active_trades: usize,
    pub session_duration_minutes: f64,
}
