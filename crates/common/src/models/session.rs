use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    Stopped,
}

/// One bounded run of the engine. At most one session is `Running` per
/// controller; status only ever moves `Running -> Stopped`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSession {
    pub session_id: String,
    pub user_id: String,
    pub initial_balance: f64,
    pub target_balance: f64,
    pub current_balance: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub trades_count: u32,
    pub profitable_trades: u32,
}

impl TradingSession {
    pub fn start(user_id: &str, initial_balance: f64, target_balance: f64) -> Self {
        let now = Utc::now();
        Self {
            session_id: format!("SESSION_{}_{}", user_id, now.format("%Y%m%d_%H%M%S")),
            user_id: user_id.to_string(),
            initial_balance,
            target_balance,
            current_balance: initial_balance,
            start_time: now,
            end_time: None,
            status: SessionStatus::Running,
            trades_count: 0,
            profitable_trades: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn finish(&mut self) {
        self.status = SessionStatus::Stopped;
        self.end_time = Some(Utc::now());
    }
}
