use sqlx::SqlitePool;

use common::models::MarketSnapshot;

pub struct AnalysisRepository;

impl AnalysisRepository {
    pub async fn insert(pool: &SqlitePool, snapshot: &MarketSnapshot) -> Result<(), sqlx::Error> {
        let volatility = if snapshot.quote.close != 0.0 {
            snapshot.indicators.atr / snapshot.quote.close
        } else {
            0.0
        };

        sqlx::query(
            r#"
                INSERT INTO ai_analysis (
                    symbol, observed_at, trend, support_level, resistance_level,
                    volatility, risk_assessment, signal, signal_confidence,
                    risk_reward_ratio
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snapshot.symbol)
        .bind(snapshot.observed_at)
        .bind(&snapshot.advisory.trend)
        .bind(snapshot.advisory.support_level)
        .bind(snapshot.advisory.resistance_level)
        .bind(volatility)
        .bind(&snapshot.advisory.risk_assessment)
        .bind(snapshot.signal.action.as_str())
        .bind(snapshot.signal.confidence)
        .bind(snapshot.signal.risk_reward_ratio)
        .execute(pool)
        .await?;
        Ok(())
    }
}
