use sqlx::SqlitePool;

use common::models::ActiveTrade;

pub struct TradesRepository;

impl TradesRepository {
    pub async fn insert_open(
        pool: &SqlitePool,
        session_id: &str,
        trade: &ActiveTrade,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
                INSERT INTO trades (
                    trade_id, session_id, symbol, action, volume, entry_price,
                    stop_loss, take_profit, status, open_time
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'open', ?)
            "#,
        )
        .bind(&trade.trade_id)
        .bind(session_id)
        .bind(&trade.symbol)
        .bind(trade.action.as_str())
        .bind(trade.volume)
        .bind(trade.entry_price)
        .bind(trade.stop_loss)
        .bind(trade.take_profit)
        .bind(trade.open_time)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update_close(pool: &SqlitePool, trade: &ActiveTrade) -> Result<(), sqlx::Error> {
        let duration_minutes = trade
            .close_time
            .map(|t| (t - trade.open_time).num_seconds() as f64 / 60.0);

        sqlx::query(
            r#"
                UPDATE trades
                SET exit_price = ?, profit_loss = ?, status = 'closed',
                    close_reason = ?, close_time = ?, duration_minutes = ?
                WHERE trade_id = ?
            "#,
        )
        .bind(trade.exit_price)
        .bind(trade.profit_loss)
        .bind(trade.close_reason.map(|r| r.as_str()))
        .bind(trade.close_time)
        .bind(duration_minutes)
        .bind(&trade.trade_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
