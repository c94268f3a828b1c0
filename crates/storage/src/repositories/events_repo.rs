use chrono::Utc;
use sqlx::SqlitePool;

pub struct EventsRepository;

impl EventsRepository {
    pub async fn insert(
        pool: &SqlitePool,
        level: &str,
        module: &str,
        message: &str,
        user_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
                INSERT INTO system_logs (logged_at, level, module, message, user_id, session_id)
                VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Utc::now())
        .bind(level)
        .bind(module)
        .bind(message)
        .bind(user_id)
        .bind(session_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
