use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{self, SqliteConnectOptions, SqlitePool};

/// Opens (creating if needed) the trading database and applies the schema.
pub async fn connect(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))?
        .create_if_missing(true)
        .journal_mode(sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlite::SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePool::connect_with(options).await?;

    let schema = include_str!("../sql/schema.sql");
    sqlx::query(schema).execute(&pool).await?;
    Ok(pool)
}

/// In-memory database for tests. A single connection: every pooled
/// connection to `:memory:` would otherwise see its own empty database.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    let schema = include_str!("../sql/schema.sql");
    sqlx::query(schema).execute(&pool).await?;
    Ok(pool)
}
