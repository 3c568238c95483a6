use std::time::Duration;

use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Sqlite, SqlitePool};
use tracing::{info, warn};

use crate::config::DatabaseConfig;

/// Opens the pool described by `cfg`, creating the SQLite file if needed.
///
/// Connection failures are retried `cfg.connect_attempts` times, sleeping
/// `attempt` seconds after each failed try, before giving up.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let mut attempt = 1;
    loop {
        match try_connect(cfg).await {
            Ok(pool) => return Ok(pool),
            Err(e) if attempt < cfg.connect_attempts => {
                warn!("Attempt {}: Failed to connect to database: {}", attempt, e);
                tokio::time::sleep(Duration::from_secs(attempt as u64)).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed to connect to database after {} attempts: {}",
                    attempt,
                    e
                ))
            }
        }
    }
}

async fn try_connect(cfg: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let url = &cfg.url;
    if !url.contains(":memory:") && !Sqlite::database_exists(url).await.unwrap_or(false) {
        info!("Creating SQLite database at {}", url);
        Sqlite::create_database(url).await?;
    }
    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .max_lifetime(Duration::from_secs(cfg.max_lifetime_secs))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA busy_timeout=10000;").execute(&mut *conn).await?;
                Ok::<_, sqlx::Error>(())
            })
        })
        .connect(url)
        .await?;
    sqlx::query("SELECT 1").fetch_one(&pool).await?;
    Ok(pool)
}

pub async fn init_db(pool: &SqlitePool) -> anyhow::Result<()> {
    if let Err(e) = sqlx::query("PRAGMA journal_mode=WAL;").execute(pool).await {
        tracing::warn!("Failed to set WAL journal mode: {}", e);
    }

    // One row per (user, asset); asset ids are unique across the store.
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS assets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            asset_id TEXT NOT NULL UNIQUE,
            type TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            data TEXT NULL,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now'))
        )"#,
    )
    .execute(pool)
    .await?;

    let indexes = [
        ("idx_assets_user", "CREATE INDEX IF NOT EXISTS idx_assets_user ON assets(user_id, id)"),
        ("idx_assets_user_type", "CREATE INDEX IF NOT EXISTS idx_assets_user_type ON assets(user_id, type, id)"),
    ];
    for (name, query) in indexes {
        if let Err(e) = sqlx::query(query).execute(pool).await {
            tracing::warn!("Failed to create index {}: {}", name, e);
        }
    }

    Ok(())
}
