//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for the disk inventory.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and create tables.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create tables and indexes if they don't exist.
async fn create_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            revision_id INTEGER NOT NULL DEFAULT 0,
            generated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        INSERT OR IGNORE INTO meta (id, revision_id, generated_at)
        VALUES (1, 0, datetime('now'));
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS disks (
            id TEXT PRIMARY KEY,
            internal_code TEXT NOT NULL DEFAULT '',
            host_id TEXT NOT NULL DEFAULT '',
            disk_type TEXT NOT NULL DEFAULT '',
            capacity REAL NOT NULL DEFAULT 0,
            brand TEXT NOT NULL DEFAULT '',
            serial TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL DEFAULT '',
            purchase_date TEXT NOT NULL DEFAULT '',
            install_date TEXT NOT NULL DEFAULT '',
            observations TEXT NOT NULL DEFAULT ''
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_disks_purchase_date ON disks(purchase_date);
        CREATE INDEX IF NOT EXISTS idx_disks_serial ON disks(serial);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
