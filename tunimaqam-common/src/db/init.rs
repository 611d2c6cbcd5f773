//! Database initialization
//!
//! Creates the database file on first run and the `maqam` and `settings`
//! tables idempotently.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the database at `db_path` and ensure the schema
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL lets request handlers read while a seed import writes
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database with the schema applied
///
/// The connection is never recycled, otherwise the data would vanish with it.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Create all tables and indexes (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_maqam_table(pool).await?;
    create_settings_table(pool).await
}

async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_maqam_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS maqam (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name_ar TEXT NOT NULL,
            name_en TEXT NOT NULL,
            emotion TEXT,
            emotion_ar TEXT,
            usage TEXT,
            usage_ar TEXT,
            ajnas_json TEXT,
            regions_json TEXT,
            regions_ar_json TEXT,
            description_ar TEXT,
            description_en TEXT,
            related_json TEXT,
            difficulty_index REAL,
            difficulty_label TEXT,
            difficulty_label_ar TEXT,
            emotion_weights_json TEXT,
            historical_periods_json TEXT,
            historical_periods_ar_json TEXT,
            seasonal_usage_json TEXT,
            seasonal_usage_ar_json TEXT,
            rarity_level TEXT,
            rarity_level_ar TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_maqam_name_en ON maqam(name_en COLLATE NOCASE)")
        .execute(pool)
        .await?;

    Ok(())
}
