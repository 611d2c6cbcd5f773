//! Key/value settings stored next to the corpus
//!
//! The only key so far is the token signing secret. It is generated on first
//! start when neither the command line, the environment nor the config file
//! sets one, so a fresh deployment never runs with authorization switched off.

use crate::{Error, Result};
use rand::Rng;
use sqlx::SqlitePool;
use tracing::info;

/// Settings key holding the token signing secret
pub const AUTH_SECRET_KEY: &str = "auth_secret";

pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value)
}

pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
    Ok(())
}

/// Stored signing secret, generating and storing one when absent
///
/// A stored `0` is honored: it disables authorization.
pub async fn load_auth_secret(pool: &SqlitePool) -> Result<i64> {
    match get_setting(pool, AUTH_SECRET_KEY).await? {
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|e| Error::Config(format!("stored {} is not an i64: {}", AUTH_SECRET_KEY, e))),
        None => initialize_auth_secret(pool).await,
    }
}

/// Generate a random non-zero secret and store it
pub async fn initialize_auth_secret(pool: &SqlitePool) -> Result<i64> {
    let mut rng = rand::thread_rng();
    let secret: i64 = loop {
        let value = rng.gen::<i64>();
        if value != 0 {
            break value;
        }
    };

    set_setting(pool, AUTH_SECRET_KEY, &secret.to_string()).await?;
    info!("Generated a new token signing secret");
    Ok(secret)
}

/// Secret the service signs with: the configured one, else the stored one
pub async fn resolve_auth_secret(pool: &SqlitePool, configured: Option<i64>) -> Result<i64> {
    match configured {
        Some(secret) => Ok(secret),
        None => load_auth_secret(pool).await,
    }
}
