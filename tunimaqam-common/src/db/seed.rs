//! Corpus seeding from a JSON file
//!
//! The file holds a JSON array of [`NewMaqam`] records. Seeding only happens
//! into an empty table so restarting with the same `--seed-file` is harmless.

use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

use super::maqam::{count_entries, insert_entry, NewMaqam};
use crate::Result;

/// Parse a seed file into records
pub fn read_seed_file(path: &Path) -> Result<Vec<NewMaqam>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Import `records` in one transaction if the corpus is empty
///
/// Returns the number of inserted records (0 when the table already had data).
pub async fn seed_entries(pool: &SqlitePool, records: &[NewMaqam]) -> Result<usize> {
    let existing = count_entries(pool).await?;
    if existing > 0 {
        info!("Corpus already holds {} maqamet, skipping seed", existing);
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for record in records {
        insert_entry(&mut *tx, record).await?;
    }
    tx.commit().await?;

    info!("Seeded corpus with {} maqamet", records.len());
    Ok(records.len())
}

/// Read `path` and seed the corpus from it
pub async fn seed_from_file(pool: &SqlitePool, path: &Path) -> Result<usize> {
    let records = read_seed_file(path)?;
    seed_entries(pool, &records).await
}
