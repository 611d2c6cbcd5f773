//! Maqam corpus queries
//!
//! Rows are converted to [`CorpusEntry`] right after fetching; the JSON text
//! columns are decoded there, once, never inside the scoring code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, Sqlite, SqlitePool};
use std::collections::BTreeMap;

use crate::corpus::{parse, CorpusEntry, Jins};
use crate::{Error, Result};

const SELECT_COLUMNS: &str = r#"
    SELECT id, name_ar, name_en, emotion, emotion_ar, usage, usage_ar,
           ajnas_json, regions_json, regions_ar_json, description_ar, description_en,
           related_json, difficulty_index, difficulty_label, difficulty_label_ar,
           emotion_weights_json, historical_periods_json, historical_periods_ar_json,
           seasonal_usage_json, seasonal_usage_ar_json, rarity_level, rarity_level_ar,
           created_at
    FROM maqam
"#;

/// Raw `maqam` row
#[derive(Debug, sqlx::FromRow)]
struct MaqamRow {
    id: i64,
    name_ar: String,
    name_en: String,
    emotion: Option<String>,
    emotion_ar: Option<String>,
    usage: Option<String>,
    usage_ar: Option<String>,
    ajnas_json: Option<String>,
    regions_json: Option<String>,
    regions_ar_json: Option<String>,
    description_ar: Option<String>,
    description_en: Option<String>,
    related_json: Option<String>,
    difficulty_index: Option<f64>,
    difficulty_label: Option<String>,
    difficulty_label_ar: Option<String>,
    emotion_weights_json: Option<String>,
    historical_periods_json: Option<String>,
    historical_periods_ar_json: Option<String>,
    seasonal_usage_json: Option<String>,
    seasonal_usage_ar_json: Option<String>,
    rarity_level: Option<String>,
    rarity_level_ar: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl From<MaqamRow> for CorpusEntry {
    fn from(row: MaqamRow) -> Self {
        let id = row.id;
        let column = |raw: &Option<String>, name: &str| parse::parse_column(raw.as_deref(), name, id);

        let ajnas = column(&row.ajnas_json, "ajnas_json");
        let regions = column(&row.regions_json, "regions_json");
        let regions_ar = column(&row.regions_ar_json, "regions_ar_json");
        let related = column(&row.related_json, "related_json");
        let weights = column(&row.emotion_weights_json, "emotion_weights_json");
        let periods = column(&row.historical_periods_json, "historical_periods_json");
        let periods_ar = column(&row.historical_periods_ar_json, "historical_periods_ar_json");
        let seasons = column(&row.seasonal_usage_json, "seasonal_usage_json");
        let seasons_ar = column(&row.seasonal_usage_ar_json, "seasonal_usage_ar_json");

        CorpusEntry {
            id,
            name_en: row.name_en,
            name_ar: row.name_ar,
            emotion: row.emotion,
            emotion_ar: row.emotion_ar,
            emotion_weights: parse::emotion_weights(weights.as_ref()),
            usage: row.usage,
            usage_ar: row.usage_ar,
            regions: parse::string_list(regions.as_ref()),
            regions_ar: parse::string_list(regions_ar.as_ref()),
            historical_periods: parse::string_list(periods.as_ref()),
            historical_periods_ar: parse::string_list(periods_ar.as_ref()),
            seasonal_usage: parse::string_list(seasons.as_ref()),
            seasonal_usage_ar: parse::string_list(seasons_ar.as_ref()),
            rarity_level: row.rarity_level,
            rarity_level_ar: row.rarity_level_ar,
            difficulty_index: row.difficulty_index,
            difficulty_label: row.difficulty_label,
            difficulty_label_ar: row.difficulty_label_ar,
            ajnas: parse::ajnas(ajnas.as_ref()),
            description_en: row.description_en,
            description_ar: row.description_ar,
            related: parse::id_list(related.as_ref()),
            created_at: row.created_at,
        }
    }
}

/// A maqam record to insert (seed files use this shape)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewMaqam {
    pub name_en: String,
    pub name_ar: String,
    pub emotion: Option<String>,
    pub emotion_ar: Option<String>,
    pub usage: Option<String>,
    pub usage_ar: Option<String>,
    pub ajnas: Vec<Jins>,
    pub regions: Vec<String>,
    pub regions_ar: Vec<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub related: Vec<i64>,
    pub difficulty_index: Option<f64>,
    pub difficulty_label: Option<String>,
    pub difficulty_label_ar: Option<String>,
    pub emotion_weights: Option<BTreeMap<String, f64>>,
    pub historical_periods: Vec<String>,
    pub historical_periods_ar: Vec<String>,
    pub seasonal_usage: Vec<String>,
    pub seasonal_usage_ar: Vec<String>,
    pub rarity_level: Option<String>,
    pub rarity_level_ar: Option<String>,
}

/// Full scan of the corpus, ordered by id
pub async fn load_all_entries(pool: &SqlitePool) -> Result<Vec<CorpusEntry>> {
    let rows = sqlx::query_as::<_, MaqamRow>(&format!("{} ORDER BY id", SELECT_COLUMNS))
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(CorpusEntry::from).collect())
}

pub async fn get_entry(pool: &SqlitePool, id: i64) -> Result<Option<CorpusEntry>> {
    let row = sqlx::query_as::<_, MaqamRow>(&format!("{} WHERE id = ?", SELECT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(CorpusEntry::from))
}

/// Case-insensitive lookup by English name; first match by id
pub async fn find_entry_by_name(pool: &SqlitePool, name_en: &str) -> Result<Option<CorpusEntry>> {
    let row = sqlx::query_as::<_, MaqamRow>(&format!(
        "{} WHERE lower(name_en) = lower(?) ORDER BY id LIMIT 1",
        SELECT_COLUMNS
    ))
    .bind(name_en)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(CorpusEntry::from))
}

pub async fn count_entries(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM maqam")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Insert one maqam and return its id
pub async fn insert_entry<'e, E>(executor: E, maqam: &NewMaqam) -> Result<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let name_en = maqam.name_en.trim();
    let name_ar = maqam.name_ar.trim();
    if name_en.is_empty() || name_ar.is_empty() {
        return Err(Error::InvalidInput(
            "name_en and name_ar are required".to_string(),
        ));
    }

    let weights_json = maqam
        .emotion_weights
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let result = sqlx::query(
        r#"
        INSERT INTO maqam (
            name_en, name_ar, emotion, emotion_ar, usage, usage_ar,
            ajnas_json, regions_json, regions_ar_json, description_en, description_ar,
            related_json, difficulty_index, difficulty_label, difficulty_label_ar,
            emotion_weights_json, historical_periods_json, historical_periods_ar_json,
            seasonal_usage_json, seasonal_usage_ar_json, rarity_level, rarity_level_ar,
            created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(name_en)
    .bind(name_ar)
    .bind(&maqam.emotion)
    .bind(&maqam.emotion_ar)
    .bind(&maqam.usage)
    .bind(&maqam.usage_ar)
    .bind(serde_json::to_string(&maqam.ajnas)?)
    .bind(serde_json::to_string(&maqam.regions)?)
    .bind(serde_json::to_string(&maqam.regions_ar)?)
    .bind(&maqam.description_en)
    .bind(&maqam.description_ar)
    .bind(serde_json::to_string(&maqam.related)?)
    .bind(maqam.difficulty_index)
    .bind(&maqam.difficulty_label)
    .bind(&maqam.difficulty_label_ar)
    .bind(weights_json)
    .bind(serde_json::to_string(&maqam.historical_periods)?)
    .bind(serde_json::to_string(&maqam.historical_periods_ar)?)
    .bind(serde_json::to_string(&maqam.seasonal_usage)?)
    .bind(serde_json::to_string(&maqam.seasonal_usage_ar)?)
    .bind(&maqam.rarity_level)
    .bind(&maqam.rarity_level_ar)
    .bind(Utc::now())
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Delete one maqam; returns false when no row had that id
pub async fn delete_entry(pool: &SqlitePool, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM maqam WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
