//! Knowledge endpoints: browse the maqam corpus
//!
//! Reads are public. Creating and deleting entries needs an `admin` or
//! `expert` token.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use tunimaqam_common::auth::{authorize, Claims, Role};
use tunimaqam_common::db::{
    delete_entry, find_entry_by_name, get_entry, insert_entry, load_all_entries, NewMaqam,
};
use tunimaqam_common::CorpusEntry;

use crate::{ApiError, ApiResult, AppState};

/// Related maqamet returned per lookup
pub const MAX_RELATED: usize = 5;

const CURATOR_ROLES: [Role; 2] = [Role::Admin, Role::Expert];

#[derive(Debug, Deserialize)]
pub struct RegionQuery {
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegionGroup {
    pub region: String,
    pub maqamet: Vec<Value>,
}

/// Summary view: names, emotion, usage, regions, rarity, difficulty
pub fn basic_record(entry: &CorpusEntry) -> Value {
    json!({
        "id": entry.id,
        "name": {"ar": entry.name_ar, "en": entry.name_en},
        "emotion": {"en": entry.emotion, "ar": entry.emotion_ar},
        "usage": {"en": entry.usage_tags(), "ar": entry.usage_tags_ar()},
        "regions": {"en": entry.regions, "ar": entry.regions_ar},
        "rarity_level": {"en": entry.rarity_level, "ar": entry.rarity_level_ar},
        "difficulty_label": {"en": entry.difficulty_label, "ar": entry.difficulty_label_ar},
    })
}

/// Summary view plus ajnas, descriptions, weights, periods and seasons
pub fn full_record(entry: &CorpusEntry) -> Value {
    let mut record = basic_record(entry);
    if let Value::Object(map) = &mut record {
        map.insert("ajnas".into(), json!(entry.ajnas));
        map.insert(
            "descriptions".into(),
            json!({"ar": entry.description_ar, "en": entry.description_en}),
        );
        map.insert("related".into(), json!(entry.related));
        map.insert("emotion_weights".into(), json!(entry.emotion_weights));
        map.insert(
            "historical_periods".into(),
            json!({"en": entry.historical_periods, "ar": entry.historical_periods_ar}),
        );
        map.insert(
            "seasonal_usage".into(),
            json!({"en": entry.seasonal_usage, "ar": entry.seasonal_usage_ar}),
        );
        map.insert("difficulty_index".into(), json!(entry.difficulty_index));
    }
    record
}

/// GET /knowledge/maqam[?region=]
pub async fn list_maqamet(
    State(state): State<AppState>,
    Query(query): Query<RegionQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    let entries = load_all_entries(&state.db).await?;

    let records = match query.region.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(region) => {
            let region = region.to_lowercase();
            entries
                .iter()
                .filter(|e| e.regions.iter().any(|r| r.to_lowercase() == region))
                .map(full_record)
                .collect()
        }
        None => entries.iter().map(full_record).collect(),
    };

    Ok(Json(records))
}

/// GET /knowledge/maqam/:id
pub async fn get_maqam(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&key)?;
    let entry = get_entry(&state.db, id).await?.ok_or_else(not_found)?;
    Ok(Json(full_record(&entry)))
}

/// GET /knowledge/maqam/by-name/:name_en
pub async fn get_maqam_by_name(
    State(state): State<AppState>,
    Path(name_en): Path<String>,
) -> ApiResult<Json<Value>> {
    let entry = find_entry_by_name(&state.db, &name_en)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(full_record(&entry)))
}

/// GET /knowledge/maqam/:name_en/related
///
/// Other entries score one point for the same primary emotion and one for
/// any shared region. Only positive scores are kept, best first.
pub async fn related_maqamet(
    State(state): State<AppState>,
    Path(name_en): Path<String>,
) -> ApiResult<Json<Value>> {
    let base = find_entry_by_name(&state.db, &name_en)
        .await?
        .ok_or_else(not_found)?;
    let entries = load_all_entries(&state.db).await?;

    let related: Vec<Value> = rank_related(&base, &entries)
        .into_iter()
        .map(full_record)
        .collect();

    Ok(Json(json!({"base": full_record(&base), "related": related})))
}

/// Entries related to `base`, best first, at most [`MAX_RELATED`]
pub fn rank_related<'a>(base: &CorpusEntry, entries: &'a [CorpusEntry]) -> Vec<&'a CorpusEntry> {
    let base_emotion = base.emotion.as_deref().filter(|e| !e.is_empty());

    let mut scored: Vec<(u32, &CorpusEntry)> = entries
        .iter()
        .filter(|e| e.id != base.id)
        .filter_map(|e| {
            let mut score = 0;
            if base_emotion.is_some() && e.emotion.as_deref() == base_emotion {
                score += 1;
            }
            if e.regions.iter().any(|r| base.regions.contains(r)) {
                score += 1;
            }
            (score > 0).then_some((score, e))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(MAX_RELATED).map(|(_, e)| e).collect()
}

/// GET /knowledge/regions
pub async fn list_regions(State(state): State<AppState>) -> ApiResult<Json<Vec<RegionGroup>>> {
    let entries = load_all_entries(&state.db).await?;
    Ok(Json(group_by_region(&entries)))
}

/// Regions in first-appearance order, each with its maqamet
pub fn group_by_region(entries: &[CorpusEntry]) -> Vec<RegionGroup> {
    let mut groups: Vec<RegionGroup> = Vec::new();
    for entry in entries {
        for region in &entry.regions {
            let record = basic_record(entry);
            match groups.iter_mut().find(|g| &g.region == region) {
                Some(group) => group.maqamet.push(record),
                None => groups.push(RegionGroup {
                    region: region.clone(),
                    maqamet: vec![record],
                }),
            }
        }
    }
    groups
}

/// POST /knowledge/maqam (admin, expert)
pub async fn create_maqam(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Json(maqam): Json<NewMaqam>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    require_curator(claims.as_deref())?;

    let id = insert_entry(&state.db, &maqam).await?;
    info!("Created maqam {} ({})", id, maqam.name_en);

    let entry = get_entry(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("maqam {} vanished after insert", id)))?;
    Ok((StatusCode::CREATED, Json(full_record(&entry))))
}

/// DELETE /knowledge/maqam/:id (admin, expert)
pub async fn delete_maqam(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(key): Path<String>,
) -> ApiResult<Json<Value>> {
    require_curator(claims.as_deref())?;

    let id = parse_id(&key)?;
    if !delete_entry(&state.db, id).await? {
        return Err(not_found());
    }
    info!("Deleted maqam {}", id);

    Ok(Json(json!({"result": "deleted"})))
}

/// Claims are absent only when authorization is disabled
fn require_curator(claims: Option<&Claims>) -> ApiResult<()> {
    if let Some(claims) = claims {
        authorize(claims, &CURATOR_ROLES)?;
    }
    Ok(())
}

fn parse_id(key: &str) -> ApiResult<i64> {
    key.parse().map_err(|_| not_found())
}

fn not_found() -> ApiError {
    ApiError::NotFound("Maqam not found".to_string())
}
