//! Note analysis and recommendation endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use tunimaqam_common::analysis::{self, NoteCandidate};
use tunimaqam_common::db::load_all_entries;
use tunimaqam_common::recommend::{self, Recommendation, RecommendationContext};

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub candidates: Vec<NoteCandidate>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
}

/// POST /analysis/notes
///
/// Body: `{"notes": [..], "optional_mood": ".."}`. Strings are used as-is,
/// numbers are stringified, falsy items are dropped.
pub async fn analyze_notes(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<AnalysisResponse>> {
    let body = body.map(|Json(v)| v).unwrap_or(Value::Null);

    let notes = match body.get("notes") {
        Some(Value::Array(items)) if !items.is_empty() => note_tokens(items),
        _ => return Err(ApiError::BadRequest("notes list is required".to_string())),
    };
    let mood = body.get("optional_mood").and_then(Value::as_str);

    let entries = load_all_entries(&state.db).await?;
    let candidates = analysis::analyze_notes(&entries, &notes, mood);

    Ok(Json(AnalysisResponse { candidates }))
}

/// POST /recommendations/maqam
pub async fn recommend_maqam(
    State(state): State<AppState>,
    body: Option<Json<RecommendationContext>>,
) -> ApiResult<Json<RecommendationResponse>> {
    let context = body.map(|Json(c)| c).unwrap_or_default();

    let entries = load_all_entries(&state.db).await?;
    let recommendations = recommend::recommend(&entries, &context);

    Ok(Json(RecommendationResponse { recommendations }))
}

/// Textual note tokens from a JSON list, skipping falsy and structured items
fn note_tokens(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        })
        .collect()
}
