//! Practice game endpoints
//!
//! Every payload carries its own solution; nothing is stored server-side.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tunimaqam_common::db::{get_entry, load_all_entries};
use tunimaqam_common::games::{
    self, CluePuzzle, GameTopic, MatchingGame, NotesPuzzle, OddOneOut, SpeedQuestion,
};

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TopicParams {
    pub topic: Option<String>,
}

impl TopicParams {
    fn topic(&self) -> ApiResult<GameTopic> {
        match self.topic.as_deref() {
            Some(topic) => Ok(topic.parse::<GameTopic>()?),
            None => Ok(GameTopic::default()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderNotesQuery {
    pub maqam_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct SpeedQuizResponse {
    pub topic: GameTopic,
    pub count: usize,
    pub questions: Vec<SpeedQuestion>,
}

#[derive(Debug, Serialize)]
pub struct PuzzleSet<T> {
    pub puzzles: Vec<T>,
    pub total: usize,
}

impl<T> From<Vec<T>> for PuzzleSet<T> {
    fn from(puzzles: Vec<T>) -> Self {
        Self {
            total: puzzles.len(),
            puzzles,
        }
    }
}

/// POST /learning/quiz/mcq/start
///
/// Body: `{"topic": "emotion" | "region" | "usage"}`, all optional.
pub async fn start_speed_quiz(
    State(state): State<AppState>,
    body: Option<Json<TopicParams>>,
) -> ApiResult<Json<SpeedQuizResponse>> {
    let params = body.map(|Json(p)| p).unwrap_or_default();
    let topic = params.topic()?;

    let entries = load_all_entries(&state.db).await?;
    let questions = games::speed_quiz(&entries, topic, &mut rand::thread_rng());

    Ok(Json(SpeedQuizResponse {
        topic,
        count: questions.len(),
        questions,
    }))
}

/// GET /learning/matching?topic=
pub async fn matching_game(
    State(state): State<AppState>,
    Query(params): Query<TopicParams>,
) -> ApiResult<Json<MatchingGame>> {
    let topic = params.topic()?;

    let entries = load_all_entries(&state.db).await?;
    Ok(Json(games::matching_game(&entries, topic, &mut rand::thread_rng())))
}

/// GET /learning/clue-game
pub async fn clue_game(State(state): State<AppState>) -> ApiResult<Json<CluePuzzle>> {
    let entries = load_all_entries(&state.db).await?;
    Ok(Json(games::clue_game(&entries, &mut rand::thread_rng())?))
}

/// GET /learning/clue-game/all
pub async fn clue_game_all(
    State(state): State<AppState>,
) -> ApiResult<Json<PuzzleSet<CluePuzzle>>> {
    let entries = load_all_entries(&state.db).await?;
    let puzzles = games::clue_game_all(&entries, &mut rand::thread_rng())?;
    Ok(Json(puzzles.into()))
}

/// GET /learning/order-notes?maqam_id=
///
/// Without `maqam_id` a random maqam is used.
pub async fn order_notes(
    State(state): State<AppState>,
    Query(query): Query<OrderNotesQuery>,
) -> ApiResult<Json<NotesPuzzle>> {
    let entries = match query.maqam_id {
        Some(id) => {
            let entry = get_entry(&state.db, id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("maqam {} not found", id)))?;
            vec![entry]
        }
        None => load_all_entries(&state.db).await?,
    };

    Ok(Json(games::order_notes_game(&entries, &mut rand::thread_rng())?))
}

/// GET /learning/order-notes/all
pub async fn order_notes_all(
    State(state): State<AppState>,
) -> ApiResult<Json<PuzzleSet<NotesPuzzle>>> {
    let entries = load_all_entries(&state.db).await?;
    let puzzles = games::order_notes_all(&entries, &mut rand::thread_rng())?;
    Ok(Json(puzzles.into()))
}

/// GET /learning/odd-one-out?topic=
pub async fn odd_one_out(
    State(state): State<AppState>,
    Query(params): Query<TopicParams>,
) -> ApiResult<Json<OddOneOut>> {
    let topic = params.topic()?;

    let entries = load_all_entries(&state.db).await?;
    Ok(Json(games::odd_one_out(&entries, topic, &mut rand::thread_rng())?))
}
