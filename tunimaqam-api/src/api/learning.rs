//! Learning endpoints: flashcards, study plan, quizzes

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use tunimaqam_common::auth::Claims;
use tunimaqam_common::db::load_all_entries;
use tunimaqam_common::learning::{
    self, make_question_bank, Flashcard, FlashcardTopic, PlanItem, Question, Quiz, QuizResult,
};
use uuid::Uuid;

use crate::{ApiError, ApiResult, AppState};

const DEFAULT_LEVEL: &str = "beginner";
const DEFAULT_LANG: &str = "en";

#[derive(Debug, Deserialize)]
pub struct FlashcardQuery {
    pub topic: Option<String>,
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FlashcardResponse {
    pub topic: FlashcardTopic,
    pub level: String,
    pub count: usize,
    pub cards: Vec<Flashcard>,
}

#[derive(Debug, Deserialize)]
pub struct LevelQuery {
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub level: String,
    pub count: usize,
    pub items: Vec<PlanItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StartQuizRequest {
    pub lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartQuizResponse {
    pub quiz_id: Uuid,
    pub count: usize,
    pub questions: Vec<Question>,
}

/// GET /learning/flashcards?topic=&level=
pub async fn flashcards(
    State(state): State<AppState>,
    Query(query): Query<FlashcardQuery>,
) -> ApiResult<Json<FlashcardResponse>> {
    let topic = match query.topic.as_deref() {
        Some(topic) => topic.parse::<FlashcardTopic>()?,
        None => FlashcardTopic::default(),
    };

    let entries = load_all_entries(&state.db).await?;
    let cards = learning::flashcards(&entries, topic);

    Ok(Json(FlashcardResponse {
        topic,
        level: query.level.unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
        count: cards.len(),
        cards,
    }))
}

/// GET /learning/plan?level=
pub async fn learning_plan(
    State(state): State<AppState>,
    Query(query): Query<LevelQuery>,
) -> ApiResult<Json<PlanResponse>> {
    let level = query.level.unwrap_or_else(|| DEFAULT_LEVEL.to_string());

    let entries = load_all_entries(&state.db).await?;
    let items = learning::learning_plan(&entries, &level);

    Ok(Json(PlanResponse {
        level,
        count: items.len(),
        items,
    }))
}

/// POST /learning/quiz/start
pub async fn start_quiz(
    State(state): State<AppState>,
    body: Option<Json<StartQuizRequest>>,
) -> ApiResult<Json<StartQuizResponse>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let lang = request.lang.unwrap_or_else(|| DEFAULT_LANG.to_string());

    let entries = load_all_entries(&state.db).await?;
    if entries.is_empty() {
        return Err(ApiError::Internal("no maqamet in database".to_string()));
    }

    let bank = make_question_bank(&entries, &mut rand::thread_rng());
    if bank.is_empty() {
        return Err(ApiError::Internal("no questions available".to_string()));
    }

    let quiz = Quiz::new(lang, bank);
    let questions = quiz.questions.clone();
    let quiz_id = state.quizzes.insert(quiz).await;
    info!("Started quiz {} with {} questions", quiz_id, questions.len());

    Ok(Json(StartQuizResponse {
        quiz_id,
        count: questions.len(),
        questions,
    }))
}

/// POST /learning/quiz/:quiz_id/answer
///
/// Body: `{"answers": [..]}` in question order.
pub async fn answer_quiz(
    State(state): State<AppState>,
    claims: Option<Extension<Claims>>,
    Path(quiz_id): Path<String>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<QuizResult>> {
    let quiz = match Uuid::parse_str(&quiz_id) {
        Ok(id) => state.quizzes.get(&id).await,
        Err(_) => None,
    }
    .ok_or_else(|| ApiError::NotFound("quiz not found".to_string()))?;

    let answers = match body.as_ref().and_then(|Json(v)| v.get("answers")) {
        Some(Value::Array(answers)) => answers,
        _ => return Err(ApiError::BadRequest("answers list is required".to_string())),
    };

    let result = quiz.grade(answers);
    let who = claims
        .as_deref()
        .map(|c| c.email.as_str())
        .unwrap_or("anonymous");
    info!(
        "Quiz {} graded for {}: {}/{}",
        quiz.id, who, result.correct, result.total
    );

    Ok(Json(result))
}
