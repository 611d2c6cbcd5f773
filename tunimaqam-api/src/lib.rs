//! tunimaqam-api library - HTTP surface of the maqam content service
//!
//! Public routes: health, knowledge browsing, flashcards.
//! Curator routes (admin or expert token): creating and deleting maqamet.
//! Protected routes (bearer token, any role): note analysis, recommendations,
//! learning plan, quizzes and practice games.

use axum::Router;
use sqlx::SqlitePool;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tunimaqam_common::learning::QuizStore;

pub mod api;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Corpus database
    pub db: SqlitePool,
    /// Token signing secret; 0 disables authorization
    pub auth_secret: i64,
    /// Quizzes started by clients, keyed by quiz id
    pub quizzes: QuizStore,
    pub startup_time: Instant,
}

impl AppState {
    pub fn new(db: SqlitePool, auth_secret: i64) -> Self {
        Self {
            db,
            auth_secret,
            quizzes: QuizStore::new(),
            startup_time: Instant::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post};

    let auth = middleware::from_fn_with_state(state.clone(), api::auth_middleware);

    // Protected routes (any authenticated role)
    let protected = Router::new()
        .route("/analysis/notes", post(api::analyze_notes))
        .route("/recommendations/maqam", post(api::recommend_maqam))
        .route("/learning/plan", get(api::learning_plan))
        .route("/learning/quiz/start", post(api::start_quiz))
        .route("/learning/quiz/:quiz_id/answer", post(api::answer_quiz))
        .route("/learning/quiz/mcq/start", post(api::start_speed_quiz))
        .route("/learning/matching", get(api::matching_game))
        .route("/learning/clue-game", get(api::clue_game))
        .route("/learning/clue-game/all", get(api::clue_game_all))
        .route("/learning/order-notes", get(api::order_notes))
        .route("/learning/order-notes/all", get(api::order_notes_all))
        .route("/learning/odd-one-out", get(api::odd_one_out))
        .layer(auth.clone());

    // Knowledge reads are public; writes share the path and need a curator token
    let knowledge = Router::new()
        .route(
            "/knowledge/maqam",
            get(api::list_maqamet).merge(post(api::create_maqam).route_layer(auth.clone())),
        )
        .route(
            "/knowledge/maqam/:key",
            get(api::get_maqam).merge(delete(api::delete_maqam).route_layer(auth)),
        )
        .route("/knowledge/maqam/by-name/:name_en", get(api::get_maqam_by_name))
        .route("/knowledge/maqam/:key/related", get(api::related_maqamet))
        .route("/knowledge/regions", get(api::list_regions));

    // Public routes (no authentication)
    let public = Router::new()
        .merge(api::health_routes())
        .route("/learning/flashcards", get(api::flashcards));

    Router::new()
        .merge(protected)
        .merge(knowledge)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
