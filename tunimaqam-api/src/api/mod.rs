//! HTTP API handlers for tunimaqam-api

pub mod analysis;
pub mod auth;
pub mod games;
pub mod health;
pub mod knowledge;
pub mod learning;

pub use analysis::{analyze_notes, recommend_maqam};
pub use auth::auth_middleware;
pub use games::{
    clue_game, clue_game_all, matching_game, odd_one_out, order_notes, order_notes_all,
    start_speed_quiz,
};
pub use health::health_routes;
pub use knowledge::{
    create_maqam, delete_maqam, get_maqam, get_maqam_by_name, list_maqamet, list_regions,
    related_maqamet,
};
pub use learning::{answer_quiz, flashcards, learning_plan, start_quiz};
