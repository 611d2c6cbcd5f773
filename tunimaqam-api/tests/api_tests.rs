//! Integration tests for tunimaqam-api endpoints
//!
//! Every test builds the router over an in-memory database seeded with the
//! sample corpus in `data/maqamet.json` and drives it with `oneshot`.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::path::Path;
use tower::util::ServiceExt; // for `oneshot` method
use tunimaqam_api::{build_router, AppState};
use tunimaqam_common::auth::{issue_token, Role};
use tunimaqam_common::db::{init_memory_database, resolve_auth_secret, seed_from_file};

const SAMPLE_CORPUS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/maqamet.json");
const SECRET: i64 = 424242;

/// Test helper: In-memory database with the sample corpus
async fn setup_test_db() -> SqlitePool {
    let pool = init_memory_database()
        .await
        .expect("Should create in-memory database");
    let inserted = seed_from_file(&pool, Path::new(SAMPLE_CORPUS))
        .await
        .expect("Should seed sample corpus");
    assert_eq!(inserted, 6);
    pool
}

/// Test helper: App with authorization disabled
async fn setup_app() -> axum::Router {
    build_router(AppState::new(setup_test_db().await, 0))
}

/// Test helper: App checking tokens signed with [`SECRET`]
async fn setup_secured_app() -> axum::Router {
    build_router(AppState::new(setup_test_db().await, SECRET))
}

fn token_for(role: Role) -> String {
    let now_ms = chrono::Utc::now().timestamp_millis();
    issue_token("tester@example.com", role, 600, SECRET, now_ms)
}

/// Test helper: Request without body
fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Request with JSON body
fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_token(mut request: Request<Body>, token: &str) -> Request<Body> {
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {}", token).parse().unwrap(),
    );
    request
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn names(list: &Value, field: &str) -> Vec<String> {
    list.as_array()
        .expect("Should be a list")
        .iter()
        .map(|item| item[field].as_str().unwrap_or_default().to_string())
        .collect()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let app = setup_secured_app().await;

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "tunimaqam-api");
    assert!(body["version"].is_string());
}

// =============================================================================
// Note analysis
// =============================================================================

#[tokio::test]
async fn test_analyze_notes_ranks_first_jins_matches() {
    let app = setup_app().await;

    let request = json_request(
        "POST",
        "/analysis/notes",
        json!({"notes": ["G", "f", "E-half-flat", null, ""]}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let candidates = &body["candidates"];
    assert_eq!(
        names(candidates, "maqam"),
        vec!["Sika", "Al Hsin", "Al Dhail", "Al Iraq", "Al Ardhawi"]
    );
    assert_eq!(candidates[0]["confidence"], 0.85);
    assert_eq!(candidates[1]["confidence"], 0.79);
    assert_eq!(candidates[0]["evidence"], json!(["note_pattern_match"]));
    assert_eq!(
        candidates[0]["matched_notes"],
        json!(["E-HALF-FLAT", "F", "G"])
    );
}

#[tokio::test]
async fn test_analyze_notes_mood_alignment() {
    let app = setup_app().await;

    let request = json_request(
        "POST",
        "/analysis/notes",
        json!({"notes": ["G", "F", "E-half-flat"], "optional_mood": "spiritual"}),
    );
    let response = app.oneshot(request).await.unwrap();
    let body = extract_json(response.into_body()).await;

    // 0.79 + 0.08 lifts Al Hsin above Sika
    let hsin = &body["candidates"][0];
    assert_eq!(hsin["maqam"], "Al Hsin");
    assert_eq!(hsin["confidence"], 0.87);
    assert_eq!(
        hsin["evidence"],
        json!(["note_pattern_match", "emotion_alignment"])
    );
}

#[tokio::test]
async fn test_analyze_notes_requires_list() {
    for body in [json!({}), json!({"notes": []}), json!({"notes": "C D E"})] {
        let app = setup_app().await;
        let response = app
            .oneshot(json_request("POST", "/analysis/notes", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = extract_json(response.into_body()).await;
        assert_eq!(body["error"]["message"], "notes list is required");
    }
}

// =============================================================================
// Recommendations
// =============================================================================

#[tokio::test]
async fn test_recommendations_with_heritage() {
    let app = setup_app().await;

    let request = json_request(
        "POST",
        "/recommendations/maqam",
        json!({"mood": " Joyful ", "event": "wedding", "preserve_heritage": 1}),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let recs = &body["recommendations"];
    assert_eq!(names(recs, "maqam"), vec!["Al Ardhawi", "Al Hsin", "Al Dhail"]);
    assert_eq!(recs[0]["confidence"], 1.0);
    assert_eq!(
        recs[0]["evidence"],
        json!(["emotion_weight", "usage_match", "heritage_boost"])
    );
    assert_eq!(recs[1]["confidence"], 0.3);
    assert_eq!(recs[2]["reason"], "emotion alignment");
}

#[tokio::test]
async fn test_recommendations_without_signal_are_empty() {
    let app = setup_app().await;

    let response = app
        .oneshot(json_request("POST", "/recommendations/maqam", json!({"mood": "  "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["recommendations"], json!([]));
}

// =============================================================================
// Knowledge
// =============================================================================

#[tokio::test]
async fn test_list_maqamet_with_region_filter() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/knowledge/maqam"))
        .await
        .unwrap();
    let all = extract_json(response.into_body()).await;
    assert_eq!(all.as_array().unwrap().len(), 6);
    assert_eq!(all[0]["name"]["en"], "Al Dhail");
    assert_eq!(all[0]["ajnas"][0]["name"]["en"], "Dhail Rast");

    let response = app
        .oneshot(test_request("GET", "/knowledge/maqam?region=SOUTH"))
        .await
        .unwrap();
    let south = extract_json(response.into_body()).await;
    assert_eq!(south.as_array().unwrap().len(), 1);
    assert_eq!(south[0]["name"]["en"], "Al Ardhawi");
}

#[tokio::test]
async fn test_get_maqam_by_id_and_name() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/knowledge/maqam/3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["name"]["en"], "Sika");

    let response = app
        .clone()
        .oneshot(test_request("GET", "/knowledge/maqam/by-name/al%20iraq"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["seasonal_usage"]["en"], json!(["ramadan_evenings"]));

    for uri in ["/knowledge/maqam/999", "/knowledge/maqam/abc", "/knowledge/maqam/by-name/Rast"] {
        let response = app.clone().oneshot(test_request("GET", uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[tokio::test]
async fn test_related_maqamet() {
    let app = setup_app().await;

    let response = app
        .oneshot(test_request("GET", "/knowledge/maqam/Al%20Dhail/related"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["base"]["name"]["en"], "Al Dhail");
    let related: Vec<&str> = body["related"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"]["en"].as_str().unwrap())
        .collect();
    assert_eq!(related, vec!["Al Maya", "Sika", "Al Hsin", "Al Iraq", "Al Ardhawi"]);
}

#[tokio::test]
async fn test_regions_grouping() {
    let app = setup_app().await;

    let response = app
        .oneshot(test_request("GET", "/knowledge/regions"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;

    assert_eq!(names(&body, "region"), vec!["tunis", "sahel", "kairouan", "south"]);
    assert_eq!(body[0]["maqamet"].as_array().unwrap().len(), 5);
    assert!(body[0]["maqamet"][0].get("ajnas").is_none());
}

#[tokio::test]
async fn test_create_and_delete_maqam() {
    let app = setup_app().await;

    let request = json_request(
        "POST",
        "/knowledge/maqam",
        json!({"name_en": "Al Rasd", "name_ar": "الرصد", "regions": ["tunis"]}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = extract_json(response.into_body()).await;
    assert_eq!(created["id"], 7);

    let response = app
        .clone()
        .oneshot(test_request("DELETE", "/knowledge/maqam/7"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(test_request("DELETE", "/knowledge/maqam/7"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Learning
// =============================================================================

#[tokio::test]
async fn test_flashcards() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/learning/flashcards"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["topic"], "emotion");
    assert_eq!(body["level"], "beginner");
    assert_eq!(body["count"], 6);
    assert_eq!(body["cards"][0]["back"], json!(["cheerful"]));

    let response = app
        .clone()
        .oneshot(test_request("GET", "/learning/flashcards?topic=ajnas"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["cards"][0]["back"], "Dhail Rast / Mhayer Iraq Nawa");

    let response = app
        .oneshot(test_request("GET", "/learning/flashcards?topic=colors"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["message"], "invalid topic");
}

#[tokio::test]
async fn test_learning_plan_levels() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/learning/plan"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["level"], "beginner");
    assert_eq!(names(&body["items"], "name_en"), vec!["Sika", "Al Ardhawi"]);
    assert_eq!(body["items"][0]["suggested_activities"][0], "flashcards_emotion");
    assert!(!body["items"][0]["suggested_activities"]
        .as_array()
        .unwrap()
        .contains(&json!("audio_recognition")));

    let response = app
        .oneshot(test_request("GET", "/learning/plan?level=all"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["count"], 6);
    assert_eq!(body["items"][1]["name_en"], "Al Ardhawi");
    assert_eq!(body["items"][2]["name_en"], "Al Dhail");
}

#[tokio::test]
async fn test_quiz_flow() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/learning/quiz/start", json!({"lang": "ar"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let quiz = extract_json(response.into_body()).await;

    // 6 maqamet x 4 facts, capped at 20
    assert_eq!(quiz["count"], 20);
    assert!(quiz["questions"][0].get("answer").is_none());
    let quiz_id = quiz["quiz_id"].as_str().unwrap().to_string();

    let uri = format!("/learning/quiz/{}/answer", quiz_id);
    let response = app
        .clone()
        .oneshot(json_request("POST", &uri, json!({"answers": ["cheerful"]})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result = extract_json(response.into_body()).await;
    assert_eq!(result["quiz_id"], quiz_id.as_str());
    assert_eq!(result["total"], 20);
    assert_eq!(result["details"].as_array().unwrap().len(), 20);
    assert!(result["details"][19]["user_answer"].is_null());
    assert!(result["details"][0]["explanation"]["maqam_en"].is_string());

    let response = app
        .clone()
        .oneshot(json_request("POST", &uri, json!({"answers": "cheerful"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let unknown = format!("/learning/quiz/{}/answer", uuid::Uuid::new_v4());
    let response = app
        .oneshot(json_request("POST", &unknown, json!({"answers": []})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_quiz_on_empty_corpus_fails() {
    let pool = init_memory_database().await.unwrap();
    let app = build_router(AppState::new(pool, 0));

    let response = app
        .oneshot(json_request("POST", "/learning/quiz/start", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// Practice games
// =============================================================================

#[tokio::test]
async fn test_speed_quiz_topics() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/learning/quiz/mcq/start", json!({"topic": "region"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["topic"], "region");
    assert_eq!(body["count"], 6);
    for question in body["questions"].as_array().unwrap() {
        let choices = question["choices"].as_array().unwrap();
        assert_eq!(choices.len(), 4);
        assert!(choices.contains(&question["answer"]));
    }

    // No body: emotion round
    let response = app
        .clone()
        .oneshot(test_request("POST", "/learning/quiz/mcq/start"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["topic"], "emotion");
    assert_eq!(body["count"], 6);

    let response = app
        .oneshot(json_request("POST", "/learning/quiz/mcq/start", json!({"topic": "ajnas"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_matching_board() {
    let app = setup_app().await;

    let response = app
        .oneshot(test_request("GET", "/learning/matching?topic=usage"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;

    assert_eq!(body["left"].as_array().unwrap().len(), 6);
    assert_eq!(body["right"].as_array().unwrap().len(), 6);
    let ardhawi = body["solution"]
        .as_array()
        .unwrap()
        .iter()
        .find(|pair| pair["maqam_id"] == 6)
        .expect("Should pair every maqam");
    assert_eq!(ardhawi["value"], "folk_wedding");
}

#[tokio::test]
async fn test_clue_games() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/learning/clue-game"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert!(body["answer"].is_string());
    assert_eq!(body["clues"].as_array().unwrap().len(), 5);

    let response = app
        .oneshot(test_request("GET", "/learning/clue-game/all"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 6);
    assert_eq!(body["puzzles"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_order_notes_games() {
    let app = setup_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/learning/order-notes?maqam_id=3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["name"], "Sika");
    assert_eq!(
        body["solution"],
        json!(["G", "F", "E-half-flat", "C", "B-half-flat", "A", "G"])
    );
    assert_eq!(body["notes"].as_array().unwrap().len(), 7);

    let response = app
        .clone()
        .oneshot(test_request("GET", "/learning/order-notes?maqam_id=99"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(test_request("GET", "/learning/order-notes/all"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["total"], 6);
}

#[tokio::test]
async fn test_odd_one_out() {
    let app = setup_app().await;

    // First regions: four maqamet start in tunis, Al Hsin and Al Ardhawi in sahel
    let response = app
        .clone()
        .oneshot(test_request("GET", "/learning/odd-one-out?topic=region"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["choices"].as_array().unwrap().len(), 4);
    let odd = body["odd_one_id"].as_i64().unwrap();
    assert!(odd == 4 || odd == 6);

    // Every sample emotion is distinct
    let response = app
        .oneshot(test_request("GET", "/learning/odd-one-out"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_plan_activities_have_routes() {
    let app = setup_app().await;

    let routes = [
        ("GET", "/learning/flashcards"),
        ("POST", "/learning/quiz/start"),
        ("POST", "/learning/quiz/mcq/start"),
        ("GET", "/learning/matching"),
        ("GET", "/learning/clue-game"),
        ("GET", "/learning/order-notes"),
        ("GET", "/learning/odd-one-out?topic=region"),
    ];
    for (method, uri) in routes {
        let response = app.clone().oneshot(test_request(method, uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_games_require_token() {
    let app = setup_secured_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/learning/matching"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = with_token(
        test_request("GET", "/learning/clue-game/all"),
        &token_for(Role::Learner),
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = setup_secured_app().await;

    let response = app
        .clone()
        .oneshot(test_request("GET", "/learning/plan"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = with_token(test_request("GET", "/learning/plan"), "not|a|valid|token");
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = with_token(test_request("GET", "/learning/plan"), &token_for(Role::Learner));
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Public routes stay open
    let response = app
        .oneshot(test_request("GET", "/knowledge/regions"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = setup_secured_app().await;

    let issued_at = chrono::Utc::now().timestamp_millis() - 2 * 3600 * 1000;
    let token = issue_token("late@example.com", Role::Admin, 60, SECRET, issued_at);

    let request = with_token(
        json_request("POST", "/analysis/notes", json!({"notes": ["C"]})),
        &token,
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_curator_routes_check_role() {
    let app = setup_secured_app().await;

    let request = with_token(
        test_request("DELETE", "/knowledge/maqam/1"),
        &token_for(Role::Learner),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(test_request("DELETE", "/knowledge/maqam/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let request = with_token(
        test_request("DELETE", "/knowledge/maqam/1"),
        &token_for(Role::Expert),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Reads on the same path need no token
    let response = app
        .oneshot(test_request("GET", "/knowledge/maqam/2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unconfigured_secret_keeps_curation_locked() {
    let pool = setup_test_db().await;
    let secret = resolve_auth_secret(&pool, None)
        .await
        .expect("Should generate a secret");
    assert_ne!(secret, 0);
    let app = build_router(AppState::new(pool, secret));

    let response = app
        .clone()
        .oneshot(test_request("DELETE", "/knowledge/maqam/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(test_request("GET", "/knowledge/maqam/1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
