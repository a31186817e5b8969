use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

use spellbrew_algo::StrategyKind;
use spellbrew_backend::config::SchedulingSettings;

mod common;

use common::{get, json_body, post_json, send, USER};

#[tokio::test]
async fn test_health_root() {
    let app = common::create_test_app().await;

    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["words"], 50);
}

#[tokio::test]
async fn test_health_live() {
    let app = common::create_test_app().await;
    let response = send(&app, get("/health/live", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = common::create_test_app().await;
    let response = send(&app, get("/api/nope", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_unauthorized_without_user_header() {
    let app = common::create_test_app().await;

    let response = send(&app, get("/api/words/user", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["code"], "UNAUTHORIZED");
}

// ==================== Words ====================

#[tokio::test]
async fn test_random_words_anonymous() {
    let app = common::create_test_app().await;

    let response = send(&app, get("/api/words?count=5", None)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["data"]["words"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["totalAvailable"], 50);
}

#[tokio::test]
async fn test_random_words_reports_corpus_size() {
    let app = common::create_test_app_with(12, SchedulingSettings::default()).await;

    let body = json_body(send(&app, get("/api/words?count=3", None)).await).await;
    assert_eq!(body["data"]["details"].as_array().unwrap().len(), 3);
    assert_eq!(body["data"]["totalAvailable"], 12);

    let body = json_body(send(&app, get("/api/words?count=200", None)).await).await;
    assert_eq!(body["data"]["words"].as_array().unwrap().len(), 12);
    assert_eq!(body["data"]["totalAvailable"], 12);
}

#[tokio::test]
async fn test_non_positive_count_rejected() {
    let app = common::create_test_app().await;

    for uri in ["/api/words/user?count=0", "/api/words/user?count=-2", "/api/words?count=abc"] {
        let response = send(&app, get(uri, Some(USER))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let body = json_body(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_cold_start_session_batch() {
    let app = common::create_test_app().await;

    let response = send(&app, get("/api/words/user?count=5", Some(USER))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let data = &body["data"];
    assert_eq!(data["strategy"], "review_due");
    assert_eq!(data["introduced"], 5);

    let words = data["words"].as_array().unwrap();
    let ids: Vec<i64> = words.iter().map(|w| w["word"]["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    assert!(words.iter().all(|w| w["isNew"] == true));
    assert!(words.iter().all(|w| w["displayTimeMs"] == 3000));
}

#[tokio::test]
async fn test_default_session_size_is_twenty() {
    let app = common::create_test_app().await;
    let body = json_body(send(&app, get("/api/words/user", Some(USER))).await).await;
    assert_eq!(body["data"]["words"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_priority_strategy_batch_has_no_duplicates() {
    let settings = SchedulingSettings {
        strategy: StrategyKind::PriorityScore,
        ..Default::default()
    };
    let app = common::create_test_app_with(40, settings).await;

    let body = json_body(send(&app, get("/api/words/user?count=15", Some(USER))).await).await;
    let words = body["data"]["words"].as_array().unwrap();
    assert_eq!(words.len(), 15);

    let mut ids: Vec<i64> = words.iter().map(|w| w["word"]["id"].as_i64().unwrap()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 15);
    assert!(words.iter().all(|w| w["priority"]["score"].is_number()));
}

// ==================== Progress ====================

#[tokio::test]
async fn test_batch_outcomes_update_progress() {
    let app = common::create_test_app().await;
    send(&app, get("/api/words/user?count=3", Some(USER))).await;

    let response = send(
        &app,
        post_json(
            "/api/progress/batch",
            Some(USER),
            json!({ "results": [
                { "hebrew": "מילה1", "correct": true },
                { "hebrew": "מילה2", "correct": false },
                { "hebrew": "unknown", "correct": true },
                { "hebrew": "מילה40", "correct": true }
            ]}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let data = &body["data"];
    assert_eq!(data["updated"], 2);

    let results = data["results"].as_array().unwrap();
    assert_eq!(results[0]["status"], "updated");
    assert_eq!(results[0]["rating"], "easy");
    assert_eq!(results[1]["rating"], "again");
    assert_eq!(results[2]["status"], "not_found");
    assert_eq!(results[3]["status"], "not_found");

    let stability = results[0]["progress"]["stability"].as_f64().unwrap();
    assert!((stability - 0.13).abs() < 1e-9);
}

#[tokio::test]
async fn test_empty_batch_rejected() {
    let app = common::create_test_app().await;
    let response = send(
        &app,
        post_json("/api/progress/batch", Some(USER), json!({ "results": [] })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_batch_rejected() {
    let app = common::create_test_app().await;
    let response = send(
        &app,
        post_json("/api/progress/batch", Some(USER), json!({ "outcomes": 3 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_progress_list_sort_and_filter() {
    let app = common::create_test_app().await;
    send(&app, get("/api/words/user?count=4", Some(USER))).await;
    send(
        &app,
        post_json(
            "/api/progress/batch",
            Some(USER),
            json!({ "results": [{ "hebrew": "מילה3", "correct": true }] }),
        ),
    )
    .await;

    let body = json_body(
        send(
            &app,
            get("/api/progress/list?sortBy=stability&sortDir=desc", Some(USER)),
        )
        .await,
    )
    .await;
    let rows = body["data"]["progress"].as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["hebrew"], "מילה3");
    assert_eq!(rows[0]["learningStatus"], "learning");
    assert!(rows[0]["progressPercentage"].is_number());

    let body = json_body(
        send(&app, get("/api/progress/list?progress=mastered", Some(USER))).await,
    )
    .await;
    assert!(body["data"]["progress"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_progress_snapshot() {
    let app = common::create_test_app().await;
    send(&app, get("/api/words/user?count=6", Some(USER))).await;

    let body = json_body(send(&app, get("/api/progress", Some(USER))).await).await;
    let data = &body["data"];
    assert_eq!(data["summary"]["totalWords"], 6);
    assert_eq!(data["summary"]["learningWords"], 6);
    assert_eq!(data["learning"]["byStage"]["new"], 6);
    assert_eq!(data["words"].as_array().unwrap().len(), 6);
}

// ==================== Lifecycle ====================

#[tokio::test]
async fn test_auto_manage_first_time_user() {
    let app = common::create_test_app().await;

    let response = send(
        &app,
        post_json("/api/progress/auto-manage", Some(USER), json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let data = &body["data"];
    assert_eq!(data["action"], "added_words");
    assert_eq!(data["reason"], "first time user");
    assert_eq!(data["countToAdd"], 20);
    assert_eq!(data["wordsAdded"], 20);
    assert_eq!(data["stats"]["totalWords"], 0);
    assert!(data["daysSinceLastWord"].is_null());

    let body = json_body(
        send(
            &app,
            post_json("/api/progress/auto-manage", Some(USER), json!({})),
        )
        .await,
    )
    .await;
    assert_eq!(body["data"]["action"], "no_action_needed");
    assert!(body["data"]["reason"].is_null());
}

#[tokio::test]
async fn test_auto_manage_small_corpus() {
    let app = common::create_test_app_with(5, SchedulingSettings::default()).await;
    let body = json_body(
        send(
            &app,
            post_json("/api/progress/auto-manage", Some(USER), json!({})),
        )
        .await,
    )
    .await;
    assert_eq!(body["data"]["countToAdd"], 20);
    assert_eq!(body["data"]["wordsAdded"], 5);
}

#[tokio::test]
async fn test_ensure_minimum_active() {
    let app = common::create_test_app().await;

    let body = json_body(
        send(
            &app,
            post_json("/api/progress/ensure", Some(USER), json!({ "min": 8 })),
        )
        .await,
    )
    .await;
    assert_eq!(body["data"]["added"], 8);
    assert_eq!(body["data"]["activeAfter"], 8);

    let body = json_body(
        send(
            &app,
            post_json("/api/progress/ensure", Some(USER), json!({ "min": 8 })),
        )
        .await,
    )
    .await;
    assert_eq!(body["data"]["added"], 0);
}

#[tokio::test]
async fn test_ensure_defaults_to_twenty() {
    let app = common::create_test_app().await;
    let body = json_body(
        send(&app, post_json("/api/progress/ensure", Some(USER), json!({}))).await,
    )
    .await;
    assert_eq!(body["data"]["minimum"], 20);
    assert_eq!(body["data"]["added"], 20);
}

#[tokio::test]
async fn test_ensure_without_body_uses_default() {
    let app = common::create_test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/progress/ensure")
        .header("x-user-id", USER)
        .body(Body::empty())
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["minimum"], 20);
    assert_eq!(body["data"]["added"], 20);
}

#[tokio::test]
async fn test_ensure_rejects_malformed_body() {
    let app = common::create_test_app().await;

    let response = send(
        &app,
        post_json("/api/progress/ensure", Some(USER), json!({ "min": "abc" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "BAD_REQUEST");

    let request = Request::builder()
        .method("POST")
        .uri("/api/progress/ensure")
        .header("x-user-id", USER)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    assert_eq!(send(&app, request).await.status(), StatusCode::BAD_REQUEST);

    // nothing was introduced by the rejected calls
    let body = json_body(send(&app, get("/api/progress", Some(USER))).await).await;
    assert_eq!(body["data"]["summary"]["totalWords"], 0);
}

#[tokio::test]
async fn test_users_are_isolated() {
    let app = common::create_test_app().await;
    send(&app, get("/api/words/user?count=5", Some("alice"))).await;

    let body = json_body(send(&app, get("/api/progress", Some("bob"))).await).await;
    assert_eq!(body["data"]["summary"]["totalWords"], 0);
}
