use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};

use tjm_core::testutil::MockStore;

use crate::common::{authed, setup_test_app, setup_test_app_no_auth, setup_test_app_with};

fn process_request(body: &str) -> Request<Body> {
    authed(Request::post("/v1/process"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app();

    let (status, json) = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["sinks"][0]["sink"], "primary");
    assert_eq!(json["sinks"][0]["healthy"], true);
    assert_eq!(json["sinks"][1]["sink"], "backup");
}

#[tokio::test]
async fn health_reports_unhealthy_sink() {
    let app = setup_test_app_with(MockStore::unhealthy("connection refused"), None);

    let (status, json) = app
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;

    // backup still healthy
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sinks"][0]["healthy"], false);
    assert!(
        json["sinks"][0]["error"]
            .as_str()
            .unwrap()
            .contains("connection refused")
    );
}

#[tokio::test]
async fn unauthenticated_request_returns_401() {
    let app = setup_test_app();

    let (status, json) = app
        .send(Request::get("/v1/status").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn wrong_api_key_returns_401() {
    let app = setup_test_app();

    let (status, _) = app
        .send(
            Request::post("/v1/process")
                .header("authorization", "Bearer wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.insert_count(), 0);
}

#[tokio::test]
async fn no_api_key_configured_allows_requests() {
    let app = setup_test_app_no_auth();

    let (status, json) = app
        .send(Request::get("/v1/status").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["running"], false);
    assert!(json["lastRun"].is_null());
}

#[tokio::test]
async fn process_loads_offers() {
    let app = setup_test_app();
    app.write_offers("offers.jsonl", &["1", "2", "3"]);

    let (status, json) = app.send(process_request("{}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert!(json["batchId"].as_str().unwrap().starts_with("batch_"));
    assert_eq!(json["stats"]["state"], "succeeded");
    assert_eq!(json["stats"]["loaded"], 3);
    assert!(json["durationSeconds"].is_number());
    assert_eq!(app.store.len(), 3);
}

#[tokio::test]
async fn process_accepts_empty_body() {
    let app = setup_test_app();
    app.write_offers("offers.jsonl", &["1"]);

    let (status, json) = app
        .send(
            authed(Request::post("/v1/process"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stats"]["loaded"], 1);
}

#[tokio::test]
async fn process_accepts_snake_case_overrides() {
    let app = setup_test_app();
    app.write_offers("offers.jsonl", &["1"]);
    app.write_offers("other.ndjson", &["2", "3"]);

    let (status, json) = app
        .send(process_request(
            r#"{"file_pattern": "*.ndjson", "force_reprocess": true}"#,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stats"]["loaded"], 2);
    assert_eq!(json["stats"]["forceReprocess"], true);
    assert!(app.store.get("freework", "1").is_none());
}

#[tokio::test]
async fn process_rejects_invalid_body() {
    let app = setup_test_app();

    let (status, json) = app.send(process_request("{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "serialization_error");
}

#[tokio::test]
async fn process_missing_directory_returns_500() {
    let app = setup_test_app();

    let (status, json) = app
        .send(process_request(r#"{"sourceDirectory": "/definitely/not/here"}"#))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert_eq!(json["stats"]["state"], "failed");
}

#[tokio::test]
async fn concurrent_process_returns_409() {
    let store = MockStore::new().with_delay(Duration::from_millis(200));
    let app = setup_test_app_with(store, None);
    app.write_offers("offers.jsonl", &["1"]);

    let (first, second) = tokio::join!(
        app.send(process_request("{}")),
        app.send(process_request("{}"))
    );

    let mut statuses = [first.0, second.0];
    statuses.sort_by_key(|s| s.as_u16());
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);
    let conflict = if first.0 == StatusCode::CONFLICT { first.1 } else { second.1 };
    assert_eq!(conflict["error"], "run_in_progress");
}

#[tokio::test]
async fn status_reports_last_run_and_pending_files() {
    let app = setup_test_app();
    app.write_offers("a.jsonl", &["1"]);
    app.write_offers("b.jsonl", &["2"]);

    let (_, run) = app.send(process_request("{}")).await;
    let (status, json) = app
        .send(authed(Request::get("/v1/status")).body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["running"], false);
    assert_eq!(json["lastRun"]["batchId"], run["batchId"]);
    assert_eq!(json["inputFiles"], serde_json::json!(["a.jsonl", "b.jsonl"]));
    assert!(json["inputError"].is_null());
    assert!(!app.state.pipeline.is_running());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = setup_test_app();

    let (status, json) = app
        .send(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/v1/process"]["post"].is_object());
    assert!(json["paths"]["/health"]["get"].is_object());
    assert!(json["components"]["securitySchemes"]["bearer"].is_object());
}
