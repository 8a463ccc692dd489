use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use tjm_core::testutil::{MockStore, make_raw_record};
use tjm_core::{Pipeline, PipelineConfig};
use tjm_server::routes;
use tjm_server::state::AppState;

pub const TEST_API_KEY: &str = "test-secret-key";

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState<MockStore>>,
    pub store: MockStore,
    pub input: TempDir,
    // Held so the backup directory outlives the test.
    _output: TempDir,
}

impl TestApp {
    /// Drop a JSONL file of valid offers into the input directory.
    pub fn write_offers(&self, name: &str, ids: &[&str]) {
        let body: String = ids
            .iter()
            .map(|id| format!("{}\n", make_raw_record("freework", id)))
            .collect();
        std::fs::write(self.input.path().join(name), body).unwrap();
    }

    pub async fn send(&self, request: Request<Body>) -> (axum::http::StatusCode, serde_json::Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }
}

/// Build the app over a mock store and temporary directories.
pub fn setup_test_app_with(store: MockStore, api_key: Option<&str>) -> TestApp {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let config = PipelineConfig::default()
        .with_source_dir(input.path())
        .with_output_dir(output.path());

    let state = Arc::new(AppState::new(
        Pipeline::new(config, Some(store.clone())),
        api_key.map(str::to_string),
    ));
    TestApp {
        router: routes::router(state.clone()),
        state,
        store,
        input,
        _output: output,
    }
}

pub fn setup_test_app() -> TestApp {
    setup_test_app_with(MockStore::new(), Some(TEST_API_KEY))
}

pub fn setup_test_app_no_auth() -> TestApp {
    setup_test_app_with(MockStore::new(), None)
}

pub fn authed(request: axum::http::request::Builder) -> axum::http::request::Builder {
    request.header("authorization", format!("Bearer {TEST_API_KEY}"))
}
