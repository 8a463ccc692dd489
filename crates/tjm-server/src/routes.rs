use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use utoipa::OpenApi;

use tjm_core::{AppError, OfferStore, ProcessRequest, ProcessResponse};

use crate::auth::require_api_key;
use crate::dto::{HealthResponse, ProcessBody, ProcessResponseBody, StatusResponse};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router<S: OfferStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let api = Router::new()
        .route("/v1/process", post(process::<S>))
        .route("/v1/status", get(status::<S>))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key::<S>,
        ));

    let public = Router::new()
        .route("/health", get(health::<S>))
        .route("/api-docs/openapi.json", get(openapi_json));

    public.merge(api).with_state(state)
}

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

/// Run the pipeline once and wait for it to finish.
#[utoipa::path(
    post,
    path = "/v1/process",
    request_body(content = ProcessBody, description = "Optional overrides; an empty body uses the configured defaults"),
    responses(
        (status = 200, description = "Run finished with at least one sink loaded", body = ProcessResponseBody),
        (status = 500, description = "Run failed", body = ProcessResponseBody),
        (status = 400, description = "Invalid body", body = crate::dto::ErrorResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A run is already active", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "pipeline"
)]
pub async fn process<S: OfferStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request = parse_request(&body)?;
    let run = state.pipeline.run(&request, &state.shutdown).await?;

    let response = ProcessResponse::from(&run);
    *state.last_run.write().await = Some(response.clone());

    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, axum::Json(ProcessResponseBody::from(response))).into_response())
}

fn parse_request(body: &[u8]) -> Result<ProcessRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ProcessRequest::default());
    }
    let body: ProcessBody = serde_json::from_slice(body)?;
    Ok(body.into())
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/status",
    responses(
        (status = 200, description = "Last run and pending input files", body = StatusResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "pipeline"
)]
pub async fn status<S: OfferStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    let last_run = state
        .last_run
        .read()
        .await
        .clone()
        .map(ProcessResponseBody::from);
    let (input_files, input_error) = match state.pipeline.list_input_files().await {
        Ok(files) => (files, None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };

    axum::Json(StatusResponse {
        running: state.pipeline.is_running(),
        last_run,
        input_directory: state.pipeline.config().source_dir.display().to_string(),
        input_files,
        input_error,
    })
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Input directory present and a sink is reachable", body = HealthResponse),
        (status = 503, description = "Not ready", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health<S: OfferStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> impl IntoResponse {
    let report = state.pipeline.health().await;
    let status = if report.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, axum::Json(HealthResponse::from(report)))
}

async fn openapi_json() -> impl IntoResponse {
    axum::Json(ApiDoc::openapi())
}
