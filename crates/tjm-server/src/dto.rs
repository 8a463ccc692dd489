use serde::{Deserialize, Serialize};

use tjm_core::{HealthReport, ProcessRequest, ProcessResponse, RunStats};

// ---------------------------------------------------------------------------
// Process
// ---------------------------------------------------------------------------

/// Trigger body. Every field is optional; snake_case spellings are accepted.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessBody {
    /// Overrides the configured input directory.
    #[serde(default, alias = "source_directory")]
    pub source_directory: Option<String>,
    /// Overrides the configured glob, e.g. `*.jsonl`.
    #[serde(default, alias = "file_pattern")]
    pub file_pattern: Option<String>,
    #[serde(default, alias = "force_reprocess")]
    pub force_reprocess: bool,
}

impl From<ProcessBody> for ProcessRequest {
    fn from(body: ProcessBody) -> Self {
        ProcessRequest {
            source_directory: body.source_directory,
            file_pattern: body.file_pattern,
            force_reprocess: body.force_reprocess,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponseBody {
    pub success: bool,
    pub batch_id: String,
    /// Run state, counters, per-sink reports, and the error sample.
    #[schema(value_type = Object)]
    pub stats: RunStats,
    pub duration_seconds: f64,
}

impl From<ProcessResponse> for ProcessResponseBody {
    fn from(response: ProcessResponse) -> Self {
        Self {
            success: response.success,
            batch_id: response.batch_id,
            stats: response.stats,
            duration_seconds: response.duration_seconds,
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub running: bool,
    pub last_run: Option<ProcessResponseBody>,
    pub input_directory: String,
    /// Files matching the configured pattern right now.
    pub input_files: Vec<String>,
    pub input_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SinkHealthResponse {
    pub sink: String,
    pub healthy: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub input_directory: String,
    pub input_exists: bool,
    pub sinks: Vec<SinkHealthResponse>,
}

impl From<HealthReport> for HealthResponse {
    fn from(report: HealthReport) -> Self {
        Self {
            status: if report.healthy { "healthy" } else { "unhealthy" },
            input_directory: report.input_dir,
            input_exists: report.input_exists,
            sinks: report
                .sinks
                .into_iter()
                .map(|s| SinkHealthResponse {
                    sink: s.sink.to_string(),
                    healthy: s.healthy,
                    error: s.error,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
