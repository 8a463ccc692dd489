//! Run report types and the trigger request/response shapes.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::loader::SinkReport;

/// Terminal state of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Succeeded,
    PartiallySucceeded,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Succeeded => "succeeded",
            RunState::PartiallySucceeded => "partially_succeeded",
            RunState::Failed => "failed",
        }
    }

    /// At least one sink fully succeeded.
    pub fn is_success(&self) -> bool {
        !matches!(self, RunState::Failed)
    }

    /// Fold per-sink outcomes: every sink succeeded, some did, or none did.
    pub fn from_sinks(sinks: &[SinkReport]) -> Self {
        let ok = sinks.iter().filter(|s| s.success).count();
        match ok {
            0 => RunState::Failed,
            n if n == sinks.len() => RunState::Succeeded,
            _ => RunState::PartiallySucceeded,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounts {
    /// Records read, malformed lines included.
    pub total: usize,
    /// Lines that were not valid JSON.
    pub malformed: usize,
    /// Records failing the identity check.
    pub rejected: usize,
    /// Offers below the quality gate.
    pub filtered: usize,
    pub transformed: usize,
    pub loaded: usize,
    pub failed: usize,
}

/// First `limit` error messages plus a count of the ones left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSample {
    pub messages: Vec<String>,
    pub suppressed: usize,
    #[serde(skip)]
    limit: usize,
}

impl ErrorSample {
    pub fn new(limit: usize) -> Self {
        Self {
            messages: Vec::new(),
            suppressed: 0,
            limit,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        if self.messages.len() < self.limit {
            self.messages.push(message.into());
        } else {
            self.suppressed += 1;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.suppressed == 0
    }

    pub fn total(&self) -> usize {
        self.messages.len() + self.suppressed
    }
}

/// Outcome of one orchestrator invocation. Built during the run and never
/// touched after it is returned.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRun {
    pub batch_id: String,
    pub state: RunState,
    pub source_files: Vec<String>,
    pub counts: RunCounts,
    pub sinks: Vec<SinkReport>,
    pub errors: ErrorSample,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "duration_seconds", serialize_with = "serialize_secs")]
    pub duration: Duration,
    pub force_reprocess: bool,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Input accepted by the trigger surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default, alias = "source_directory")]
    pub source_directory: Option<String>,
    #[serde(default, alias = "file_pattern")]
    pub file_pattern: Option<String>,
    #[serde(default, alias = "force_reprocess")]
    pub force_reprocess: bool,
}

/// Result shape returned to the trigger surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub batch_id: String,
    pub stats: RunStats,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub state: RunState,
    #[serde(flatten)]
    pub counts: RunCounts,
    pub source_files: Vec<String>,
    pub sinks: Vec<SinkReport>,
    pub errors: Vec<String>,
    pub suppressed_errors: usize,
    pub force_reprocess: bool,
}

impl From<&BatchRun> for ProcessResponse {
    fn from(run: &BatchRun) -> Self {
        Self {
            success: run.state.is_success(),
            batch_id: run.batch_id.clone(),
            stats: RunStats {
                state: run.state,
                counts: run.counts,
                source_files: run.source_files.clone(),
                sinks: run.sinks.clone(),
                errors: run.errors.messages.clone(),
                suppressed_errors: run.errors.suppressed,
                force_reprocess: run.force_reprocess,
            },
            duration_seconds: run.duration.as_secs_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SinkKind;

    fn sink(kind: SinkKind, success: bool) -> SinkReport {
        let mut report = SinkReport::new(kind, true);
        report.success = success;
        report
    }

    #[test]
    fn test_state_from_sinks() {
        assert_eq!(RunState::from_sinks(&[]), RunState::Failed);
        assert_eq!(
            RunState::from_sinks(&[sink(SinkKind::Primary, true), sink(SinkKind::Backup, true)]),
            RunState::Succeeded
        );
        assert_eq!(
            RunState::from_sinks(&[sink(SinkKind::Primary, false), sink(SinkKind::Backup, true)]),
            RunState::PartiallySucceeded
        );
        assert_eq!(
            RunState::from_sinks(&[sink(SinkKind::Primary, false)]),
            RunState::Failed
        );
        assert!(RunState::PartiallySucceeded.is_success());
    }

    #[test]
    fn test_error_sample_is_bounded() {
        let mut sample = ErrorSample::new(2);
        for i in 0..5 {
            sample.push(format!("error {i}"));
        }
        assert_eq!(sample.messages, vec!["error 0", "error 1"]);
        assert_eq!(sample.suppressed, 3);
        assert_eq!(sample.total(), 5);
    }

    #[test]
    fn test_request_accepts_both_casings() {
        let camel: ProcessRequest =
            serde_json::from_str(r#"{"sourceDirectory":"in","filePattern":"*.json","forceReprocess":true}"#)
                .unwrap();
        let snake: ProcessRequest =
            serde_json::from_str(r#"{"source_directory":"in","file_pattern":"*.json","force_reprocess":true}"#)
                .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(serde_json::from_str::<ProcessRequest>("{}").unwrap(), ProcessRequest::default());
    }
}
