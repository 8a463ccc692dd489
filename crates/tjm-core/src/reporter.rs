use std::path::Path;
use std::time::Duration;

use crate::loader::SinkReport;
use crate::report::RunState;
use crate::sink::SinkKind;

/// Events emitted by the orchestrator during a run.
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    RunStarted {
        batch_id: &'a str,
        source_dir: &'a Path,
        pattern: &'a str,
        force_reprocess: bool,
    },
    HealthChecked {
        sink: SinkKind,
        error: Option<&'a str>,
    },
    FilesDiscovered {
        batch_id: &'a str,
        count: usize,
    },
    FileExtracted {
        file: &'a str,
        records: usize,
        malformed: usize,
    },
    Transformed {
        transformed: usize,
        rejected: usize,
        filtered: usize,
    },
    SinkLoaded {
        report: &'a SinkReport,
    },
    RunFinished {
        batch_id: &'a str,
        state: RunState,
        duration: Duration,
    },
}

/// Trait for receiving pipeline events (decoupled logging).
pub trait PipelineReporter: Send + Sync {
    fn report(&self, event: PipelineEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPipelineReporter;

impl PipelineReporter for TracingPipelineReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        match event {
            PipelineEvent::RunStarted {
                batch_id,
                source_dir,
                pattern,
                force_reprocess,
            } => {
                tracing::info!(
                    %batch_id,
                    source_dir = %source_dir.display(),
                    %pattern,
                    %force_reprocess,
                    "Pipeline run started"
                );
            }
            PipelineEvent::HealthChecked { sink, error: None } => {
                tracing::debug!(%sink, "Sink healthy");
            }
            PipelineEvent::HealthChecked {
                sink,
                error: Some(error),
            } => {
                tracing::warn!(%sink, %error, "Sink unhealthy");
            }
            PipelineEvent::FilesDiscovered { batch_id, count } => {
                tracing::info!(%batch_id, files = count, "Input files discovered");
            }
            PipelineEvent::FileExtracted {
                file,
                records,
                malformed,
            } => {
                tracing::debug!(%file, records, malformed, "File extracted");
            }
            PipelineEvent::Transformed {
                transformed,
                rejected,
                filtered,
            } => {
                tracing::info!(transformed, rejected, filtered, "Records transformed");
            }
            PipelineEvent::SinkLoaded { report } => {
                if report.success {
                    tracing::info!(
                        sink = %report.sink,
                        loaded = report.loaded,
                        inserted = report.inserted,
                        updated = report.updated,
                        "Sink loaded"
                    );
                } else {
                    tracing::warn!(
                        sink = %report.sink,
                        healthy = report.healthy,
                        loaded = report.loaded,
                        failed = report.failed,
                        skipped = report.skipped,
                        "Sink load incomplete"
                    );
                }
            }
            PipelineEvent::RunFinished {
                batch_id,
                state,
                duration,
            } => {
                tracing::info!(
                    %batch_id,
                    %state,
                    duration_secs = duration.as_secs_f64(),
                    "Pipeline run finished"
                );
            }
        }
    }
}
