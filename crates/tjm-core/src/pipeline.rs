//! Batch orchestrator: HealthCheck -> Discover -> Extract -> Transform ->
//! Load -> Report, one run at a time.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::AppError;
use crate::extract::{discover_files, display_name, extract_files};
use crate::loader::{Loader, SinkReport};
use crate::models::OfferRow;
use crate::report::{BatchRun, ErrorSample, ProcessRequest, RunCounts, RunState};
use crate::reporter::{PipelineEvent, PipelineReporter, TracingPipelineReporter};
use crate::retry::RetryPolicy;
use crate::sink::{JsonlBackupSink, Sink, SinkKind};
use crate::traits::OfferStore;
use crate::transform::RecordTransformer;

/// Health of one sink.
#[derive(Debug, Clone, Serialize)]
pub struct SinkHealth {
    pub sink: SinkKind,
    pub healthy: bool,
    pub error: Option<String>,
}

/// Result of a standalone health check.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub input_dir: String,
    pub input_exists: bool,
    pub sinks: Vec<SinkHealth>,
    /// Input directory exists and at least one sink is healthy.
    pub healthy: bool,
}

/// `batch_YYYYmmdd_HHMMSS_<8 hex>`.
pub fn new_batch_id(started_at: DateTime<Utc>) -> String {
    format!(
        "batch_{}_{}",
        started_at.format("%Y%m%d_%H%M%S"),
        &Uuid::new_v4().simple().to_string()[..8]
    )
}

/// Drives raw files through transformation and into the sinks.
///
/// The primary store is optional: without one, the run relies on the
/// backup sink alone.
pub struct Pipeline<S, R = TracingPipelineReporter> {
    config: PipelineConfig,
    primary: Option<S>,
    transformer: RecordTransformer,
    loader: Loader,
    reporter: R,
    run_lock: Mutex<()>,
}

impl<S: OfferStore> Pipeline<S> {
    pub fn new(config: PipelineConfig, primary: Option<S>) -> Self {
        Self::with_reporter(config, primary, TracingPipelineReporter)
    }
}

impl<S: OfferStore, R: PipelineReporter> Pipeline<S, R> {
    pub fn with_reporter(config: PipelineConfig, primary: Option<S>, reporter: R) -> Self {
        let retry = RetryPolicy::new(config.sink_timeout, config.sink_max_retries);
        let loader = Loader::new(
            config.batch_size,
            config.max_parallel_writers,
            retry,
            config.error_sample_size,
        );
        Self {
            transformer: RecordTransformer::new(&config),
            loader,
            config,
            primary,
            reporter,
            run_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn is_running(&self) -> bool {
        self.run_lock.try_lock().is_err()
    }

    fn build_sinks(&self, batch_id: &str) -> Vec<Sink<S>> {
        let mut sinks = Vec::with_capacity(2);
        if let Some(store) = &self.primary {
            sinks.push(Sink::Primary(store.clone()));
        }
        if self.config.backup_enabled {
            sinks.push(Sink::Backup(JsonlBackupSink::new(
                &self.config.output_dir,
                batch_id,
            )));
        }
        sinks
    }

    /// Check the default input directory and every configured sink.
    pub async fn health(&self) -> HealthReport {
        let sinks = self.build_sinks(&new_batch_id(Utc::now()));
        let results = join_all(sinks.iter().map(|s| s.health_check())).await;
        let sinks: Vec<SinkHealth> = sinks
            .iter()
            .zip(results)
            .map(|(sink, result)| SinkHealth {
                sink: sink.kind(),
                healthy: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
            })
            .collect();
        let input_exists = is_dir(&self.config.source_dir).await;
        HealthReport {
            input_dir: self.config.source_dir.display().to_string(),
            input_exists,
            healthy: input_exists && sinks.iter().any(|s| s.healthy),
            sinks,
        }
    }

    /// Input files currently matching the default pattern.
    pub async fn list_input_files(&self) -> Result<Vec<String>, AppError> {
        let files = discover_files(&self.config.source_dir, &self.config.file_pattern).await?;
        Ok(files.iter().map(|p| display_name(p)).collect())
    }

    /// Execute one run. Fails only with [`AppError::RunInProgress`]; every
    /// other problem ends in a [`BatchRun`] with a definite state.
    pub async fn run(
        &self,
        request: &ProcessRequest,
        cancel: &CancellationToken,
    ) -> Result<BatchRun, AppError> {
        let Ok(_guard) = self.run_lock.try_lock() else {
            return Err(AppError::RunInProgress);
        };

        let started_at = Utc::now();
        let mut ctx = RunContext {
            batch_id: new_batch_id(started_at),
            started_at,
            clock: Instant::now(),
            counts: RunCounts::default(),
            errors: ErrorSample::new(self.config.error_sample_size),
            source_files: Vec::new(),
            force_reprocess: request.force_reprocess,
        };
        let source_dir = request
            .source_directory
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.config.source_dir.clone());
        let pattern = request
            .file_pattern
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(&self.config.file_pattern)
            .to_string();

        self.reporter.report(PipelineEvent::RunStarted {
            batch_id: &ctx.batch_id,
            source_dir: &source_dir,
            pattern: &pattern,
            force_reprocess: request.force_reprocess,
        });

        // HealthCheck: input directory, then every sink.
        if !is_dir(&source_dir).await {
            let err = AppError::ConfigError(format!(
                "input directory {} does not exist",
                source_dir.display()
            ));
            ctx.errors.push(err.to_string());
            return Ok(self.finish(ctx, Vec::new(), true));
        }

        let sinks = self.build_sinks(&ctx.batch_id);
        let health = join_all(sinks.iter().map(|s| s.health_check())).await;
        for (sink, result) in sinks.iter().zip(&health) {
            let error = result.as_ref().err().map(|e| e.to_string());
            self.reporter.report(PipelineEvent::HealthChecked {
                sink: sink.kind(),
                error: error.as_deref(),
            });
        }

        let aborted_reports: Vec<SinkReport> = sinks
            .iter()
            .zip(&health)
            .map(|(sink, result)| {
                let mut report = SinkReport::new(sink.kind(), result.is_ok());
                report.errors = ErrorSample::new(self.config.error_sample_size);
                if let Err(e) = result {
                    report.errors.push(format!("{} sink unhealthy: {e}", sink.kind()));
                }
                report
            })
            .collect();

        if sinks.is_empty() {
            ctx.errors
                .push(AppError::ConfigError("no sink configured".into()).to_string());
            return Ok(self.finish(ctx, aborted_reports, true));
        }
        if health.iter().all(Result::is_err) {
            for result in &health {
                if let Err(e) = result {
                    ctx.errors.push(e.to_string());
                }
            }
            ctx.errors
                .push(AppError::ConfigError("no healthy sink available".into()).to_string());
            return Ok(self.finish(ctx, aborted_reports, true));
        }

        // Discover
        let paths = match discover_files(&source_dir, &pattern).await {
            Ok(paths) => paths,
            Err(e) => {
                ctx.errors.push(e.to_string());
                return Ok(self.finish(ctx, aborted_reports, true));
            }
        };
        ctx.source_files = paths.iter().map(|p| display_name(p)).collect();
        self.reporter.report(PipelineEvent::FilesDiscovered {
            batch_id: &ctx.batch_id,
            count: paths.len(),
        });

        // Extract + Transform
        let extracted = extract_files(&paths, self.config.max_parallel_files).await;
        let mut rows: Vec<OfferRow> = Vec::new();
        for file in &extracted {
            let name = file.file_name();
            self.reporter.report(PipelineEvent::FileExtracted {
                file: &name,
                records: file.records.len(),
                malformed: file.malformed,
            });
            ctx.counts.total += file.records.len() + file.malformed;
            ctx.counts.malformed += file.malformed;
            for error in &file.errors {
                ctx.errors.push(error.clone());
            }

            for record in &file.records {
                match self.transformer.transform(record) {
                    Ok(offer) => {
                        ctx.counts.transformed += 1;
                        if offer.quality.overall() >= self.config.min_quality {
                            rows.push(offer.to_row());
                        } else {
                            ctx.counts.filtered += 1;
                        }
                    }
                    Err(e) => {
                        ctx.counts.rejected += 1;
                        ctx.errors.push(format!("{name}: {e}"));
                    }
                }
            }
        }
        self.reporter.report(PipelineEvent::Transformed {
            transformed: ctx.counts.transformed,
            rejected: ctx.counts.rejected,
            filtered: ctx.counts.filtered,
        });

        // Load
        let reports = self.loader.load_all(&sinks, &health, &rows, cancel).await;
        Ok(self.finish(ctx, reports, false))
    }

    /// Fold sink reports into the final counts and state. `aborted` marks a
    /// run stopped before the load phase.
    fn finish(&self, mut ctx: RunContext, sinks: Vec<SinkReport>, aborted: bool) -> BatchRun {
        if !aborted {
            for report in &sinks {
                self.reporter.report(PipelineEvent::SinkLoaded { report });
            }
        }

        let best = sinks
            .iter()
            .filter(|s| s.healthy)
            .max_by_key(|s| (s.loaded, std::cmp::Reverse(s.failed)));
        if let Some(best) = best {
            ctx.counts.loaded = best.loaded;
            ctx.counts.failed = ctx.counts.malformed + ctx.counts.rejected + best.failed;
            for report in &sinks {
                for message in &report.errors.messages {
                    ctx.errors.push(message.clone());
                }
                ctx.errors.suppressed += report.errors.suppressed;
            }
        } else {
            ctx.counts.failed = ctx.counts.malformed + ctx.counts.rejected;
        }

        let state = if aborted {
            RunState::Failed
        } else {
            RunState::from_sinks(&sinks)
        };
        let duration = ctx.clock.elapsed();
        self.reporter.report(PipelineEvent::RunFinished {
            batch_id: &ctx.batch_id,
            state,
            duration,
        });

        BatchRun {
            batch_id: ctx.batch_id,
            state,
            source_files: ctx.source_files,
            counts: ctx.counts,
            sinks,
            errors: ctx.errors,
            started_at: ctx.started_at,
            duration,
            force_reprocess: ctx.force_reprocess,
        }
    }
}

struct RunContext {
    batch_id: String,
    started_at: DateTime<Utc>,
    clock: Instant,
    counts: RunCounts,
    errors: ErrorSample,
    source_files: Vec<String>,
    force_reprocess: bool,
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}
