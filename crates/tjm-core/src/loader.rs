//! Loader: fans flattened rows out to every sink.
//!
//! Rows are cut into `batch_size` chunks. Chunks for one sink run
//! concurrently, bounded by a semaphore of `max_parallel_writers`; sinks
//! run concurrently with each other. Each finished chunk folds its counters
//! into the sink report once, after all chunks complete, so the error sample
//! keeps row order.

use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;
use crate::models::OfferRow;
use crate::report::ErrorSample;
use crate::retry::RetryPolicy;
use crate::sink::{Sink, SinkKind, WriteOutcome};
use crate::traits::OfferStore;

/// Per-sink outcome of a load.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkReport {
    pub sink: SinkKind,
    pub healthy: bool,
    /// Rows written, inserted and updated together.
    pub loaded: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed: usize,
    /// Rows never attempted because the run was cancelled.
    pub skipped: usize,
    pub errors: ErrorSample,
    /// Healthy, and every row was written.
    pub success: bool,
}

impl SinkReport {
    pub fn new(sink: SinkKind, healthy: bool) -> Self {
        Self {
            sink,
            healthy,
            loaded: 0,
            inserted: 0,
            updated: 0,
            failed: 0,
            skipped: 0,
            errors: ErrorSample::default(),
            success: false,
        }
    }
}

#[derive(Debug, Default)]
struct ChunkResult {
    inserted: usize,
    updated: usize,
    failed: usize,
    skipped: usize,
    errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Loader {
    batch_size: usize,
    max_parallel_writers: usize,
    retry: RetryPolicy,
    error_sample_size: usize,
}

impl Loader {
    pub fn new(
        batch_size: usize,
        max_parallel_writers: usize,
        retry: RetryPolicy,
        error_sample_size: usize,
    ) -> Self {
        Self {
            batch_size: batch_size.max(1),
            max_parallel_writers: max_parallel_writers.max(1),
            retry,
            error_sample_size,
        }
    }

    /// Load `rows` into every sink. `health` holds the health-check result
    /// for each sink, in the same order; unhealthy sinks are not written to.
    pub async fn load_all<S: OfferStore>(
        &self,
        sinks: &[Sink<S>],
        health: &[Result<(), AppError>],
        rows: &[OfferRow],
        cancel: &CancellationToken,
    ) -> Vec<SinkReport> {
        let loads = sinks.iter().zip(health).map(|(sink, health)| async move {
            match health {
                Ok(()) => self.load_sink(sink, rows, cancel).await,
                Err(e) => self.unhealthy_report(sink.kind(), e, rows.len()),
            }
        });
        join_all(loads).await
    }

    fn unhealthy_report(&self, kind: SinkKind, error: &AppError, rows: usize) -> SinkReport {
        let mut report = SinkReport::new(kind, false);
        report.errors = ErrorSample::new(self.error_sample_size);
        report.errors.push(format!("{kind} sink unhealthy: {error}"));
        report.failed = rows;
        report
    }

    /// Load `rows` into one healthy sink.
    pub async fn load_sink<S: OfferStore>(
        &self,
        sink: &Sink<S>,
        rows: &[OfferRow],
        cancel: &CancellationToken,
    ) -> SinkReport {
        let semaphore = Semaphore::new(self.max_parallel_writers);
        let chunks = rows
            .chunks(self.batch_size)
            .map(|chunk| self.write_chunk(sink, chunk, &semaphore, cancel));
        let results = join_all(chunks).await;

        let kind = sink.kind();
        let mut report = SinkReport::new(kind, true);
        report.errors = ErrorSample::new(self.error_sample_size);
        for result in results {
            report.inserted += result.inserted;
            report.updated += result.updated;
            report.failed += result.failed;
            report.skipped += result.skipped;
            for error in result.errors {
                report.errors.push(error);
            }
        }
        report.loaded = report.inserted + report.updated;
        report.success = report.failed == 0 && report.skipped == 0;
        report
    }

    async fn write_chunk<S: OfferStore>(
        &self,
        sink: &Sink<S>,
        chunk: &[OfferRow],
        semaphore: &Semaphore,
        cancel: &CancellationToken,
    ) -> ChunkResult {
        let mut result = ChunkResult::default();

        let Ok(_permit) = semaphore.acquire().await else {
            result.skipped = chunk.len();
            return result;
        };
        // in-flight chunks finish; chunks not yet started are skipped
        if cancel.is_cancelled() {
            result.skipped = chunk.len();
            return result;
        }

        for row in chunk {
            match sink.write(row, &self.retry).await {
                Ok(WriteOutcome::Inserted) => result.inserted += 1,
                Ok(WriteOutcome::Updated) => result.updated += 1,
                Err(e) => {
                    result.failed += 1;
                    result
                        .errors
                        .push(format!("{} sink: {}: {e}", sink.kind(), row.natural_key()));
                }
            }
        }
        result
    }
}
