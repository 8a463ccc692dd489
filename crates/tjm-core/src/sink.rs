//! Persistence targets. The set is closed: a primary [`OfferStore`] and a
//! newline-delimited JSON backup file.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::models::OfferRow;
use crate::retry::RetryPolicy;
use crate::traits::OfferStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Primary,
    Backup,
}

impl SinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Primary => "primary",
            SinkKind::Backup => "backup",
        }
    }
}

impl std::fmt::Display for SinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a successful write landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Updated,
}

pub enum Sink<S> {
    Primary(S),
    Backup(JsonlBackupSink),
}

impl<S: OfferStore> Sink<S> {
    pub fn kind(&self) -> SinkKind {
        match self {
            Sink::Primary(_) => SinkKind::Primary,
            Sink::Backup(_) => SinkKind::Backup,
        }
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        match self {
            Sink::Primary(store) => store.health_check().await,
            Sink::Backup(backup) => backup.health_check().await,
        }
    }

    /// Write one row: insert, and on a uniqueness violation update by
    /// natural key instead. Each call goes through `retry`.
    pub async fn write(&self, row: &OfferRow, retry: &RetryPolicy) -> Result<WriteOutcome, AppError> {
        match self {
            Sink::Primary(store) => match retry.run(|| store.insert(row)).await {
                Ok(()) => Ok(WriteOutcome::Inserted),
                Err(e) if e.is_duplicate_key() => {
                    retry.run(|| store.update_by_key(row)).await?;
                    Ok(WriteOutcome::Updated)
                }
                Err(e) => Err(e),
            },
            Sink::Backup(backup) => {
                retry.run(|| backup.append(row)).await?;
                Ok(WriteOutcome::Inserted)
            }
        }
    }
}

/// Appends flattened offers to `processed_offers_<stamp>.jsonl`, where
/// `<stamp>` is the batch id without its `batch_` prefix, so every run gets
/// its own file.
///
/// The file is created on the first write; concurrent writers are
/// serialized by an async mutex so lines never interleave.
pub struct JsonlBackupSink {
    dir: PathBuf,
    path: PathBuf,
    file: Mutex<Option<tokio::fs::File>>,
}

impl JsonlBackupSink {
    pub fn new(dir: impl Into<PathBuf>, batch_id: &str) -> Self {
        let dir = dir.into();
        let stamp = batch_id.strip_prefix("batch_").unwrap_or(batch_id);
        let path = dir.join(format!("processed_offers_{stamp}.jsonl"));
        Self {
            dir,
            path,
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the output directory if needed, then write and remove a
    /// scratch file to prove it accepts writes.
    pub async fn health_check(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::SinkError(format!("cannot create {}: {e}", self.dir.display()))
        })?;

        let scratch = self.path.with_extension("jsonl.check");
        tokio::fs::write(&scratch, b"ok\n").await.map_err(|e| {
            AppError::SinkError(format!("{} is not writable: {e}", self.dir.display()))
        })?;
        tokio::fs::remove_file(&scratch).await.map_err(|e| {
            AppError::SinkError(format!("cannot remove {}: {e}", scratch.display()))
        })?;
        Ok(())
    }

    pub async fn append(&self, row: &OfferRow) -> Result<(), AppError> {
        let mut line = serde_json::to_vec(row)?;
        line.push(b'\n');

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            let file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .map_err(|e| {
                    AppError::SinkError(format!("cannot open {}: {e}", self.path.display()))
                })?;
            *guard = Some(file);
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(&line)
                .await
                .map_err(|e| AppError::SinkError(format!("write failed: {e}")))?;
            file.flush()
                .await
                .map_err(|e| AppError::SinkError(format!("flush failed: {e}")))?;
        }
        Ok(())
    }
}
