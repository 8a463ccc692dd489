use std::future::Future;

use crate::error::AppError;
use crate::models::OfferRow;

/// Primary store for flattened offers, keyed on `(source, source_id)`.
///
/// `insert` must fail with [`AppError::DuplicateKey`] when the key already
/// exists; the loader relies on that to fall back to `update_by_key`.
pub trait OfferStore: Send + Sync + Clone {
    /// Insert a new row.
    fn insert(&self, row: &OfferRow) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Overwrite the row with the same natural key.
    fn update_by_key(&self, row: &OfferRow) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Cheap reachability probe run before any record is read.
    fn health_check(&self) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// A store that accepts nothing and is never healthy. Used when no primary
/// store is configured so the pipeline can run on the backup sink alone.
#[derive(Debug, Clone)]
pub struct NullStore;

impl OfferStore for NullStore {
    async fn insert(&self, _row: &OfferRow) -> Result<(), AppError> {
        Err(AppError::ConfigError("no primary store configured".into()))
    }

    async fn update_by_key(&self, _row: &OfferRow) -> Result<(), AppError> {
        Err(AppError::ConfigError("no primary store configured".into()))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Err(AppError::ConfigError("no primary store configured".into()))
    }
}
