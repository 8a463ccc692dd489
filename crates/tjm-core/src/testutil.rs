//! Test utilities: handwritten mocks for the core traits.
//!
//! All mocks use `Arc<Mutex<_>>` for interior mutability so clones share
//! state and tests can assert on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use crate::error::AppError;
use crate::models::OfferRow;
use crate::reporter::{PipelineEvent, PipelineReporter};
use crate::traits::OfferStore;

// ---------------------------------------------------------------------------
// MockStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    rows: HashMap<(String, String), OfferRow>,
    inserts: usize,
    updates: usize,
    unhealthy: Option<String>,
    write_error: Option<String>,
    failing_keys: HashMap<String, String>,
    delay: Option<Duration>,
}

/// In-memory offer store keyed on `(source, source_id)`.
///
/// A second insert for the same key fails with `DuplicateKey`, like a
/// unique constraint would.
#[derive(Clone, Default)]
pub struct MockStore {
    state: Arc<Mutex<StoreState>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Health checks fail with a network error.
    pub fn unhealthy(reason: &str) -> Self {
        let store = Self::new();
        store.state.lock().unwrap().unhealthy = Some(reason.to_string());
        store
    }

    /// Every write fails with `DatabaseError(message)`.
    pub fn fail_writes(&self, message: &str) {
        self.state.lock().unwrap().write_error = Some(message.to_string());
    }

    /// Writes for `natural_key` (`source:source_id`) fail with
    /// `DatabaseError(message)`.
    pub fn fail_key(&self, natural_key: &str, message: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_keys
            .insert(natural_key.to_string(), message.to_string());
    }

    /// Sleep before answering health checks and writes.
    pub fn with_delay(self, delay: Duration) -> Self {
        self.state.lock().unwrap().delay = Some(delay);
        self
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn insert_count(&self) -> usize {
        self.state.lock().unwrap().inserts
    }

    pub fn update_count(&self) -> usize {
        self.state.lock().unwrap().updates
    }

    pub fn get(&self, source: &str, source_id: &str) -> Option<OfferRow> {
        self.state
            .lock()
            .unwrap()
            .rows
            .get(&(source.to_string(), source_id.to_string()))
            .cloned()
    }

    async fn pause(&self) {
        let delay = self.state.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check_write(state: &StoreState, row: &OfferRow) -> Result<(), AppError> {
        if let Some(msg) = &state.write_error {
            return Err(AppError::DatabaseError(msg.clone()));
        }
        if let Some(msg) = state.failing_keys.get(&row.natural_key()) {
            return Err(AppError::DatabaseError(msg.clone()));
        }
        Ok(())
    }
}

impl OfferStore for MockStore {
    async fn insert(&self, row: &OfferRow) -> Result<(), AppError> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        Self::check_write(&state, row)?;
        let key = (row.source.clone(), row.source_id.clone());
        if state.rows.contains_key(&key) {
            return Err(AppError::DuplicateKey(row.natural_key()));
        }
        state.rows.insert(key, row.clone());
        state.inserts += 1;
        Ok(())
    }

    async fn update_by_key(&self, row: &OfferRow) -> Result<(), AppError> {
        self.pause().await;
        let mut state = self.state.lock().unwrap();
        Self::check_write(&state, row)?;
        let key = (row.source.clone(), row.source_id.clone());
        match state.rows.get_mut(&key) {
            Some(existing) => {
                *existing = row.clone();
                state.updates += 1;
                Ok(())
            }
            None => Err(AppError::DatabaseError(format!(
                "no row to update for {}",
                row.natural_key()
            ))),
        }
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.pause().await;
        match &self.state.lock().unwrap().unhealthy {
            Some(reason) => Err(AppError::NetworkError(reason.clone())),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Pipeline reporter that records event labels.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl PipelineReporter for MockReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        let label = match &event {
            PipelineEvent::RunStarted { .. } => "RunStarted",
            PipelineEvent::HealthChecked { .. } => "HealthChecked",
            PipelineEvent::FilesDiscovered { .. } => "FilesDiscovered",
            PipelineEvent::FileExtracted { .. } => "FileExtracted",
            PipelineEvent::Transformed { .. } => "Transformed",
            PipelineEvent::SinkLoaded { .. } => "SinkLoaded",
            PipelineEvent::RunFinished { .. } => "RunFinished",
        };
        self.events.lock().unwrap().push(label.to_string());
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A minimal flattened row.
pub fn make_test_row(source: &str, source_id: &str) -> OfferRow {
    OfferRow {
        source: source.to_string(),
        source_id: source_id.to_string(),
        url: Some(format!("https://{source}.example/jobs/{source_id}")),
        title: "Senior Rust Developer".to_string(),
        description: None,
        company: Some("Acme".to_string()),
        tjm_min: Some(500.0),
        tjm_max: Some(650.0),
        tjm_currency: "EUR".to_string(),
        technologies: vec!["Rust".to_string()],
        seniority_level: "senior".to_string(),
        location: Some("Paris, Île-de-France, France".to_string()),
        remote_policy: "hybrid".to_string(),
        contract_type: "freelance".to_string(),
        scraped_at: None,
        processed_at: Utc::now(),
        quality_score: 0.85,
        raw_payload: serde_json::json!({"source": source, "sourceId": source_id}),
    }
}

/// A raw record that clears the default quality gate.
pub fn make_raw_record(source: &str, source_id: &str) -> serde_json::Value {
    serde_json::json!({
        "source": source,
        "sourceId": source_id,
        "title": "Senior Go Developer",
        "url": format!("https://{source}.example/jobs/{source_id}"),
        "company": "Acme Consulting",
        "tjm_min": 500,
        "tjm_max": 700,
        "technologies": ["go", "Kubernetes"],
        "location": "Paris, Île-de-France"
    })
}
