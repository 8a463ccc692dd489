use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use tjm_core::{Pipeline, ProcessResponse};

/// Shared application state, available to all route handlers via
/// `State<Arc<AppState<S>>>`.
pub struct AppState<S> {
    pub pipeline: Pipeline<S>,
    /// Response of the most recent finished run.
    pub last_run: RwLock<Option<ProcessResponse>>,
    /// Bearer token for `/v1/*` (None = no authentication).
    pub api_key: Option<String>,
    /// Cancelled on shutdown; an active run stops issuing new writes.
    pub shutdown: CancellationToken,
}

impl<S> AppState<S> {
    pub fn new(pipeline: Pipeline<S>, api_key: Option<String>) -> Self {
        Self {
            pipeline,
            last_run: RwLock::new(None),
            api_key,
            shutdown: CancellationToken::new(),
        }
    }
}
