pub mod config;
pub mod error;
pub mod extract;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod quality;
pub mod report;
pub mod reporter;
pub mod retry;
pub mod sink;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;
pub mod traits;
pub mod transform;

pub use config::PipelineConfig;
pub use error::AppError;
pub use loader::{Loader, SinkReport};
pub use models::{
    ContractType, JobOffer, Location, OfferRow, QualityMetrics, RateRange, RemotePolicy,
    SeniorityLevel, TechnologySet,
};
pub use pipeline::{HealthReport, Pipeline, SinkHealth};
pub use quality::{QualityConfig, QualityScorer};
pub use report::{BatchRun, ErrorSample, ProcessRequest, ProcessResponse, RunCounts, RunState, RunStats};
pub use reporter::{PipelineEvent, PipelineReporter, TracingPipelineReporter};
pub use sink::{JsonlBackupSink, Sink, SinkKind, WriteOutcome};
pub use traits::{NullStore, OfferStore};
pub use transform::RecordTransformer;
