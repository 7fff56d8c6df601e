pub mod config;
pub mod metrics_snapshot;
pub mod observability;
pub mod pipeline;
pub mod sinks;
pub mod sources;
pub mod transform;

pub use pipeline::{Envelope, IngestOutcome, Ingestion, PipelineError};
