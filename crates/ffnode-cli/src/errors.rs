//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use ffnode_core::PipelineError;
use thiserror::Error;

use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to read items from {origin}: {source}")]
    ReadItems { origin: String, source: io::Error },
    #[error("failed to parse items: {0}")]
    ParseItems(serde_json::Error),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("failed to serialise records: {0}")]
    SerialiseRecords(serde_json::Error),
    #[error("failed to write records: {0}")]
    WriteRecords(io::Error),
}
