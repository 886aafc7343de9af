//! Error types for the CLI runtime.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tether_lsp::completion::RequestOutcome;
use tether_lsp::telemetry::TelemetryError;
use tether_lsp::Language;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("no language server handles {}", path.display())]
    UnsupportedFile { path: PathBuf },
    #[error("failed to read {}: {source}", path.display())]
    ReadDocument { path: PathBuf, source: io::Error },
    #[error("the {language} language server is not available")]
    ServerUnavailable { language: Language },
    #[error("failed to start completion worker: {0}")]
    Worker(io::Error),
    #[error("completion request {id} did not settle")]
    Unsettled { id: i64 },
    #[error("completion ended without results: {outcome:?}")]
    Completion { outcome: Option<RequestOutcome> },
    #[error("failed to serialise completion item: {0}")]
    Serialise(serde_json::Error),
    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),
}
