use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::config::ConfigError;
use crate::db::DbError;
use crate::llm::LlmError;
use crate::report::ReportError;
use crate::telemetry::TelemetryError;

/// Errors that end the process with a non-zero exit code
#[derive(Error, Debug)]
pub enum AppError {
  #[error(transparent)]
  Usage(#[from] clap::Error),

  #[error("configuration error: {0}")]
  Config(#[from] ConfigError),

  #[error("telemetry error: {0}")]
  Telemetry(#[from] TelemetryError),

  #[error("{0}")]
  Database(#[from] DbError),

  #[error("provider client error: {0}")]
  Provider(#[from] LlmError),

  #[error("{0}")]
  Input(#[from] AnalysisError),

  #[error("{0}")]
  Report(#[from] ReportError),

  #[error("output error: {0}")]
  Output(#[from] serde_json::Error),

  #[error("write error: {0}")]
  Io(#[from] std::io::Error),

  #[error("disclaimer not acknowledged: re-run with --acknowledge to confirm this is not medical advice")]
  ConsentRequired,
}
