use crate::shutdown::ExitCode;
use connectors::sql::base::error::ConnectorError;
use engine_config::error::ConfigError;
use engine_core::error::{PipelineError, ReportError, StagingError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline run failed: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Source check failed: {0}")]
    Check(#[from] StagingError),

    #[error("Report failed: {0}")]
    Report(#[from] ReportError),

    #[error("Connection failed: {0}")]
    Connect(#[from] ConnectorError),

    /// PostgreSQL driver error.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Shutdown requested")]
    ShutdownRequested,
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::ShutdownRequested => ExitCode::ShutdownRequested,
            CliError::Pipeline(e) if e.is_cancelled() => ExitCode::ShutdownRequested,
            CliError::Config(_) => ExitCode::ConfigError,
            _ => ExitCode::GeneralError,
        }
    }
}
