use crate::pipeline::PipelineState;
use connectors::{
    file::csv::error::FileError,
    sql::base::error::{ConnectorError, DbError},
};
use engine_processing::transform::error::NormalizeError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Source error: {0}")]
    Source(#[from] FileError),

    #[error("Normalization error: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("Staging load failed: {0}")]
    Load(#[source] DbError),
}

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Transformation script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    #[error("Failed to read transformation script {}: {source}", .path.display())]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Transformation failed: {0}")]
    Execution(#[source] DbError),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Connection failed: {0}")]
    Connect(#[from] ConnectorError),

    #[error("Another pipeline run holds lock {0}")]
    RunInProgress(i64),

    #[error("Failed to acquire run lock: {0}")]
    Lock(#[source] DbError),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl PipelineError {
    /// State the run was in when the error occurred.
    pub fn failed_in(&self) -> PipelineState {
        match self {
            PipelineError::Connect(_) => PipelineState::Connecting,
            PipelineError::RunInProgress(_)
            | PipelineError::Lock(_)
            | PipelineError::Staging(_) => PipelineState::Loading,
            PipelineError::Transform(_) => PipelineState::Transforming,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            PipelineError::Staging(StagingError::Load(DbError::Cancelled))
                | PipelineError::Transform(TransformError::Execution(DbError::Cancelled))
        )
    }
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report query '{query}' failed: {source}")]
    Query {
        query: &'static str,
        #[source]
        source: DbError,
    },

    #[error("Unexpected value in column '{column}' of report '{query}'")]
    UnexpectedValue {
        query: &'static str,
        column: &'static str,
    },
}
