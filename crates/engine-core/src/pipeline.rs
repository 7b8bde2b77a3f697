use crate::{
    error::PipelineError,
    staging::{LoadReport, StagingLoader},
    transformer::Transformer,
};
use chrono::{DateTime, Utc};
use connectors::sql::base::adapter::{Connector, SqlAdapter};
use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Connecting,
    Loading,
    Transforming,
    Done,
    Failed,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Connecting => "Connecting",
            PipelineState::Loading => "Loading",
            PipelineState::Transforming => "Transforming",
            PipelineState::Done => "Done",
            PipelineState::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateTransition {
    pub state: PipelineState,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub state: PipelineState,
    pub history: Vec<StateTransition>,
    pub load: LoadReport,
}

/// One staging-load-then-transform run over a single connection.
///
/// The transformation only runs after the staging load committed. The
/// connection is acquired once and released on every exit path.
pub struct Pipeline<C: Connector> {
    connector: C,
    loader: StagingLoader,
    transformer: Transformer,
    lock_key: i64,
    cancel: CancellationToken,
    history: Vec<StateTransition>,
}

impl<C: Connector> Pipeline<C> {
    pub fn new(
        connector: C,
        loader: StagingLoader,
        transformer: Transformer,
        lock_key: i64,
        cancel: CancellationToken,
    ) -> Self {
        Pipeline {
            connector,
            loader,
            transformer,
            lock_key,
            cancel,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> Option<PipelineState> {
        self.history.last().map(|t| t.state)
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub async fn run(&mut self) -> Result<RunSummary, PipelineError> {
        if self.state().is_some_and(|s| s.is_terminal()) {
            self.history.clear();
        }

        self.transition(PipelineState::Connecting);
        let adapter = match self.connector.connect().await {
            Ok(adapter) => {
                info!("Successfully connected to the database.");
                adapter
            }
            Err(e) => return Err(self.fail(e.into())),
        };

        let outcome = self.run_locked(&adapter).await;
        drop(adapter);
        info!("Database connection closed.");

        match outcome {
            Ok(load) => {
                self.transition(PipelineState::Done);
                Ok(RunSummary {
                    state: PipelineState::Done,
                    history: self.history.clone(),
                    load,
                })
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn run_locked(&mut self, adapter: &C::Adapter) -> Result<LoadReport, PipelineError> {
        self.transition(PipelineState::Loading);

        match adapter.try_lock(self.lock_key).await {
            Ok(true) => {}
            Ok(false) => return Err(PipelineError::RunInProgress(self.lock_key)),
            Err(e) => return Err(PipelineError::Lock(e)),
        }

        let outcome = self.run_phases(adapter).await;

        if let Err(e) = adapter.unlock(self.lock_key).await {
            warn!("Failed to release run lock {}: {}", self.lock_key, e);
        }

        outcome
    }

    async fn run_phases(&mut self, adapter: &C::Adapter) -> Result<LoadReport, PipelineError> {
        let load = self.loader.load(adapter, &self.cancel).await?;

        self.transition(PipelineState::Transforming);
        self.transformer.run(adapter, &self.cancel).await?;

        Ok(load)
    }

    fn transition(&mut self, state: PipelineState) {
        match self.state() {
            Some(from) => info!("Pipeline state: {} -> {}", from, state),
            None => info!("Pipeline state: {}", state),
        }
        self.history.push(StateTransition {
            state,
            at: Utc::now(),
        });
    }

    fn fail(&mut self, err: PipelineError) -> PipelineError {
        error!("Pipeline failed during {}: {}", err.failed_in(), err);
        self.transition(PipelineState::Failed);
        err
    }
}
