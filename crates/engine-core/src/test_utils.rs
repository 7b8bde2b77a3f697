use async_trait::async_trait;
use connectors::sql::base::{
    adapter::{Connector, SqlAdapter},
    error::{ConnectorError, DbError},
    requests::ReplaceRowsRequest,
};
use model::core::value::Value;
use std::{
    io::Write,
    sync::{Arc, Mutex},
    time::Duration,
};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

pub fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

/// Call recorded by [`FakeWarehouse`], in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    TryLock(i64),
    Unlock(i64),
    ReplaceRows { table: String, rows: usize },
    Script(String),
    Query(String),
}

#[derive(Default)]
struct WarehouseState {
    staged_columns: Vec<String>,
    staged: Vec<Vec<Value>>,
    warehouse_scripts: Vec<String>,
    calls: Vec<Call>,
    lock_holder: bool,
    lock_taken_elsewhere: bool,
    reject_value: Option<String>,
    fail_script: bool,
    load_stall: Option<Duration>,
    script_stall: Option<Duration>,
    query_result: Vec<Vec<Value>>,
}

/// In-memory stand-in for one warehouse session. Clones share state, so a
/// test can keep a handle while the pipeline owns another.
#[derive(Clone, Default)]
pub struct FakeWarehouse {
    state: Arc<Mutex<WarehouseState>>,
}

impl FakeWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_staging(&self, rows: Vec<Vec<Value>>) {
        self.state.lock().unwrap().staged = rows;
    }

    /// Any COPY containing this text value fails like a type mismatch.
    pub fn reject_value(&self, value: &str) {
        self.state.lock().unwrap().reject_value = Some(value.to_string());
    }

    pub fn fail_scripts(&self) {
        self.state.lock().unwrap().fail_script = true;
    }

    /// Loads stay in flight this long before committing.
    pub fn stall_loads(&self, stall: Duration) {
        self.state.lock().unwrap().load_stall = Some(stall);
    }

    /// Scripts stay in flight this long before committing.
    pub fn stall_scripts(&self, stall: Duration) {
        self.state.lock().unwrap().script_stall = Some(stall);
    }

    pub fn hold_lock_elsewhere(&self) {
        self.state.lock().unwrap().lock_taken_elsewhere = true;
    }

    pub fn set_query_result(&self, rows: Vec<Vec<Value>>) {
        self.state.lock().unwrap().query_result = rows;
    }

    pub fn staged_rows(&self) -> Vec<Vec<Value>> {
        self.state.lock().unwrap().staged.clone()
    }

    pub fn staged_columns(&self) -> Vec<String> {
        self.state.lock().unwrap().staged_columns.clone()
    }

    pub fn committed_scripts(&self) -> Vec<String> {
        self.state.lock().unwrap().warehouse_scripts.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn replace_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::ReplaceRows { .. }))
            .count()
    }

    pub fn script_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Script(_)))
            .count()
    }

    pub fn lock_held(&self) -> bool {
        self.state.lock().unwrap().lock_holder
    }

    /// Waits out `stall` unless `cancel` fires first, in which case the
    /// open transaction is dropped without touching any state.
    async fn in_flight(stall: Option<Duration>, cancel: &CancellationToken) -> Result<(), DbError> {
        if cancel.is_cancelled() {
            return Err(DbError::Cancelled);
        }
        let Some(stall) = stall else {
            return Ok(());
        };
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DbError::Cancelled),
            _ = tokio::time::sleep(stall) => Ok(()),
        }
    }
}

#[async_trait]
impl SqlAdapter for FakeWarehouse {
    async fn query_rows(&self, sql: &str) -> Result<Vec<Vec<Value>>, DbError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Query(sql.to_string()));
        Ok(state.query_result.clone())
    }

    async fn replace_rows(
        &self,
        request: ReplaceRowsRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<u64, DbError> {
        let stall = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::ReplaceRows {
                table: request.table.to_string(),
                rows: request.rows.len(),
            });
            state.load_stall
        };
        Self::in_flight(stall, cancel).await?;

        let mut state = self.state.lock().unwrap();
        // Validate everything before touching the table; failure leaves it as is.
        if let Some(bad) = &state.reject_value {
            let hit = request
                .rows
                .iter()
                .flatten()
                .any(|v| matches!(v, Value::String(s) if s == bad));
            if hit {
                return Err(DbError::Write(format!("invalid input syntax: \"{}\"", bad)));
            }
        }

        state.staged_columns = request.columns.to_vec();
        state.staged = request.rows.to_vec();
        Ok(request.rows.len() as u64)
    }

    async fn exec_script_tx(
        &self,
        script: &str,
        cancel: &CancellationToken,
    ) -> Result<(), DbError> {
        let stall = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::Script(script.to_string()));
            state.script_stall
        };
        Self::in_flight(stall, cancel).await?;

        let mut state = self.state.lock().unwrap();
        if state.fail_script {
            return Err(DbError::Write("relation \"dim_customers\" does not exist".into()));
        }

        state.warehouse_scripts.push(script.to_string());
        Ok(())
    }

    async fn try_lock(&self, key: i64) -> Result<bool, DbError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::TryLock(key));
        if state.lock_taken_elsewhere {
            return Ok(false);
        }
        state.lock_holder = true;
        Ok(true)
    }

    async fn unlock(&self, key: i64) -> Result<(), DbError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Unlock(key));
        state.lock_holder = false;
        Ok(())
    }
}

/// Hands out sessions on a shared [`FakeWarehouse`], or fails to connect.
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub warehouse: FakeWarehouse,
    pub refuse: bool,
}

impl FakeConnector {
    pub fn new(warehouse: FakeWarehouse) -> Self {
        FakeConnector {
            warehouse,
            refuse: false,
        }
    }

    pub fn refusing() -> Self {
        FakeConnector {
            warehouse: FakeWarehouse::new(),
            refuse: true,
        }
    }
}

#[async_trait]
impl Connector for FakeConnector {
    type Adapter = FakeWarehouse;

    async fn connect(&self) -> Result<FakeWarehouse, ConnectorError> {
        if self.refuse {
            return Err(ConnectorError::Other("connection refused".into()));
        }
        Ok(self.warehouse.clone())
    }
}
