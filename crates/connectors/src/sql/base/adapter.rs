use crate::sql::base::{
    error::{ConnectorError, DbError},
    requests::ReplaceRowsRequest,
};
use async_trait::async_trait;
use model::core::value::Value;
use tokio_util::sync::CancellationToken;

/// Operations the pipeline needs from one open database session.
///
/// Both write operations run inside a single transaction each: they either
/// commit fully or roll back and leave the database as it was. Cancelling
/// `cancel` while one is in flight aborts the running statement, rolls the
/// transaction back and yields [`DbError::Cancelled`].
#[async_trait]
pub trait SqlAdapter: Send + Sync {
    /// Read-only query; every column decoded into a [`Value`].
    async fn query_rows(&self, sql: &str) -> Result<Vec<Vec<Value>>, DbError>;

    /// Removes all rows of `request.table` and inserts `request.rows` in
    /// one transaction. Returns the number of rows inserted.
    async fn replace_rows(
        &self,
        request: ReplaceRowsRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<u64, DbError>;

    /// Runs `script` verbatim inside one transaction.
    async fn exec_script_tx(&self, script: &str, cancel: &CancellationToken)
    -> Result<(), DbError>;

    /// Session-level mutual exclusion; returns false when another session
    /// holds `key`.
    async fn try_lock(&self, key: i64) -> Result<bool, DbError>;
    async fn unlock(&self, key: i64) -> Result<(), DbError>;
}

/// Opens a new [`SqlAdapter`] session. The session is closed when the
/// returned adapter is dropped.
#[async_trait]
pub trait Connector: Send + Sync {
    type Adapter: SqlAdapter;

    async fn connect(&self) -> Result<Self::Adapter, ConnectorError>;
}
