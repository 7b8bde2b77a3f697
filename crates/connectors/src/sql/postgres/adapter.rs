use crate::sql::{
    base::{
        adapter::{Connector, SqlAdapter},
        dialect,
        encoder::CopyValueEncoder,
        error::{ConnectorError, DbError},
        query::generator::QueryGenerator,
        requests::ReplaceRowsRequest,
    },
    postgres::{
        encoder::PgCopyValueEncoder,
        row::row_values,
        utils::{SessionTls, cancel_query, connect_session},
    },
};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, pin_mut};
use model::core::{identifiers::is_plain_identifier, value::Value};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tokio_postgres::{CancelToken, Client, Config, Transaction};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const QUERY_TRY_ADVISORY_LOCK_SQL: &str = "SELECT pg_try_advisory_lock($1)";
const QUERY_ADVISORY_UNLOCK_SQL: &str = "SELECT pg_advisory_unlock($1)";

#[derive(Clone)]
pub struct PgAdapter {
    client: Arc<RwLock<Client>>,
    tls: SessionTls,
    dialect: dialect::Postgres,
}

impl PgAdapter {
    pub async fn connect(config: Config) -> Result<Self, ConnectorError> {
        let (client, tls) = connect_session(config).await?;
        Ok(PgAdapter::from_session(client, tls))
    }

    pub fn from_session(client: Client, tls: SessionTls) -> Self {
        PgAdapter {
            client: Arc::new(RwLock::new(client)),
            tls,
            dialect: dialect::Postgres,
        }
    }

    pub async fn lock_client(&self) -> RwLockWriteGuard<'_, Client> {
        self.client.write().await
    }

    async fn copy_rows(
        tx: &Transaction<'_>,
        statement: &str,
        rows: &[Vec<Value>],
        chunk_rows: usize,
    ) -> Result<u64, DbError> {
        let encoder = PgCopyValueEncoder::new();
        let sink = tx.copy_in::<_, Bytes>(statement).await?;
        pin_mut!(sink);

        for chunk in rows.chunks(chunk_rows.max(1)) {
            let mut data = String::new();
            for row in chunk {
                data.push_str(&encoder.encode_row(row));
            }
            sink.as_mut().send(Bytes::from(data)).await?;
        }

        let written = sink.as_mut().finish().await?;
        Ok(written)
    }

    /// Stops the statement still running on the server so the rollback that
    /// follows does not queue behind it.
    async fn abort_in_flight(&self, token: &CancelToken) -> DbError {
        match cancel_query(token, &self.tls).await {
            Ok(()) => debug!("Sent cancel request for the in-flight statement"),
            Err(err) => warn!(%err, "Cancel request failed, waiting for the statement to finish"),
        }
        DbError::Cancelled
    }
}

/// Commits on success. On failure rolls back and returns the original error;
/// a failed rollback is only logged since the server discards the
/// transaction when the session ends anyway.
async fn finish_tx<T>(tx: Transaction<'_>, outcome: Result<T, DbError>) -> Result<T, DbError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(%rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}

#[async_trait]
impl SqlAdapter for PgAdapter {
    async fn query_rows(&self, sql: &str) -> Result<Vec<Vec<Value>>, DbError> {
        let client = self.client.read().await;
        let rows = client.query(sql, &[]).await?;
        rows.iter().map(row_values).collect()
    }

    async fn replace_rows(
        &self,
        request: ReplaceRowsRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<u64, DbError> {
        if !is_plain_identifier(request.table) {
            return Err(DbError::InvalidIdentifier(request.table.to_string()));
        }
        if request.columns.is_empty() {
            return Err(DbError::Write("no columns to load".to_string()));
        }

        let generator = QueryGenerator::new(&self.dialect);
        let truncate = generator.truncate(request.table);
        let copy = generator.copy_from_stdin(request.table, request.columns);

        debug!("COPY statement: {}", copy);

        let mut client = self.lock_client().await;
        let cancel_token = client.cancel_token();
        let tx = client.transaction().await?;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(self.abort_in_flight(&cancel_token).await),
            result = async {
                tx.batch_execute(&truncate).await?;
                if request.rows.is_empty() {
                    return Ok::<u64, DbError>(0);
                }
                Self::copy_rows(&tx, &copy, request.rows, request.chunk_rows).await
            } => result,
        };

        finish_tx(tx, outcome).await
    }

    async fn exec_script_tx(
        &self,
        script: &str,
        cancel: &CancellationToken,
    ) -> Result<(), DbError> {
        let mut client = self.lock_client().await;
        let cancel_token = client.cancel_token();
        let tx = client.transaction().await?;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(self.abort_in_flight(&cancel_token).await),
            result = tx.batch_execute(script) => result.map_err(DbError::from),
        };

        finish_tx(tx, outcome).await
    }

    async fn try_lock(&self, key: i64) -> Result<bool, DbError> {
        let client = self.client.read().await;
        let row = client.query_one(QUERY_TRY_ADVISORY_LOCK_SQL, &[&key]).await?;
        Ok(row.try_get(0)?)
    }

    async fn unlock(&self, key: i64) -> Result<(), DbError> {
        let client = self.client.read().await;
        let row = client.query_one(QUERY_ADVISORY_UNLOCK_SQL, &[&key]).await?;
        let released: bool = row.try_get(0)?;
        if !released {
            warn!("Advisory lock {} was not held by this session", key);
        }
        Ok(())
    }
}

/// Opens one [`PgAdapter`] session per call.
#[derive(Clone)]
pub struct PgConnector {
    config: Config,
}

impl PgConnector {
    pub fn new(config: Config) -> Self {
        PgConnector { config }
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Adapter = PgAdapter;

    async fn connect(&self) -> Result<PgAdapter, ConnectorError> {
        PgAdapter::connect(self.config.clone()).await
    }
}
