use crate::error::CliError;
use async_trait::async_trait;
use connectors::sql::postgres::utils::connect_client;
use engine_config::settings::connection::DbParams;
use tokio_postgres::SimpleQueryMessage;
use tracing::{error, info};

/// Trait for "pinging" a database
#[async_trait]
pub trait ConnectionPinger {
    /// Attempts to ping; returns Err if unreachable
    async fn ping(&self) -> Result<(), CliError>;
}

/// Postgres pinger
pub struct PostgresConnectionPinger {
    pub params: DbParams,
}

#[async_trait]
impl ConnectionPinger for PostgresConnectionPinger {
    async fn ping(&self) -> Result<(), CliError> {
        let target = self.params.target();
        info!("Pinging Postgres at '{}'", target);

        let client = connect_client(self.params.to_pg_config())
            .await
            .inspect_err(|e| error!("Postgres connection to '{}' failed: {}", target, e))?;

        let messages = client
            .simple_query("SELECT 1")
            .await
            .inspect_err(|e| error!("Postgres ping query on '{}' failed: {}", target, e))?;

        let answered = messages.iter().any(|m| match m {
            SimpleQueryMessage::Row(row) => row.get(0) == Some("1"),
            _ => false,
        });

        if !answered {
            return Err(CliError::Unexpected(format!(
                "Postgres at '{}' returned an unexpected ping result",
                target
            )));
        }

        info!("Postgres ping to '{}' succeeded", target);
        Ok(())
    }
}
