use crate::sql::base::error::ConnectorError;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::future::Future;
use tokio_postgres::{CancelToken, Client, Config, NoTls, config::SslMode};
use tracing::{debug, error, warn};

/// Transport a session was opened with. Cancel requests travel over a fresh
/// connection and must use the same one.
#[derive(Clone)]
pub enum SessionTls {
    Plain,
    Tls(MakeTlsConnector),
}

pub async fn connect_client(config: Config) -> Result<Client, ConnectorError> {
    let (client, _) = connect_session(config).await?;
    Ok(client)
}

/// Opens a session honouring the config's ssl mode. `prefer` falls back to a
/// plain connection when the TLS handshake fails.
pub async fn connect_session(config: Config) -> Result<(Client, SessionTls), ConnectorError> {
    debug!(
        hosts = ?config.get_hosts(),
        dbname = config.get_dbname().unwrap_or_default(),
        ssl_mode = ?config.get_ssl_mode(),
        "Opening Postgres session"
    );

    match config.get_ssl_mode() {
        SslMode::Disable => connect_plain(&config).await,
        SslMode::Prefer => match connect_tls(&config).await {
            Ok(client) => Ok(client),
            Err(error) => {
                warn!(%error, "Postgres TLS handshake failed, retrying without TLS");
                connect_plain(&config).await
            }
        },
        _ => connect_tls(&config).await,
    }
}

async fn connect_tls(config: &Config) -> Result<(Client, SessionTls), ConnectorError> {
    let tls = MakeTlsConnector::new(TlsConnector::builder().build()?);
    let (client, connection) = config.connect(tls.clone()).await?;
    drive(connection);
    Ok((client, SessionTls::Tls(tls)))
}

async fn connect_plain(config: &Config) -> Result<(Client, SessionTls), ConnectorError> {
    let (client, connection) = config.connect(NoTls).await?;
    drive(connection);
    Ok((client, SessionTls::Plain))
}

/// Asks the server to abort whatever statement the session is running.
pub async fn cancel_query(
    token: &CancelToken,
    tls: &SessionTls,
) -> Result<(), tokio_postgres::Error> {
    match tls {
        SessionTls::Plain => token.cancel_query(NoTls).await,
        SessionTls::Tls(connector) => token.cancel_query(connector.clone()).await,
    }
}

/// The connection half performs the actual I/O and must be polled for the
/// client to make progress. It finishes once the client is dropped.
fn drive<F>(connection: F)
where
    F: Future<Output = Result<(), tokio_postgres::Error>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
}
