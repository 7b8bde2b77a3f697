use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// Any Postgres driver error, preserved as the underlying cause.
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Writing rows to the database failed at the application level.
    #[error("Write error: {0}")]
    Write(String),

    /// A table or column name that cannot be used in generated SQL.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The surrounding run was cancelled; the open transaction was rolled back.
    #[error("Operation cancelled, transaction rolled back")]
    Cancelled,
}

/// Errors happening during connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Postgres connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Connection failed: {0}")]
    Other(String),
}
