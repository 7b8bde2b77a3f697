use crate::{env::EnvManager, error::ConfigError};
use std::fmt;
use tokio_postgres::{Config, config::SslMode};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_DATABASE: &str = "ecom_data";
pub const DEFAULT_USER: &str = "postgres";

const APPLICATION_NAME: &str = "sales-elt";

/// Connection parameters for the warehouse database.
#[derive(Clone, PartialEq, Eq)]
pub struct DbParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<String>,
    pub ssl_mode: SslMode,
}

impl DbParams {
    pub fn from_env(env: &EnvManager) -> Result<Self, ConfigError> {
        let mut params = DbParams::default();

        if let Some(host) = env.get("ELT_DB_HOST") {
            params.host = host.to_string();
        }
        if let Some(port) = env.get("ELT_DB_PORT") {
            params.port = parse_port(port)?;
        }
        if let Some(database) = env.get("ELT_DB_NAME") {
            params.database = database.to_string();
        }
        if let Some(user) = env.get("ELT_DB_USER") {
            params.user = user.to_string();
        }
        if let Some(password) = env.get("ELT_DB_PASSWORD") {
            params.password = Some(password.to_string());
        }
        if let Some(mode) = env.get("ELT_DB_SSLMODE") {
            params.ssl_mode = parse_ssl_mode(mode)?;
        }

        Ok(params)
    }

    pub fn to_pg_config(&self) -> Config {
        let mut config = Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .ssl_mode(self.ssl_mode)
            .application_name(APPLICATION_NAME);

        if let Some(password) = &self.password {
            config.password(password);
        }

        config
    }

    /// `host:port/database`, safe for logs.
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

impl Default for DbParams {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE.to_string(),
            user: DEFAULT_USER.to_string(),
            password: None,
            ssl_mode: SslMode::Prefer,
        }
    }
}

impl fmt::Debug for DbParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

pub fn parse_port(value: &str) -> Result<u16, ConfigError> {
    match value.trim().parse::<u16>() {
        Ok(0) => Err(ConfigError::invalid("ELT_DB_PORT", value, "port must be non-zero")),
        Ok(port) => Ok(port),
        Err(e) => Err(ConfigError::invalid("ELT_DB_PORT", value, e.to_string())),
    }
}

pub fn parse_ssl_mode(value: &str) -> Result<SslMode, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "disable" => Ok(SslMode::Disable),
        "prefer" => Ok(SslMode::Prefer),
        "require" => Ok(SslMode::Require),
        _ => Err(ConfigError::invalid(
            "ELT_DB_SSLMODE",
            value,
            "expected one of disable, prefer, require",
        )),
    }
}
