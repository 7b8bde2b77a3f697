#![allow(dead_code)]

use connectors::sql::postgres::{adapter::PgConnector, utils::connect_client};
use std::{env, str::FromStr};
use tokio_postgres::{Client, Config};
use tracing::warn;

pub mod utils;

/// Points at a disposable Postgres database. Tests are skipped when unset.
pub const TEST_PG_URL_VAR: &str = "ELT_TEST_PG_URL";

pub const STAGING_SCHEMA_SQL: &str = include_str!("../../../sql/staging_schema.sql");
pub const TRANSFORM_SQL: &str = include_str!("../../../sql/transform_data.sql");

/// A private schema holding the staging and warehouse tables for one test.
/// Every connection opened through it resolves unqualified names there.
pub struct TestDb {
    pub schema: String,
    pub config: Config,
    pub client: Client,
}

impl TestDb {
    /// Recreates schema `elt_<name>` and its tables. Returns `None` when no
    /// test database is configured.
    pub async fn setup(name: &str) -> Option<TestDb> {
        let url = match env::var(TEST_PG_URL_VAR) {
            Ok(url) if !url.is_empty() => url,
            _ => {
                warn!("{} not set, skipping {}", TEST_PG_URL_VAR, name);
                return None;
            }
        };

        let schema = format!("elt_{name}");
        let mut config = Config::from_str(&url).expect("parse test database url");
        config.options(&format!("-c search_path={schema}"));

        let client = connect_client(config.clone())
            .await
            .expect("connect postgres");

        client
            .batch_execute(&format!(
                "DROP SCHEMA IF EXISTS {schema} CASCADE; CREATE SCHEMA {schema};"
            ))
            .await
            .expect("reset test schema");
        client
            .batch_execute(STAGING_SCHEMA_SQL)
            .await
            .expect("create staging and warehouse tables");

        Some(TestDb {
            schema,
            config,
            client,
        })
    }

    pub fn connector(&self) -> PgConnector {
        PgConnector::new(self.config.clone())
    }
}
