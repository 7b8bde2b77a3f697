use crate::{env::EnvManager, error::ConfigError};
use connection::DbParams;
use model::core::identifiers::is_plain_identifier;
use std::path::PathBuf;
use tracing::debug;

pub mod connection;

pub const DEFAULT_SOURCE_PATH: &str = "data/raw/ecommerce_sales_34500.csv";
pub const DEFAULT_SCRIPT_PATH: &str = "sql/transform_data.sql";
pub const DEFAULT_STAGING_TABLE: &str = "staging_ecommerce_sales";
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_DELIMITER: u8 = b',';

/// Every variable read by [`PipelineSettings::from_env`].
pub const ENV_KEYS: &[&str] = &[
    "ELT_DB_HOST",
    "ELT_DB_PORT",
    "ELT_DB_NAME",
    "ELT_DB_USER",
    "ELT_DB_PASSWORD",
    "ELT_DB_SSLMODE",
    "ELT_SOURCE_PATH",
    "ELT_SCRIPT_PATH",
    "ELT_STAGING_TABLE",
    "ELT_BATCH_SIZE",
    "ELT_LOCK_KEY",
    "ELT_DELIMITER",
];

/// Advisory lock key shared by every run against the same warehouse
/// (ASCII "ELTSTAGE").
pub const DEFAULT_LOCK_KEY: i64 = 0x454C_5453_5441_4745;

/// Everything a pipeline run needs besides the cancellation signal.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub db: DbParams,
    pub source_path: PathBuf,
    pub script_path: PathBuf,
    pub staging_table: String,
    pub batch_size: usize,
    pub lock_key: i64,
    pub delimiter: u8,
}

/// Values supplied on the command line. Every field left `None` falls back
/// to the environment and then to the defaults.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub source_path: Option<PathBuf>,
    pub script_path: Option<PathBuf>,
    pub staging_table: Option<String>,
    pub batch_size: Option<usize>,
}

impl PipelineSettings {
    pub fn from_env(env: &EnvManager) -> Result<Self, ConfigError> {
        let mut settings = PipelineSettings {
            db: DbParams::from_env(env)?,
            ..PipelineSettings::default()
        };

        if let Some(path) = env.get("ELT_SOURCE_PATH") {
            settings.source_path = PathBuf::from(path);
        }
        if let Some(path) = env.get("ELT_SCRIPT_PATH") {
            settings.script_path = PathBuf::from(path);
        }
        if let Some(table) = env.get("ELT_STAGING_TABLE") {
            settings.staging_table = fold_table_name(table);
        }
        if let Some(size) = env.get("ELT_BATCH_SIZE") {
            settings.batch_size = size
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    ConfigError::invalid("ELT_BATCH_SIZE", size, e.to_string())
                })?;
        }
        if let Some(key) = env.get("ELT_LOCK_KEY") {
            settings.lock_key = key
                .trim()
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    ConfigError::invalid("ELT_LOCK_KEY", key, e.to_string())
                })?;
        }
        if let Some(delimiter) = env.get("ELT_DELIMITER") {
            settings.delimiter = parse_delimiter(delimiter)?;
        }

        settings.validate()?;
        debug!("Resolved pipeline settings: {:?}", settings);
        Ok(settings)
    }

    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Result<Self, ConfigError> {
        if let Some(path) = overrides.source_path {
            self.source_path = path;
        }
        if let Some(path) = overrides.script_path {
            self.script_path = path;
        }
        if let Some(table) = overrides.staging_table {
            self.staging_table = fold_table_name(&table);
        }
        if let Some(size) = overrides.batch_size {
            self.batch_size = size;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::invalid(
                "ELT_BATCH_SIZE",
                "0",
                "batch size must be at least 1",
            ));
        }
        if !is_plain_identifier(&self.staging_table) {
            return Err(ConfigError::invalid(
                "ELT_STAGING_TABLE",
                &self.staging_table,
                "expected [schema.]table made of letters, digits and underscores",
            ));
        }
        Ok(())
    }
}

/// The table name is quoted when used, so it is folded to lower case here to
/// address the same table an unquoted `CREATE TABLE` produced.
fn fold_table_name(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            db: DbParams::default(),
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            script_path: PathBuf::from(DEFAULT_SCRIPT_PATH),
            staging_table: DEFAULT_STAGING_TABLE.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            lock_key: DEFAULT_LOCK_KEY,
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

fn parse_delimiter(value: &str) -> Result<u8, ConfigError> {
    let raw = if value == "\\t" { "\t" } else { value };
    match raw.as_bytes() {
        [byte] if byte.is_ascii() && *byte != b'"' && *byte != b'\n' => Ok(*byte),
        _ => Err(ConfigError::invalid(
            "ELT_DELIMITER",
            value,
            "delimiter must be a single ASCII character",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> EnvManager {
        EnvManager::from_vars(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())))
    }

    #[test]
    fn test_defaults() {
        let settings = PipelineSettings::from_env(&env(&[])).unwrap();
        assert_eq!(settings.source_path, PathBuf::from(DEFAULT_SOURCE_PATH));
        assert_eq!(settings.script_path, PathBuf::from(DEFAULT_SCRIPT_PATH));
        assert_eq!(settings.staging_table, "staging_ecommerce_sales");
        assert_eq!(settings.batch_size, 1000);
        assert_eq!(settings.lock_key, DEFAULT_LOCK_KEY);
        assert_eq!(settings.delimiter, b',');
    }

    #[test]
    fn test_env_values() {
        let settings = PipelineSettings::from_env(&env(&[
            ("ELT_SOURCE_PATH", "/tmp/in.csv"),
            ("ELT_STAGING_TABLE", "landing.sales"),
            ("ELT_BATCH_SIZE", "250"),
            ("ELT_LOCK_KEY", "-42"),
            ("ELT_DELIMITER", "\\t"),
        ]))
        .unwrap();

        assert_eq!(settings.source_path, PathBuf::from("/tmp/in.csv"));
        assert_eq!(settings.staging_table, "landing.sales");
        assert_eq!(settings.batch_size, 250);
        assert_eq!(settings.lock_key, -42);
        assert_eq!(settings.delimiter, b'\t');
    }

    #[test]
    fn test_overrides_win_over_env() {
        let settings = PipelineSettings::from_env(&env(&[("ELT_BATCH_SIZE", "250")]))
            .unwrap()
            .with_overrides(SettingsOverrides {
                batch_size: Some(10),
                staging_table: Some("stage_b".to_string()),
                ..SettingsOverrides::default()
            })
            .unwrap();

        assert_eq!(settings.batch_size, 10);
        assert_eq!(settings.staging_table, "stage_b");
    }

    #[test]
    fn test_staging_table_folds_to_lower_case() {
        let vars = env(&[("ELT_STAGING_TABLE", "Landing.Staging_Sales")]);
        let settings = PipelineSettings::from_env(&vars).unwrap();
        assert_eq!(settings.staging_table, "landing.staging_sales");

        let settings = settings
            .with_overrides(SettingsOverrides {
                staging_table: Some(" Stage_B ".to_string()),
                ..SettingsOverrides::default()
            })
            .unwrap();
        assert_eq!(settings.staging_table, "stage_b");
    }

    #[test]
    fn test_rejects_invalid_values() {
        for vars in [
            [("ELT_BATCH_SIZE", "0")],
            [("ELT_BATCH_SIZE", "many")],
            [("ELT_DELIMITER", ";;")],
            [("ELT_STAGING_TABLE", "sales; DROP TABLE x")],
            [("ELT_DB_PORT", "http")],
        ] {
            let result = PipelineSettings::from_env(&env(&vars));
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { .. })),
                "expected invalid value for {:?}",
                vars
            );
        }
    }
}
