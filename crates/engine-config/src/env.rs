use crate::error::ConfigError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Environment variable manager that loads from the process environment and
/// `.env` files. Values read from a file override process values.
#[derive(Debug, Clone)]
pub struct EnvManager {
    vars: HashMap<String, String>,
    sensitive_patterns: Vec<String>,
}

impl EnvManager {
    pub fn new() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            sensitive_patterns: Self::default_sensitive_patterns(),
        }
    }

    /// Load variables from a .env file
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::EnvFileRead {
            path: path.display().to_string(),
            source,
        })?;

        self.parse_env_content(&content)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn is_sensitive(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.sensitive_patterns.iter().any(|p| key.contains(p.as_str()))
    }

    /// Value safe to print: sensitive keys are masked.
    pub fn display_value(&self, key: &str) -> Option<String> {
        self.get(key).map(|v| {
            if self.is_sensitive(key) {
                "********".to_string()
            } else {
                v.to_string()
            }
        })
    }

    fn parse_env_content(&mut self, content: &str) -> Result<(), ConfigError> {
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = line.strip_prefix("export ").unwrap_or(line);

            let Some(eq_pos) = line.find('=') else {
                return Err(ConfigError::EnvFileFormat(format!(
                    "malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };

            let key = line[..eq_pos].trim();
            if key.is_empty() {
                return Err(ConfigError::EnvFileFormat(format!(
                    "empty key at line {}",
                    line_num + 1
                )));
            }

            let value = Self::unquote_value(&line[eq_pos + 1..]);
            self.vars.insert(key.to_string(), value);
        }

        Ok(())
    }

    fn unquote_value(value: &str) -> String {
        let value = value.trim();

        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            return value[1..value.len() - 1].to_string();
        }

        value.to_string()
    }

    fn default_sensitive_patterns() -> Vec<String> {
        ["password", "passwd", "secret", "token", "credential"]
            .iter()
            .map(|p| p.to_string())
            .collect()
    }
}

impl Default for EnvManager {
    fn default() -> Self {
        Self::new()
    }
}
