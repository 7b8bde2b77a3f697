use crate::sql::base::encoder::CopyValueEncoder;
use model::core::{utils::escape_csv_string, value::Value};

/// Encodes values for `COPY ... WITH (FORMAT csv, NULL '\N')`.
#[derive(Debug, Default)]
pub struct PgCopyValueEncoder;

impl PgCopyValueEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl CopyValueEncoder for PgCopyValueEncoder {
    fn encode_value(&self, value: &Value) -> String {
        match value {
            Value::Null => self.encode_null(),
            Value::String(s) => escape_csv_string(s),
            Value::Boolean(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    fn encode_null(&self) -> String {
        "\\N".to_string()
    }
}
