use crate::sql::base::error::DbError;
use chrono::NaiveDate;
use model::core::value::Value;
use tokio_postgres::{Row as PgRow, types::Type};
use tracing::warn;

/// Decodes every column of `row`. Unsupported column types decode to
/// `Value::Null` with a warning; cast them to text in the query instead.
pub fn row_values(row: &PgRow) -> Result<Vec<Value>, DbError> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| column_value(row, idx, column.type_(), column.name()))
        .collect()
}

fn column_value(row: &PgRow, idx: usize, ty: &Type, name: &str) -> Result<Value, DbError> {
    let value = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx)?.map(Value::Boolean)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx)?
            .map(|v| Value::Int(i64::from(v)))
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx)?
            .map(|v| Value::Int(i64::from(v)))
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx)?.map(Value::Int)
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)?
            .map(|v| Value::Float(f64::from(v)))
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx)?.map(Value::Float)
    } else if *ty == Type::DATE {
        row.try_get::<_, Option<NaiveDate>>(idx)?.map(Value::Date)
    } else if *ty == Type::TEXT
        || *ty == Type::VARCHAR
        || *ty == Type::BPCHAR
        || *ty == Type::NAME
    {
        row.try_get::<_, Option<String>>(idx)?.map(Value::String)
    } else {
        warn!("Unsupported column type '{}' for column '{}'", ty.name(), name);
        None
    };

    Ok(value.unwrap_or(Value::Null))
}
