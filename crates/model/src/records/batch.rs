use crate::core::value::Value;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A row normalized to the staging table schema.
///
/// The four typed fields are the columns with coercion rules; every other
/// source column is carried verbatim in `passthrough`, aligned with the
/// passthrough slots of the owning [`StagedBatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedRecord {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub customer_age: i32,
    pub returned: bool,
    pub passthrough: Vec<Option<String>>,
}

/// Where the value of a staging column comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnSlot {
    OrderId,
    OrderDate,
    CustomerAge,
    Returned,
    Passthrough(usize),
}

/// Staging column layout in source order plus the records to load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StagedBatch {
    pub columns: Vec<String>,
    pub slots: Vec<ColumnSlot>,
    pub records: Vec<StagedRecord>,
}

impl StagedBatch {
    pub fn new(columns: Vec<String>, slots: Vec<ColumnSlot>, records: Vec<StagedRecord>) -> Self {
        StagedBatch {
            columns,
            slots,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Values of `record` in column order.
    pub fn row_values(&self, record: &StagedRecord) -> Vec<Value> {
        self.slots
            .iter()
            .map(|slot| match slot {
                ColumnSlot::OrderId => Value::String(record.order_id.clone()),
                ColumnSlot::OrderDate => Value::Date(record.order_date),
                ColumnSlot::CustomerAge => Value::Int(i64::from(record.customer_age)),
                ColumnSlot::Returned => Value::Boolean(record.returned),
                ColumnSlot::Passthrough(idx) => {
                    Value::from(record.passthrough.get(*idx).cloned().flatten())
                }
            })
            .collect()
    }

    /// All rows as value vectors, in record order.
    pub fn rows(&self) -> Vec<Vec<Value>> {
        self.records.iter().map(|r| self.row_values(r)).collect()
    }
}
