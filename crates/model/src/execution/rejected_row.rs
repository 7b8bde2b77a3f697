use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a source row was kept out of the staged batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// A label outside the fixed value table of an enumerated column.
    InvalidEnumValue {
        column: String,
        value: Option<String>,
    },
    /// The natural key is missing.
    MissingKey { column: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::InvalidEnumValue {
                column,
                value: Some(value),
            } => write!(f, "invalid value '{value}' for column '{column}'"),
            RejectReason::InvalidEnumValue {
                column,
                value: None,
            } => write!(f, "missing value for column '{column}'"),
            RejectReason::MissingKey { column } => write!(f, "missing key column '{column}'"),
        }
    }
}

/// A source row excluded from the load, with enough context to find it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    pub line: u64,
    pub order_id: Option<String>,
    pub reason: RejectReason,
}

impl RejectedRow {
    pub fn new(line: u64, order_id: Option<String>, reason: RejectReason) -> Self {
        Self {
            line,
            order_id,
            reason,
        }
    }
}

impl fmt::Display for RejectedRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.order_id {
            Some(id) => write!(f, "line {} (order_id {id}): {}", self.line, self.reason),
            None => write!(f, "line {}: {}", self.line, self.reason),
        }
    }
}
