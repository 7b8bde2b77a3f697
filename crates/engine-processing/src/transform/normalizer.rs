use crate::transform::{
    coercion::{Coerced, ColumnRule, RecordDraft, STAGING_RULES},
    error::NormalizeError,
};
use model::{
    core::identifiers::normalize_col_name,
    execution::rejected_row::{RejectReason, RejectedRow},
    records::{
        batch::{ColumnSlot, StagedBatch, StagedRecord},
        row::{RawRow, RawTable},
    },
};
use std::collections::HashSet;
use tracing::{debug, warn};

/// The staged batch plus the repair and rejection bookkeeping of one
/// normalization pass.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub batch: StagedBatch,
    pub rejected: Vec<RejectedRow>,
    pub ages_repaired: usize,
}

/// Maps a [`RawTable`] onto the staging schema, one coercion rule per
/// typed column. Columns without a rule pass through unchanged.
pub struct Normalizer {
    rules: &'static [ColumnRule],
}

/// Resolved position of one rule's column in the source header.
struct BoundRule<'r> {
    rule: &'r ColumnRule,
    index: usize,
}

impl Normalizer {
    pub fn new() -> Self {
        Normalizer {
            rules: STAGING_RULES,
        }
    }

    pub fn normalize(&self, table: &RawTable) -> Result<NormalizedBatch, NormalizeError> {
        let columns = normalize_headers(&table.headers)?;
        let (slots, passthrough_idx) = self.layout(&columns);
        let bound = self.bind(&columns)?;

        let mut records = Vec::with_capacity(table.len());
        let mut rejected = Vec::new();
        let mut ages_repaired = 0;

        for row in &table.rows {
            let mut draft = RecordDraft::default();
            let mut repaired = 0;
            let mut reason: Option<RejectReason> = None;

            for BoundRule { rule, index } in &bound {
                match (rule.coerce)(&mut draft, row.cell(*index), row.line)? {
                    Coerced::Accepted => {}
                    Coerced::Repaired => repaired += 1,
                    Coerced::Rejected(r) => {
                        reason.get_or_insert(r);
                    }
                }
            }

            if let Some(reason) = reason {
                let rejection = RejectedRow::new(row.line, draft.order_id.clone(), reason);
                warn!("Skipping row: {}", rejection);
                rejected.push(rejection);
                continue;
            }

            ages_repaired += repaired;
            records.push(build_record(draft, row, &passthrough_idx)?);
        }

        debug!(
            "Normalized {} rows ({} rejected, {} ages repaired)",
            records.len(),
            rejected.len(),
            ages_repaired
        );

        Ok(NormalizedBatch {
            batch: StagedBatch::new(columns, slots, records),
            rejected,
            ages_repaired,
        })
    }

    /// Slot for every column, plus the source indices of passthrough columns.
    fn layout(&self, columns: &[String]) -> (Vec<ColumnSlot>, Vec<usize>) {
        let mut slots = Vec::with_capacity(columns.len());
        let mut passthrough_idx = Vec::new();

        for (idx, column) in columns.iter().enumerate() {
            match self.rules.iter().find(|r| r.column == column.as_str()) {
                Some(rule) => slots.push(rule.slot),
                None => {
                    slots.push(ColumnSlot::Passthrough(passthrough_idx.len()));
                    passthrough_idx.push(idx);
                }
            }
        }

        (slots, passthrough_idx)
    }

    fn bind(&self, columns: &[String]) -> Result<Vec<BoundRule<'static>>, NormalizeError> {
        self.rules
            .iter()
            .map(|rule| {
                columns
                    .iter()
                    .position(|c| c == rule.column)
                    .map(|index| BoundRule { rule, index })
                    .ok_or_else(|| NormalizeError::MissingColumn(rule.column.to_string()))
            })
            .collect()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_headers(headers: &[String]) -> Result<Vec<String>, NormalizeError> {
    let mut seen = HashSet::new();
    headers
        .iter()
        .enumerate()
        .map(|(pos, header)| {
            let column = normalize_col_name(header);
            if column.is_empty() {
                return Err(NormalizeError::EmptyColumnName(pos + 1));
            }
            if !seen.insert(column.clone()) {
                return Err(NormalizeError::DuplicateColumn(column));
            }
            Ok(column)
        })
        .collect()
}

fn build_record(
    draft: RecordDraft,
    row: &RawRow,
    passthrough_idx: &[usize],
) -> Result<StagedRecord, NormalizeError> {
    let passthrough = passthrough_idx
        .iter()
        .map(|idx| row.cell(*idx).map(str::to_string))
        .collect();

    match draft {
        RecordDraft {
            order_id: Some(order_id),
            order_date: Some(order_date),
            customer_age: Some(customer_age),
            returned: Some(returned),
        } => Ok(StagedRecord {
            order_id,
            order_date,
            customer_age,
            returned,
            passthrough,
        }),
        _ => Err(NormalizeError::IncompleteRecord(row.line)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use model::core::value::Value;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .enumerate()
                .map(|(i, cells)| {
                    RawRow::new(
                        i as u64 + 2,
                        cells
                            .iter()
                            .map(|c| (!c.is_empty()).then(|| c.to_string()))
                            .collect(),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn test_normalizes_headers_and_types() {
        let raw = table(
            &["Order ID", "Order Date", "Customer Age", "Returned", "Total Amount"],
            &[&["1", "2024-01-05", "34", "Yes", "19.99"]],
        );

        let out = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(
            out.batch.columns,
            vec![
                "order_id",
                "order_date",
                "customer_age",
                "returned",
                "total_amount"
            ]
        );
        let record = &out.batch.records[0];
        assert_eq!(record.order_id, "1");
        assert_eq!(
            record.order_date,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert_eq!(record.customer_age, 34);
        assert!(record.returned);
        assert_eq!(
            out.batch.row_values(record)[4],
            Value::String("19.99".into())
        );
        assert_eq!(out.ages_repaired, 0);
        assert!(out.rejected.is_empty());
    }

    #[test]
    fn test_unparseable_age_becomes_zero() {
        let raw = table(
            &["order_id", "order_date", "customer_age", "returned"],
            &[&["1", "2024-01-05", "N/A", "No"], &["2", "2024-01-05", "", "No"]],
        );

        let out = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(out.batch.len(), 2);
        assert!(out.batch.records.iter().all(|r| r.customer_age == 0));
        assert_eq!(out.ages_repaired, 2);
    }

    #[test]
    fn test_bad_date_fails_whole_batch() {
        let raw = table(
            &["order_id", "order_date", "customer_age", "returned"],
            &[
                &["1", "2024-01-05", "34", "Yes"],
                &["2", "not a date", "34", "Yes"],
            ],
        );

        let err = Normalizer::new().normalize(&raw).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::DateParse {
                line: 3,
                column: "order_date".into(),
                value: Some("not a date".into())
            }
        );
    }

    #[test]
    fn test_invalid_returned_label_is_rejected_not_defaulted() {
        let raw = table(
            &["order_id", "order_date", "customer_age", "returned"],
            &[
                &["1", "2024-01-05", "34", "Maybe"],
                &["2", "2024-01-05", "34", "No"],
            ],
        );

        let out = Normalizer::new().normalize(&raw).unwrap();
        assert_eq!(out.batch.len(), 1);
        assert_eq!(out.batch.records[0].order_id, "2");
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].line, 2);
        assert_eq!(out.rejected[0].order_id.as_deref(), Some("1"));
        assert_eq!(
            out.rejected[0].reason,
            RejectReason::InvalidEnumValue {
                column: "returned".into(),
                value: Some("Maybe".into())
            }
        );
    }

    #[test]
    fn test_rejected_rows_do_not_count_repairs() {
        let raw = table(
            &["order_id", "order_date", "customer_age", "returned"],
            &[&["1", "2024-01-05", "bad", "Maybe"]],
        );

        let out = Normalizer::new().normalize(&raw).unwrap();
        assert!(out.batch.is_empty());
        assert_eq!(out.ages_repaired, 0);
    }

    #[test]
    fn test_missing_order_id_is_rejected() {
        let raw = table(
            &["order_id", "order_date", "customer_age", "returned"],
            &[&["", "2024-01-05", "34", "Yes"]],
        );

        let out = Normalizer::new().normalize(&raw).unwrap();
        assert!(out.batch.is_empty());
        assert_eq!(
            out.rejected[0].reason,
            RejectReason::MissingKey {
                column: "order_id".into()
            }
        );
    }

    #[test]
    fn test_missing_required_column() {
        let raw = table(&["order_id", "order_date", "returned"], &[]);
        let err = Normalizer::new().normalize(&raw).unwrap_err();
        assert_eq!(err, NormalizeError::MissingColumn("customer_age".into()));
    }

    #[test]
    fn test_colliding_headers() {
        let raw = table(
            &["order_id", "Order ID", "order_date", "customer_age", "returned"],
            &[],
        );
        let err = Normalizer::new().normalize(&raw).unwrap_err();
        assert_eq!(err, NormalizeError::DuplicateColumn("order_id".into()));
    }

    #[test]
    fn test_empty_input_yields_empty_batch() {
        let raw = table(&["order_id", "order_date", "customer_age", "returned"], &[]);
        let out = Normalizer::new().normalize(&raw).unwrap();
        assert!(out.batch.is_empty());
        assert_eq!(out.batch.columns.len(), 4);
    }
}
