use model::records::batch::StagedBatch;
use std::collections::HashSet;
use tracing::info;

/// A batch with at most one record per `order_id`.
#[derive(Debug, Clone, Default)]
pub struct GateOutcome {
    pub batch: StagedBatch,
    pub dropped: usize,
}

/// Keeps the first record per `order_id` and drops later ones. Never fails;
/// an empty batch passes through as an empty batch.
pub fn deduplicate(mut batch: StagedBatch) -> GateOutcome {
    let before = batch.records.len();
    let mut seen = HashSet::with_capacity(before);
    batch
        .records
        .retain(|record| seen.insert(record.order_id.clone()));

    let dropped = before - batch.records.len();
    if dropped > 0 {
        info!("Dropped {} duplicate rows.", dropped);
    }

    GateOutcome { batch, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use model::records::batch::{ColumnSlot, StagedRecord};
    use tracing_test::traced_test;

    fn record(id: &str, day: u32, age: i32) -> StagedRecord {
        StagedRecord {
            order_id: id.to_string(),
            order_date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            customer_age: age,
            returned: false,
            passthrough: vec![],
        }
    }

    fn batch(records: Vec<StagedRecord>) -> StagedBatch {
        StagedBatch::new(
            vec!["order_id".into()],
            vec![ColumnSlot::OrderId],
            records,
        )
    }

    #[traced_test]
    #[test]
    fn test_first_occurrence_wins() {
        let outcome = deduplicate(batch(vec![
            record("1", 5, 34),
            record("2", 5, 20),
            record("1", 6, 0),
            record("1", 7, 50),
            record("3", 8, 41),
            record("2", 9, 22),
        ]));

        let ids = outcome
            .batch
            .records
            .iter()
            .map(|r| r.order_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(outcome.batch.records[0].customer_age, 34);
        assert_eq!(outcome.batch.records[1].customer_age, 20);
        // (3 - 1) + (2 - 1)
        assert_eq!(outcome.dropped, 3);
        assert!(logs_contain("Dropped 3 duplicate rows."));
    }

    #[traced_test]
    #[test]
    fn test_no_duplicates_logs_nothing() {
        let outcome = deduplicate(batch(vec![record("1", 5, 1), record("2", 5, 2)]));
        assert_eq!(outcome.dropped, 0);
        assert_eq!(outcome.batch.len(), 2);
        assert!(!logs_contain("duplicate rows"));
    }

    #[test]
    fn test_empty_batch() {
        let outcome = deduplicate(batch(vec![]));
        assert_eq!(outcome.dropped, 0);
        assert!(outcome.batch.is_empty());
    }
}
