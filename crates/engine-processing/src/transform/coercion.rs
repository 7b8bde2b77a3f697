//! Per-column coercion rules for the staging schema.
//!
//! Each typed staging column has exactly one entry in [`STAGING_RULES`]
//! pairing the column name with its coercion function. Adding a typed column
//! means adding a field to `StagedRecord`, a slot, and one entry here.

use crate::transform::error::NormalizeError;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use model::{execution::rejected_row::RejectReason, records::batch::ColumnSlot};

/// Fields of a record being assembled from one source row.
#[derive(Debug, Default)]
pub struct RecordDraft {
    pub order_id: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub customer_age: Option<i32>,
    pub returned: Option<bool>,
}

/// Result of coercing one cell that did not fail the whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coerced {
    Accepted,
    /// The value was replaced by a default; the row is kept.
    Repaired,
    /// The row must be excluded from the batch.
    Rejected(RejectReason),
}

pub type CoerceFn = fn(&mut RecordDraft, Option<&str>, u64) -> Result<Coerced, NormalizeError>;

pub struct ColumnRule {
    pub column: &'static str,
    pub slot: ColumnSlot,
    pub coerce: CoerceFn,
}

pub const ORDER_ID: &str = "order_id";
pub const ORDER_DATE: &str = "order_date";
pub const CUSTOMER_AGE: &str = "customer_age";
pub const RETURNED: &str = "returned";

pub const STAGING_RULES: &[ColumnRule] = &[
    ColumnRule {
        column: ORDER_ID,
        slot: ColumnSlot::OrderId,
        coerce: coerce_order_id,
    },
    ColumnRule {
        column: ORDER_DATE,
        slot: ColumnSlot::OrderDate,
        coerce: coerce_order_date,
    },
    ColumnRule {
        column: CUSTOMER_AGE,
        slot: ColumnSlot::CustomerAge,
        coerce: coerce_customer_age,
    },
    ColumnRule {
        column: RETURNED,
        slot: ColumnSlot::Returned,
        coerce: coerce_returned,
    },
];

/// Label table for the `returned` column. Matching is exact.
pub const RETURNED_LABELS: &[(&str, bool)] = &[("Yes", true), ("No", false)];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m/%d/%y",
    "%m-%d-%y",
    "%d %B %Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%d-%B-%Y",
    "%b-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// `%Y` accepts one to four digits, so a two-digit year like `24` would
/// otherwise land in year 24. Full-year matches below this are discarded.
const MIN_FULL_YEAR: i32 = 1000;

fn full_year(date: NaiveDate) -> Option<NaiveDate> {
    (date.year() >= MIN_FULL_YEAR).then_some(date)
}

/// Best-effort date parsing: plain dates first, then date-times (keeping
/// only the date part), then RFC 3339 / RFC 2822 timestamps.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok().and_then(full_year))
        .or_else(|| {
            DATETIME_FORMATS.iter().find_map(|fmt| {
                NaiveDateTime::parse_from_str(raw, fmt)
                    .ok()
                    .and_then(|dt| full_year(dt.date()))
            })
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| DateTime::parse_from_rfc2822(raw).ok().map(|dt| dt.date_naive()))
}

/// Parses an age, repairing anything unusable to `0`. Returns the age and
/// whether a repair happened.
pub fn parse_age(raw: Option<&str>) -> (i32, bool) {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return (0, true);
    };

    let parsed = raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| v.trunc() as i64)
    });

    match parsed.and_then(|v| i32::try_from(v).ok()) {
        Some(age) if age >= 0 => (age, false),
        _ => (0, true),
    }
}

pub fn parse_returned(raw: &str) -> Option<bool> {
    RETURNED_LABELS
        .iter()
        .find(|(label, _)| *label == raw)
        .map(|(_, value)| *value)
}

fn coerce_order_id(
    draft: &mut RecordDraft,
    raw: Option<&str>,
    _line: u64,
) -> Result<Coerced, NormalizeError> {
    match raw.map(str::trim).filter(|r| !r.is_empty()) {
        Some(id) => {
            draft.order_id = Some(id.to_string());
            Ok(Coerced::Accepted)
        }
        None => Ok(Coerced::Rejected(RejectReason::MissingKey {
            column: ORDER_ID.to_string(),
        })),
    }
}

fn coerce_order_date(
    draft: &mut RecordDraft,
    raw: Option<&str>,
    line: u64,
) -> Result<Coerced, NormalizeError> {
    match raw.and_then(parse_date) {
        Some(date) => {
            draft.order_date = Some(date);
            Ok(Coerced::Accepted)
        }
        None => Err(NormalizeError::DateParse {
            line,
            column: ORDER_DATE.to_string(),
            value: raw.map(str::to_string),
        }),
    }
}

fn coerce_customer_age(
    draft: &mut RecordDraft,
    raw: Option<&str>,
    _line: u64,
) -> Result<Coerced, NormalizeError> {
    let (age, repaired) = parse_age(raw);
    draft.customer_age = Some(age);
    Ok(if repaired {
        Coerced::Repaired
    } else {
        Coerced::Accepted
    })
}

fn coerce_returned(
    draft: &mut RecordDraft,
    raw: Option<&str>,
    _line: u64,
) -> Result<Coerced, NormalizeError> {
    match raw.and_then(parse_returned) {
        Some(flag) => {
            draft.returned = Some(flag);
            Ok(Coerced::Accepted)
        }
        None => Ok(Coerced::Rejected(RejectReason::InvalidEnumValue {
            column: RETURNED.to_string(),
            value: raw.map(str::to_string),
        })),
    }
}
