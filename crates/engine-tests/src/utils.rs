#![allow(dead_code)]

use crate::{TRANSFORM_SQL, TestDb};
use chrono::NaiveDate;
use connectors::file::csv::{settings::CsvSettings, source::CsvSource};
use engine_core::{
    error::PipelineError,
    pipeline::{Pipeline, RunSummary},
    staging::StagingLoader,
    transformer::Transformer,
};
use connectors::sql::postgres::adapter::PgConnector;
use std::io::Write;
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

pub const STAGING_TABLE: &str = "staging_ecommerce_sales";

/// Source header as exported by the sales system: title case with spaces.
pub const SALES_HEADER: &str = "Order ID,Customer ID,Product ID,Category,Price,Discount,Quantity,\
Payment Method,Order Date,Delivery Time Days,Region,Returned,Total Amount,Shipping Cost,Profit,\
Customer Age,Customer Gender";

/// One source line. `quantity` is kept as text so tests can inject values
/// the staging column rejects.
pub struct SaleLine<'a> {
    pub order_id: &'a str,
    pub customer_id: &'a str,
    pub order_date: &'a str,
    pub quantity: &'a str,
    pub region: &'a str,
    pub returned: &'a str,
    pub total_amount: &'a str,
    pub customer_age: &'a str,
    pub customer_gender: &'a str,
}

impl Default for SaleLine<'_> {
    fn default() -> Self {
        SaleLine {
            order_id: "1",
            customer_id: "C1",
            order_date: "2024-01-05",
            quantity: "2",
            region: "North",
            returned: "No",
            total_amount: "100.00",
            customer_age: "34",
            customer_gender: "Female",
        }
    }
}

impl SaleLine<'_> {
    pub fn render(&self) -> String {
        format!(
            "{},{},P1,Electronics,50.00,0.00,{},Credit Card,{},3,{},{},{},5.00,20.00,{},{}",
            self.order_id,
            self.customer_id,
            self.quantity,
            self.order_date,
            self.region,
            self.returned,
            self.total_amount,
            self.customer_age,
            self.customer_gender
        )
    }
}

pub fn write_sales_csv(lines: &[SaleLine<'_>]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp csv");
    writeln!(file, "{}", SALES_HEADER).expect("write header");
    for line in lines {
        writeln!(file, "{}", line.render()).expect("write row");
    }
    file
}

pub fn pipeline(db: &TestDb, input: &NamedTempFile, lock_key: i64) -> Pipeline<PgConnector> {
    pipeline_with(
        db,
        input,
        Transformer::from_sql(TRANSFORM_SQL),
        lock_key,
        CancellationToken::new(),
    )
}

pub fn pipeline_with(
    db: &TestDb,
    input: &NamedTempFile,
    transformer: Transformer,
    lock_key: i64,
    cancel: CancellationToken,
) -> Pipeline<PgConnector> {
    let loader = StagingLoader::new(
        CsvSource::new(input.path(), CsvSettings::default()),
        STAGING_TABLE,
    )
    .with_batch_size(2);
    Pipeline::new(db.connector(), loader, transformer, lock_key, cancel)
}

pub async fn run(
    db: &TestDb,
    input: &NamedTempFile,
    lock_key: i64,
) -> Result<RunSummary, PipelineError> {
    pipeline(db, input, lock_key).run().await
}

/// The typed staging columns, ordered by `order_id`.
pub async fn staging_snapshot(db: &TestDb) -> Vec<(String, NaiveDate, i32, bool, Option<i32>)> {
    db.client
        .query(
            "SELECT order_id, order_date, customer_age, returned, quantity \
             FROM staging_ecommerce_sales ORDER BY order_id",
            &[],
        )
        .await
        .expect("query staging table")
        .iter()
        .map(|row| (row.get(0), row.get(1), row.get(2), row.get(3), row.get(4)))
        .collect()
}

pub async fn row_count(db: &TestDb, table: &str) -> i64 {
    db.client
        .query_one(&format!("SELECT COUNT(*) FROM {table}"), &[])
        .await
        .expect("count rows")
        .get(0)
}

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
