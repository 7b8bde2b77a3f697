use crate::error::ReportError;
use connectors::sql::base::adapter::SqlAdapter;
use model::core::value::Value;
use serde::Serialize;
use tracing::debug;

const REGION_QUERY: &str = "sales_by_region";
const GENDER_QUERY: &str = "sales_by_gender";
const MONTHLY_QUERY: &str = "monthly_sales";

const SALES_BY_REGION_SQL: &str = "
    SELECT region::text AS region, SUM(total_amount)::float8 AS total_sales
    FROM fact_sales
    GROUP BY region
    ORDER BY total_sales DESC";

const SALES_BY_GENDER_SQL: &str = "
    SELECT dc.customer_gender::text AS customer_gender, SUM(fs.total_amount)::float8 AS total_sales
    FROM fact_sales fs
    JOIN dim_customers dc ON fs.customer_id = dc.customer_id
    GROUP BY dc.customer_gender
    ORDER BY total_sales DESC";

const MONTHLY_SALES_SQL: &str = "
    SELECT
        EXTRACT(YEAR FROM order_date)::int AS year,
        EXTRACT(MONTH FROM order_date)::int AS month,
        SUM(total_amount)::float8 AS monthly_sales
    FROM fact_sales
    GROUP BY 1, 2
    ORDER BY 1, 2";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesByLabel {
    pub label: String,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    pub year: i32,
    pub month: u32,
    pub total_sales: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SalesReport {
    pub by_region: Vec<SalesByLabel>,
    pub by_gender: Vec<SalesByLabel>,
    pub monthly: Vec<MonthlySales>,
}

/// Runs the read-only aggregate queries over the warehouse tables.
pub async fn sales_report<A>(adapter: &A) -> Result<SalesReport, ReportError>
where
    A: SqlAdapter + ?Sized,
{
    let by_region = labelled(adapter, REGION_QUERY, SALES_BY_REGION_SQL).await?;
    let by_gender = labelled(adapter, GENDER_QUERY, SALES_BY_GENDER_SQL).await?;

    let monthly = fetch(adapter, MONTHLY_QUERY, MONTHLY_SALES_SQL)
        .await?
        .into_iter()
        .map(|row| {
            Ok(MonthlySales {
                year: int_at(&row, 0, MONTHLY_QUERY, "year")? as i32,
                month: int_at(&row, 1, MONTHLY_QUERY, "month")? as u32,
                total_sales: float_at(&row, 2, MONTHLY_QUERY, "monthly_sales")?,
            })
        })
        .collect::<Result<Vec<_>, ReportError>>()?;

    Ok(SalesReport {
        by_region,
        by_gender,
        monthly,
    })
}

async fn fetch<A>(
    adapter: &A,
    query: &'static str,
    sql: &str,
) -> Result<Vec<Vec<Value>>, ReportError>
where
    A: SqlAdapter + ?Sized,
{
    let rows = adapter
        .query_rows(sql)
        .await
        .map_err(|source| ReportError::Query { query, source })?;
    debug!("Report {} returned {} rows", query, rows.len());
    Ok(rows)
}

async fn labelled<A>(
    adapter: &A,
    query: &'static str,
    sql: &str,
) -> Result<Vec<SalesByLabel>, ReportError>
where
    A: SqlAdapter + ?Sized,
{
    fetch(adapter, query, sql)
        .await?
        .into_iter()
        .map(|row| {
            let label = match row.first() {
                Some(Value::Null) | None => "(unknown)".to_string(),
                Some(value) => value.to_string(),
            };
            Ok(SalesByLabel {
                label,
                total_sales: float_at(&row, 1, query, "total_sales")?,
            })
        })
        .collect()
}

fn float_at(
    row: &[Value],
    idx: usize,
    query: &'static str,
    column: &'static str,
) -> Result<f64, ReportError> {
    match row.get(idx) {
        Some(Value::Null) => Ok(0.0),
        Some(value) => value
            .as_f64()
            .ok_or(ReportError::UnexpectedValue { query, column }),
        None => Err(ReportError::UnexpectedValue { query, column }),
    }
}

fn int_at(
    row: &[Value],
    idx: usize,
    query: &'static str,
    column: &'static str,
) -> Result<i64, ReportError> {
    row.get(idx)
        .and_then(Value::as_i64)
        .ok_or(ReportError::UnexpectedValue { query, column })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Call, FakeWarehouse};

    #[tokio::test]
    async fn test_decodes_rows() {
        let warehouse = FakeWarehouse::new();
        warehouse.set_query_result(vec![vec![
            Value::Int(2024),
            Value::Int(3),
            Value::Float(1250.5),
        ]]);

        // Same rows for every query.
        let report = sales_report(&warehouse).await.unwrap();
        assert_eq!(
            report.monthly,
            vec![MonthlySales {
                year: 2024,
                month: 3,
                total_sales: 1250.5
            }]
        );
        assert_eq!(report.by_region[0].label, "2024");
        assert_eq!(report.by_region[0].total_sales, 3.0);

        let queries = warehouse
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Query(_)))
            .count();
        assert_eq!(queries, 3);
    }

    #[tokio::test]
    async fn test_empty_warehouse() {
        let report = sales_report(&FakeWarehouse::new()).await.unwrap();
        assert_eq!(report, SalesReport::default());
    }

    #[test]
    fn test_rejects_non_numeric_totals() {
        let row = vec![Value::String("North".into()), Value::String("lots".into())];
        assert!(matches!(
            float_at(&row, 1, REGION_QUERY, "total_sales"),
            Err(ReportError::UnexpectedValue { .. })
        ));
        assert_eq!(float_at(&[Value::Null, Value::Null], 1, REGION_QUERY, "total_sales").unwrap(), 0.0);
    }
}
