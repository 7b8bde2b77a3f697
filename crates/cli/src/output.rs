use crate::error::CliError;
use engine_core::{
    pipeline::RunSummary,
    report::{MonthlySales, SalesByLabel, SalesReport},
    staging::LoadReport,
};
use serde::Serialize;
use std::fmt::Write;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

pub fn print_run_summary(summary: &RunSummary) {
    println!("Pipeline finished: {}", summary.state);
    let path = summary
        .history
        .iter()
        .map(|t| t.state.as_str())
        .collect::<Vec<_>>()
        .join(" -> ");
    println!("{:<20} {}", "States", path);
    print!("{}", render_load_report(&summary.load));
}

pub fn print_load_report(report: &LoadReport) {
    print!("{}", render_load_report(report));
}

pub fn print_sales_report(report: &SalesReport) {
    print!("{}", render_sales_report(report));
}

fn render_load_report(report: &LoadReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<20} {}", "Rows read", report.rows_read);
    let _ = writeln!(out, "{:<20} {}", "Rows staged", report.rows_staged);
    let _ = writeln!(out, "{:<20} {}", "Duplicates dropped", report.duplicates_dropped);
    let _ = writeln!(out, "{:<20} {}", "Ages repaired", report.ages_repaired);
    let _ = writeln!(out, "{:<20} {}", "Rows rejected", report.rejected.len());
    for rejected in &report.rejected {
        let _ = writeln!(out, "  - {}", rejected);
    }
    out
}

fn render_sales_report(report: &SalesReport) -> String {
    let mut out = String::new();

    out.push_str(&render_section(
        "Total Sales by Region",
        &["Region", "Total Sales"],
        labelled_rows(&report.by_region),
    ));
    out.push('\n');
    out.push_str(&render_section(
        "Sales Distribution by Customer Gender",
        &["Gender", "Total Sales", "Share"],
        share_rows(&report.by_gender),
    ));
    out.push('\n');
    out.push_str(&render_section(
        "Monthly Sales Trend",
        &["Month", "Total Sales"],
        monthly_rows(&report.monthly),
    ));

    out
}

fn labelled_rows(rows: &[SalesByLabel]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| vec![r.label.clone(), format!("{:.2}", r.total_sales)])
        .collect()
}

fn share_rows(rows: &[SalesByLabel]) -> Vec<Vec<String>> {
    let total: f64 = rows.iter().map(|r| r.total_sales).sum();
    rows.iter()
        .map(|r| {
            let share = if total > 0.0 {
                r.total_sales / total * 100.0
            } else {
                0.0
            };
            vec![
                r.label.clone(),
                format!("{:.2}", r.total_sales),
                format!("{:.1}%", share),
            ]
        })
        .collect()
}

fn monthly_rows(rows: &[MonthlySales]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|r| {
            vec![
                format!("{:04}-{:02}", r.year, r.month),
                format!("{:.2}", r.total_sales),
            ]
        })
        .collect()
}

fn render_section(title: &str, headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut out = format!("{title}\n");
    if rows.is_empty() {
        let _ = writeln!(out, "No data");
        return out;
    }
    out.push_str(&render_table(headers, &rows));
    out
}

/// Plain text table, first column left-aligned and the rest right-aligned.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(idx) {
                *width = (*width).max(cell.len());
            }
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "{}", format_row(headers.iter().copied(), &widths));
    let _ = writeln!(
        out,
        "{}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  ")
    );
    for row in rows {
        let _ = writeln!(out, "{}", format_row(row.iter().map(String::as_str), &widths));
    }
    out
}

fn format_row<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .enumerate()
        .map(|(idx, (cell, &width))| {
            if idx == 0 {
                format!("{cell:<width$}")
            } else {
                format!("{cell:>width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::execution::rejected_row::{RejectReason, RejectedRow};

    #[test]
    fn test_render_table_aligns_columns() {
        let table = render_table(&["Region", "Total Sales"], &[
            vec!["North".into(), "12.50".into()],
            vec!["South America".into(), "3.00".into()],
        ]);

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Region         Total Sales");
        assert_eq!(lines[1], "-------------  -----------");
        assert_eq!(lines[2], "North                12.50");
        assert_eq!(lines[3], "South America         3.00");
    }

    #[test]
    fn test_empty_sections_print_no_data() {
        let rendered = render_sales_report(&SalesReport::default());
        assert_eq!(rendered.matches("No data").count(), 3);
    }

    #[test]
    fn test_gender_shares() {
        let rows = share_rows(&[
            SalesByLabel {
                label: "Female".into(),
                total_sales: 75.0,
            },
            SalesByLabel {
                label: "Male".into(),
                total_sales: 25.0,
            },
        ]);
        assert_eq!(rows[0], vec!["Female", "75.00", "75.0%"]);
        assert_eq!(rows[1], vec!["Male", "25.00", "25.0%"]);
    }

    #[test]
    fn test_monthly_labels() {
        let rows = monthly_rows(&[MonthlySales {
            year: 2024,
            month: 3,
            total_sales: 10.0,
        }]);
        assert_eq!(rows[0][0], "2024-03");
    }

    #[test]
    fn test_load_report_lists_rejections() {
        let report = LoadReport {
            rows_read: 3,
            rows_staged: 1,
            duplicates_dropped: 1,
            ages_repaired: 0,
            rejected: vec![RejectedRow::new(
                4,
                Some("17".into()),
                RejectReason::InvalidEnumValue {
                    column: "returned".into(),
                    value: Some("Maybe".into()),
                },
            )],
        };

        let rendered = render_load_report(&report);
        assert!(rendered.contains("Duplicates dropped   1"));
        assert!(rendered.contains("line 4 (order_id 17): invalid value 'Maybe' for column 'returned'"));
    }
}
