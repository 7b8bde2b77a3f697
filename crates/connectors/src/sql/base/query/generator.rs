use crate::sql::base::dialect::Dialect;

pub struct QueryGenerator<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> QueryGenerator<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    /// `TRUNCATE` is transactional in Postgres, so it rolls back with the
    /// rest of the load.
    pub fn truncate(&self, table: &str) -> String {
        format!("TRUNCATE TABLE {}", self.dialect.quote_table(table))
    }

    /// CSV-format `COPY ... FROM STDIN` with `\N` as the NULL marker, so an
    /// empty quoted string stays distinct from NULL.
    pub fn copy_from_stdin(&self, table: &str, columns: &[String]) -> String {
        let column_list = columns
            .iter()
            .map(|col| self.dialect.quote_identifier(col))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "COPY {} ({}) FROM STDIN WITH (FORMAT csv, NULL '\\N')",
            self.dialect.quote_table(table),
            column_list
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::base::dialect::Postgres;

    #[test]
    fn test_truncate() {
        let generator = QueryGenerator::new(&Postgres);
        assert_eq!(
            generator.truncate("staging_ecommerce_sales"),
            r#"TRUNCATE TABLE "staging_ecommerce_sales""#
        );
    }

    #[test]
    fn test_copy_from_stdin() {
        let generator = QueryGenerator::new(&Postgres);
        let sql = generator.copy_from_stdin(
            "public.staging",
            &["order_id".to_string(), "order_date".to_string()],
        );
        assert_eq!(
            sql,
            r#"COPY "public"."staging" ("order_id", "order_date") FROM STDIN WITH (FORMAT csv, NULL '\N')"#
        );
    }
}
