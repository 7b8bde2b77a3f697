use crate::error::TransformError;
use connectors::sql::base::adapter::SqlAdapter;
use std::{
    borrow::Cow,
    io::ErrorKind,
    path::PathBuf,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone)]
enum ScriptSource {
    File(PathBuf),
    Inline(String),
}

/// Runs an opaque SQL script against the warehouse as one transaction.
#[derive(Debug, Clone)]
pub struct Transformer {
    source: ScriptSource,
}

impl Transformer {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Transformer {
            source: ScriptSource::File(path.into()),
        }
    }

    pub fn from_sql(script: impl Into<String>) -> Self {
        Transformer {
            source: ScriptSource::Inline(script.into()),
        }
    }

    pub async fn script(&self) -> Result<Cow<'_, str>, TransformError> {
        match &self.source {
            ScriptSource::Inline(sql) => Ok(Cow::Borrowed(sql)),
            ScriptSource::File(path) => match tokio::fs::read_to_string(path).await {
                Ok(sql) => Ok(Cow::Owned(sql)),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    Err(TransformError::ScriptNotFound(path.clone()))
                }
                Err(source) => Err(TransformError::ScriptRead {
                    path: path.clone(),
                    source,
                }),
            },
        }
    }

    pub async fn run<A>(&self, adapter: &A, cancel: &CancellationToken) -> Result<(), TransformError>
    where
        A: SqlAdapter + ?Sized,
    {
        let script = self.script().await?;
        debug!("Executing transformation script ({} bytes)", script.len());

        adapter
            .exec_script_tx(&script, cancel)
            .await
            .map_err(TransformError::Execution)?;

        info!("SQL transformation successful. Data is ready in dim_customers and fact_sales tables.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeWarehouse, write_csv};
    use connectors::sql::base::error::DbError;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_runs_script_from_file() {
        let file = write_csv(&["INSERT INTO dim_customers SELECT 1;"]);
        let warehouse = FakeWarehouse::new();

        Transformer::from_file(file.path())
            .run(&warehouse, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            warehouse.committed_scripts(),
            vec!["INSERT INTO dim_customers SELECT 1;\n"]
        );
        assert!(logs_contain("SQL transformation successful"));
    }

    #[tokio::test]
    async fn test_missing_script() {
        let warehouse = FakeWarehouse::new();
        let err = Transformer::from_file("/no/such/transform.sql")
            .run(&warehouse, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TransformError::ScriptNotFound(_)));
        assert_eq!(warehouse.script_calls(), 0);
    }

    #[tokio::test]
    async fn test_execution_failure_is_wrapped() {
        let warehouse = FakeWarehouse::new();
        warehouse.fail_scripts();

        let err = Transformer::from_sql("SELECT broken")
            .run(&warehouse, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TransformError::Execution(DbError::Write(_))));
        assert!(warehouse.committed_scripts().is_empty());
    }
}
