use crate::error::StagingError;
use connectors::{
    file::csv::source::CsvSource,
    sql::base::{
        adapter::SqlAdapter,
        error::DbError,
        requests::{DEFAULT_CHUNK_ROWS, ReplaceRowsRequest},
    },
};
use engine_processing::transform::{
    normalizer::{NormalizedBatch, Normalizer},
    quality_gate::{GateOutcome, deduplicate},
};
use model::{execution::rejected_row::RejectedRow, records::batch::StagedBatch};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Counts observed while preparing and writing one staging batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub rows_staged: u64,
    pub duplicates_dropped: usize,
    pub ages_repaired: usize,
    pub rejected: Vec<RejectedRow>,
}

/// A batch that passed normalization and the quality gate but has not been
/// written yet.
#[derive(Debug, Clone)]
pub struct PreparedBatch {
    pub batch: StagedBatch,
    pub report: LoadReport,
}

/// Replaces the contents of the staging table with the cleaned contents of
/// the source file.
pub struct StagingLoader {
    source: CsvSource,
    table: String,
    batch_size: usize,
    normalizer: Normalizer,
}

impl StagingLoader {
    pub fn new(source: CsvSource, table: impl Into<String>) -> Self {
        StagingLoader {
            source,
            table: table.into(),
            batch_size: DEFAULT_CHUNK_ROWS,
            normalizer: Normalizer::new(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Reads, normalizes and deduplicates the source without touching the
    /// database.
    pub fn prepare(&self) -> Result<PreparedBatch, StagingError> {
        debug!("Reading source file {}", self.source.path().display());
        let raw = self.source.read_table()?;
        let NormalizedBatch {
            batch,
            rejected,
            ages_repaired,
        } = self.normalizer.normalize(&raw)?;
        let GateOutcome { batch, dropped } = deduplicate(batch);

        Ok(PreparedBatch {
            batch,
            report: LoadReport {
                rows_read: raw.len(),
                rows_staged: 0,
                duplicates_dropped: dropped,
                ages_repaired,
                rejected,
            },
        })
    }

    pub async fn load<A>(
        &self,
        adapter: &A,
        cancel: &CancellationToken,
    ) -> Result<LoadReport, StagingError>
    where
        A: SqlAdapter + ?Sized,
    {
        let PreparedBatch { batch, mut report } = self.prepare()?;
        report.rows_staged = self.write(adapter, &batch, cancel).await?;
        Ok(report)
    }

    /// Truncates the staging table and inserts `batch` in one transaction.
    pub async fn write<A>(
        &self,
        adapter: &A,
        batch: &StagedBatch,
        cancel: &CancellationToken,
    ) -> Result<u64, StagingError>
    where
        A: SqlAdapter + ?Sized,
    {
        info!("Loading {} rows into the staging table...", batch.len());

        if cancel.is_cancelled() {
            return Err(StagingError::Load(DbError::Cancelled));
        }

        let rows = batch.rows();
        let request = ReplaceRowsRequest::new(&self.table, &batch.columns, &rows)
            .chunk_rows(self.batch_size);

        let written = adapter
            .replace_rows(request, cancel)
            .await
            .map_err(StagingError::Load)?;

        info!("Data loaded to staging table {} ({} rows).", self.table, written);
        Ok(written)
    }
}
