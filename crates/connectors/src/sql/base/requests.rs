use model::core::value::Value;

/// Rows per COPY chunk when the caller does not set one.
pub const DEFAULT_CHUNK_ROWS: usize = 1000;

/// Full-refresh write: the table ends up holding exactly `rows`.
pub struct ReplaceRowsRequest<'a> {
    pub table: &'a str,
    pub columns: &'a [String],
    pub rows: &'a [Vec<Value>],
    pub chunk_rows: usize,
}

impl<'a> ReplaceRowsRequest<'a> {
    pub fn new(table: &'a str, columns: &'a [String], rows: &'a [Vec<Value>]) -> Self {
        ReplaceRowsRequest {
            table,
            columns,
            rows,
            chunk_rows: DEFAULT_CHUNK_ROWS,
        }
    }

    pub fn chunk_rows(mut self, chunk_rows: usize) -> Self {
        self.chunk_rows = chunk_rows.max(1);
        self
    }
}
