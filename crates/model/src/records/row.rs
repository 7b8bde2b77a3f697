use serde::{Deserialize, Serialize};

/// One record of the source file before any coercion. Cells are aligned
/// with the headers of the owning [`RawTable`]; empty cells are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// 1-based line of the record in the source file, header included.
    pub line: u64,
    pub cells: Vec<Option<String>>,
}

impl RawRow {
    pub fn new(line: u64, cells: Vec<Option<String>>) -> Self {
        RawRow { line, cells }
    }

    pub fn cell(&self, index: usize) -> Option<&str> {
        self.cells.get(index).and_then(|c| c.as_deref())
    }
}

/// The source file as read from disk: headers exactly as given, plus rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        RawTable { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
