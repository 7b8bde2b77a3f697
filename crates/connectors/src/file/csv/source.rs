use crate::file::csv::{error::FileError, settings::CsvSettings};
use model::records::row::{RawRow, RawTable};
use std::{
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::debug;

/// Reads a delimited file into memory in a single forward pass.
pub struct CsvSource {
    path: PathBuf,
    settings: CsvSettings,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, settings: CsvSettings) -> Self {
        CsvSource {
            path: path.into(),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_table(&self) -> Result<RawTable, FileError> {
        let file = open_source(&self.path)?;
        read_table_from(file, &self.settings)
    }
}

fn open_source(path: &Path) -> Result<File, FileError> {
    File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => FileError::NotFound(path.display().to_string()),
        io::ErrorKind::PermissionDenied => FileError::PermissionDenied(path.display().to_string()),
        _ => FileError::IoError(err),
    })
}

pub fn read_table_from<R: Read>(reader: R, settings: &CsvSettings) -> Result<RawTable, FileError> {
    let start = Instant::now();
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(settings.delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()?
        .iter()
        .map(String::from)
        .collect::<Vec<_>>();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(FileError::InvalidFormat("missing header row".into()));
    }

    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let line = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(idx as u64 + 2);

        let cells = record
            .iter()
            .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
            .collect();
        rows.push(RawRow::new(line, cells));
    }

    debug!(
        "Read {} rows with {} columns in {} ms",
        rows.len(),
        headers.len(),
        start.elapsed().as_millis()
    );

    Ok(RawTable::new(headers, rows))
}
