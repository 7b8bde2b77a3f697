use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV parsing error{}: {message}", at_line(.line))]
    Parse { line: Option<u64>, message: String },
}

fn at_line(line: &Option<u64>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

impl From<csv::Error> for FileError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line());
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => FileError::IoError(io),
            _ => FileError::Parse { line, message },
        }
    }
}
