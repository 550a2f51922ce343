use std::fmt;

#[derive(Debug)]
pub enum IoError {
    /// Workbook open / sheet read error.
    Xlsx(String),
    /// Audit workbook rendering error.
    Render(String),
    /// Columnar schedule decode error (truncation, bad magic, version).
    Decode(String),
    /// SQLite storage error.
    Storage(String),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xlsx(msg) => write!(f, "xlsx error: {msg}"),
            Self::Render(msg) => write!(f, "render error: {msg}"),
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
            Self::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

impl std::error::Error for IoError {}

impl From<rusqlite::Error> for IoError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
