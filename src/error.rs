//! Error taxonomy shared by every operation in the crate.

use std::convert::Infallible;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, DatalakeError>;

#[derive(Debug, Error)]
pub enum DatalakeError {
    /// Credentials are missing after merging defaults, or the token exchange was rejected.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A caller supplied an unusable argument (date type, file mode, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A remote path (usually a directory being listed) does not exist.
    #[error("remote path not found: {0}")]
    NotFound(String),

    /// One remote object could not be decoded as newline-delimited JSON.
    /// `line` is 1-based; 0 means the object as a whole (e.g. not UTF-8).
    #[error("malformed record in {} at line {line}: {message}", source_path.as_deref().unwrap_or("<bytes>"))]
    MalformedRecord {
        source_path: Option<String>,
        line: usize,
        message: String,
    },

    /// The destination exists and overwriting was disabled.
    #[error("destination already exists: {0}")]
    AlreadyExists(String),

    /// Upload or download failed inside the storage backend.
    #[error("transfer failed for {path}: {message}")]
    Transfer { path: String, message: String },

    /// Any other non-success answer from the storage service.
    #[error("storage service error on {path}: {message}")]
    Service { path: String, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DatalakeError {
    pub(crate) fn malformed(line: usize, message: impl Into<String>) -> Self {
        DatalakeError::MalformedRecord { source_path: None, line, message: message.into() }
    }

    pub(crate) fn transfer(path: impl Into<String>, message: impl ToString) -> Self {
        DatalakeError::Transfer { path: path.into(), message: message.to_string() }
    }

    pub(crate) fn service(path: impl Into<String>, message: impl ToString) -> Self {
        DatalakeError::Service { path: path.into(), message: message.to_string() }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatalakeError::Io { path: path.into(), source }
    }

    /// Attach the remote object path to a decode error raised on raw bytes.
    pub fn with_source_path(self, path: &str) -> Self {
        match self {
            DatalakeError::MalformedRecord { line, message, .. } => DatalakeError::MalformedRecord {
                source_path: Some(path.to_string()),
                line,
                message,
            },
            other => other,
        }
    }
}

impl From<Infallible> for DatalakeError {
    fn from(e: Infallible) -> Self {
        match e {}
    }
}
