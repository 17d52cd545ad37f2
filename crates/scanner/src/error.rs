use std::path::PathBuf;
use thiserror::Error;

/// Result type for scanner operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Errors that can occur while building a comment model
#[derive(Error, Debug)]
pub enum ScanError {
    /// The file's language has no tree-sitter grammar
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Tree-sitter failed to produce a tree
    #[error("failed to parse {path}: {message}")]
    ParseFailed { path: PathBuf, message: String },

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ScanError {
    /// Create a parse failure for a path
    pub fn parse_failed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ParseFailed {
            path: path.into(),
            message: message.into(),
        }
    }
}
