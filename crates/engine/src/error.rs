use doctest_eval::EvalError;
use doctest_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur in the directive lifecycle engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Building the comment model failed
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The evaluator rejected an expression
    #[error("evaluation of `{expression}` failed: {source}")]
    Eval {
        expression: String,
        #[source]
        source: EvalError,
    },

    /// The on-disk marker no longer matches the snapshot an edit was
    /// computed from; the caller must rescan before editing
    #[error("stale location in {file} at line {line}: expected `{expected}`, found `{found}`")]
    StaleLocation {
        file: PathBuf,
        line: usize,
        expected: String,
        found: String,
    },

    /// IO error occurred; the target file is left unmodified
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A worker task failed to complete
    #[error("task error: {0}")]
    Task(String),
}

impl EngineError {
    /// Wrap an evaluator error with the offending expression
    pub fn eval(expression: impl Into<String>, source: EvalError) -> Self {
        Self::Eval {
            expression: expression.into(),
            source,
        }
    }

    pub fn is_stale_location(&self) -> bool {
        matches!(self, Self::StaleLocation { .. })
    }
}
