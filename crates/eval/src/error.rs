use thiserror::Error;

/// Result type for evaluator operations
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors that can occur inside the evaluator capability
#[derive(Error, Debug)]
pub enum EvalError {
    /// A session could not be opened or has died
    #[error("session error: {0}")]
    Session(String),

    /// The evaluator rejected an expression
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EvalError {
    /// Create a session error
    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    /// Create an evaluation error
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }
}
