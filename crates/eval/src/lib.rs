//! # Doctest Eval
//!
//! Evaluator capability behind the annotation engine.
//!
//! An [`Evaluator`] opens sessions; a [`Session`] loads a root's files and
//! evaluates directive expressions against the accumulated state. The
//! capability is trait-based and selected at construction time: the engine
//! never knows which backend it is driving.
//!
//! Two backends ship here:
//! - [`MiniInterpreter`] — a tree-walking interpreter for a small expression
//!   language, deterministic and dependency-free; the default for the CLI.
//! - [`CommandEvaluator`] — drives an external REPL process over a line
//!   protocol, one subprocess per session.
//!
//! Sessions are not safe for concurrent evaluation: both methods take
//! `&mut self`, and callers must keep one session on one task. Evaluation
//! has no built-in timeout — expressions are arbitrary user code — so the
//! returned futures must stay abortable: dropping them mid-flight must never
//! corrupt file state (neither backend touches the files it loaded).

mod command;
mod error;
mod mini;

pub use command::CommandEvaluator;
pub use error::{EvalError, Result};
pub use mini::MiniInterpreter;

use async_trait::async_trait;
use std::path::Path;

/// Capability that opens evaluation sessions.
///
/// Implementations are swappable at construction time; the engine holds a
/// `dyn Evaluator` and never extends a backend by inheritance.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Open a fresh session scoped to one evaluation root
    async fn open_session(&self, root: &Path) -> Result<Box<dyn Session>>;
}

/// One live evaluation session.
///
/// All files of a root must be loaded before any expression is evaluated,
/// and expressions must be evaluated strictly in source order: earlier
/// side effects are observable to later expressions.
#[async_trait]
pub trait Session: Send {
    /// Load a file's declarations into the session
    async fn load_file(&mut self, path: &Path) -> Result<()>;

    /// Evaluate an expression, returning its textual result
    async fn evaluate(&mut self, expression: &str) -> Result<String>;
}
