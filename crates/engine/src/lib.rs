//! # Doctest Engine
//!
//! Directive lifecycle and edit-generation engine.
//!
//! ## Architecture
//!
//! ```text
//! DirectiveScanner (doctest-scanner)
//!     │  ordered DirectiveGroups
//!     ▼
//! EvaluationCoordinator ──> Evaluator capability (doctest-eval)
//!     │  fresh textual results
//!     ▼
//! reconcile()  — pure: (existing annotation, fresh) → (annotation, status)
//!     │
//!     ▼
//! Edit emission — two interchangeable strategies:
//!     full_rewrite()      whole-model resync, atomic write
//!     incremental_edit()  minimal spans for one group, host applies
//! ```
//!
//! The two strategies are deliberately separate code paths; their outputs
//! must stay byte-identical, which the equivalence tests in `emit` enforce.
//! All state is scoped: an [`EvaluationRoot`] value is passed through every
//! call, and no session outlives one coordinator invocation.

mod coordinator;
mod emit;
mod error;
mod reconcile;

pub use coordinator::{
    partition_roots, BatchReport, DirectiveOutcome, EvaluationCoordinator, EvaluationFailure,
    EvaluationRoot,
};
pub use emit::{apply_edits, full_rewrite, full_rewrite_content, incremental_edit, FileEdits, SpanEdit};
pub use error::{EngineError, Result};
pub use reconcile::reconcile;
