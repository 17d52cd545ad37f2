//! # Doctest Scanner
//!
//! Extracts executable-comment directives from source files.
//!
//! A directive is a comment line of the form `>>> <expression>`. The lines
//! immediately below it hold the recorded result of the last evaluation:
//! either a single value line, or a `WAS <old>` / `NOW <new>` pair once a
//! recorded result has regressed.
//!
//! ## Pipeline
//!
//! ```text
//! Source bytes
//!     │
//!     ├──> Language detection (from extension)
//!     │
//!     ├──> Tree-sitter parse → line-comment model
//!     │
//!     └──> DirectiveScanner
//!          ├─> group contiguous comment lines into blocks
//!          ├─> find marker lines (`>>> expr`)
//!          └─> classify trailing annotation lines
//! ```
//!
//! The expression text is opaque to this crate; it is never parsed here.

mod directive;
mod error;
mod language;
mod model;
mod scanner;

pub use directive::{Annotation, DirectiveGroup, Location, Status};
pub use error::{Result, ScanError};
pub use language::Language;
pub use model::{CommentLine, SourceFile};
pub use scanner::{DirectiveScanner, MARKER_TOKEN, NOW_PREFIX, WAS_PREFIX};
