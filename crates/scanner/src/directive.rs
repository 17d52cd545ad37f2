use crate::model::CommentLine;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Recorded result attached to a directive marker.
///
/// The annotation grammar is a closed set: no recorded result, one value
/// line, or a `WAS`/`NOW` pair once the recorded value has regressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// No result recorded yet
    None,
    /// One value line holding the last recorded result
    Single(String),
    /// Regression pair: `was` is the baseline, `now` the latest result
    WasNow { was: String, now: String },
}

impl Annotation {
    /// Whether a result has been recorded
    pub fn is_recorded(&self) -> bool {
        !matches!(self, Annotation::None)
    }
}

/// Outcome of reconciling a directive against a fresh evaluation.
///
/// Derived per run, never persisted in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// No prior annotation existed
    Fresh,
    /// Fresh result matches the recorded value
    Unchanged,
    /// Fresh result differs from the recorded baseline
    Regressed,
}

/// Source range of a directive group: marker line through its last
/// annotation line. Lines and columns are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
    pub start_col: usize,
    pub end_col: usize,
}

/// One marker comment line plus its contiguous trailing annotation lines.
///
/// Groups are transient: they are rebuilt on every scan and discarded once a
/// file's edits are applied. The source text is the only durable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveGroup {
    /// The expression embedded after the marker token, opaque to the engine
    pub expression: String,
    /// The marker comment line itself
    pub marker: CommentLine,
    /// Exact source text of the marker comment, used to detect stale snapshots
    pub marker_text: String,
    /// Recorded annotation, as classified from the trailing lines
    pub annotation: Annotation,
    /// Comment lines backing the annotation. May be non-empty even when
    /// `annotation` is `None`: malformed lines are kept so the next write
    /// replaces them wholesale.
    pub annotation_lines: Vec<CommentLine>,
    /// Range covering the marker and its annotation lines
    pub location: Location,
}

impl DirectiveGroup {
    /// Line of the marker comment (0-based)
    pub fn marker_line(&self) -> usize {
        self.marker.line
    }
}
