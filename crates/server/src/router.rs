use crate::lens::actions_for;
use doctest_engine::{incremental_edit, reconcile, EngineError, EvaluationCoordinator, FileEdits};
use doctest_eval::Evaluator;
use doctest_protocol::{Action, ActionPayload, InvokeResult, Position, Range, TextEdit};
use doctest_scanner::{DirectiveScanner, SourceFile};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Interactive entry point composing scanner, coordinator, reconciler, and
/// the incremental edit strategy for one directive at a time.
pub struct CommandRouter {
    coordinator: EvaluationCoordinator,
}

impl CommandRouter {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            coordinator: EvaluationCoordinator::new(evaluator),
        }
    }

    /// List the actionable directives of a file
    pub fn list_actions(&self, file: &str) -> doctest_engine::Result<Vec<Action>> {
        let source = SourceFile::parse(file)?;
        let groups = DirectiveScanner::new().scan(&source);
        Ok(actions_for(file, &groups))
    }

    /// Invoke one action: re-locate the group, evaluate its expression in a
    /// throwaway session, reconcile, and return minimal edits for the host
    /// to apply.
    ///
    /// The group must still be where the payload's snapshot says it is, with
    /// the exact same marker text; otherwise the invocation fails with a
    /// stale-location error and the host must re-request actions.
    pub async fn invoke(&self, payload: &ActionPayload) -> doctest_engine::Result<InvokeResult> {
        let path = Path::new(&payload.file);
        let source = SourceFile::parse(path)?;
        let groups = DirectiveScanner::new().scan(&source);

        let marker_line = payload.marker_line as usize;
        let group = groups
            .iter()
            .find(|g| g.marker.line == marker_line && g.marker_text == payload.marker_text)
            .ok_or_else(|| EngineError::StaleLocation {
                file: path.to_path_buf(),
                line: marker_line,
                expected: payload.marker_text.clone(),
                found: source
                    .line(marker_line)
                    .unwrap_or_default()
                    .trim_start()
                    .to_string(),
            })?;

        let fresh = self
            .coordinator
            .evaluate_single(path, &group.expression)
            .await?;
        let (annotation, status) = reconcile(&group.annotation, &fresh);
        log::debug!(
            "{}:{}: `{}` -> {fresh} ({status:?})",
            payload.file,
            marker_line + 1,
            group.expression
        );

        let edits = incremental_edit(
            &source,
            &groups,
            marker_line,
            &payload.marker_text,
            &annotation,
        )?;

        Ok(InvokeResult {
            edits: to_protocol_edits(edits),
            // Applying the edits shifts line numbers below the group, so any
            // cached affordances are now stale.
            refresh_actions: true,
        })
    }
}

fn to_protocol_edits(edits: FileEdits) -> BTreeMap<String, Vec<TextEdit>> {
    let mut map = BTreeMap::new();
    map.insert(
        edits.file.to_string_lossy().into_owned(),
        edits
            .edits
            .into_iter()
            .map(|e| TextEdit {
                range: Range {
                    start: Position {
                        line: e.start_line as u32,
                        character: e.start_col as u32,
                    },
                    end: Position {
                        line: e.end_line as u32,
                        character: e.end_col as u32,
                    },
                },
                new_text: e.new_text,
            })
            .collect(),
    );
    map
}

/// Stable error code for the wire
pub fn error_code(error: &EngineError) -> &'static str {
    match error {
        EngineError::StaleLocation { .. } => "stale_location",
        EngineError::Eval { .. } => "evaluation_error",
        EngineError::Scan(_) => "parse_error",
        EngineError::IoError(_) => "io_error",
        EngineError::Task(_) => "internal_error",
    }
}
