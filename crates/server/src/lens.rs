use doctest_protocol::{Action, ActionPayload, Position, Range, LABEL_EVALUATE, LABEL_REFRESH};
use doctest_scanner::DirectiveGroup;

/// Map a file's directive groups to actionable affordances.
///
/// Pure and read-only: no evaluation happens here. Each group yields one
/// action anchored at the marker's range, labeled `Evaluate` when nothing is
/// recorded yet and `Refresh` otherwise. The payload carries the file path,
/// marker line, and exact marker text so the router can re-locate the same
/// group unambiguously later.
pub fn actions_for(file: &str, groups: &[DirectiveGroup]) -> Vec<Action> {
    groups
        .iter()
        .map(|group| {
            let label = if group.annotation.is_recorded() {
                LABEL_REFRESH
            } else {
                LABEL_EVALUATE
            };
            Action {
                range: Range {
                    start: Position {
                        line: group.marker.line as u32,
                        character: group.marker.col as u32,
                    },
                    end: Position {
                        line: group.marker.line as u32,
                        character: group.marker.end_col as u32,
                    },
                },
                label: label.to_string(),
                payload: ActionPayload {
                    file: file.to_string(),
                    marker_line: group.marker.line as u32,
                    marker_text: group.marker_text.clone(),
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctest_scanner::{DirectiveScanner, Language, SourceFile};
    use pretty_assertions::assert_eq;

    fn actions(src: &str) -> Vec<Action> {
        let file = SourceFile::parse_str("lib.rs", src, Language::Rust).unwrap();
        let groups = DirectiveScanner::new().scan(&file);
        actions_for("lib.rs", &groups)
    }

    #[test]
    fn unrecorded_directives_offer_evaluate() {
        let actions = actions("// >>> add(2, 3)\nfn main() {}\n");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].label, "Evaluate");
        assert_eq!(actions[0].range.start.line, 0);
        assert_eq!(actions[0].payload.marker_text, "// >>> add(2, 3)");
    }

    #[test]
    fn recorded_directives_offer_refresh() {
        let actions = actions("// >>> add(2, 3)\n// 5\nfn main() {}\n");
        assert_eq!(actions[0].label, "Refresh");
    }

    #[test]
    fn regressed_directives_offer_refresh() {
        let actions = actions("// >>> add(2, 3)\n// WAS 5\n// NOW 6\nfn main() {}\n");
        assert_eq!(actions[0].label, "Refresh");
    }

    #[test]
    fn one_action_per_group_in_source_order() {
        let actions = actions("// >>> a()\nfn a() {}\n\n// >>> b()\n// 2\nfn b() {}\n");
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].label, "Evaluate");
        assert_eq!(actions[1].label, "Refresh");
        assert!(actions[0].range.start.line < actions[1].range.start.line);
    }
}
