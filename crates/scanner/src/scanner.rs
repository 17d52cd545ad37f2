use crate::directive::{Annotation, DirectiveGroup, Location};
use crate::model::{CommentLine, SourceFile};

/// Token that starts a directive marker, after the comment leader and at most
/// one leading space.
pub const MARKER_TOKEN: &str = ">>>";
/// Prefix of the baseline line in a regression pair
pub const WAS_PREFIX: &str = "WAS ";
/// Prefix of the latest-result line in a regression pair
pub const NOW_PREFIX: &str = "NOW ";

/// Extracts directive groups from a file's comment model.
///
/// A group is one marker line plus the contiguous comment lines immediately
/// below it that hold the recorded result. Groups are returned in source
/// order; that order is semantically significant, since earlier expressions
/// may have side effects that later ones observe.
#[derive(Debug, Default)]
pub struct DirectiveScanner;

impl DirectiveScanner {
    pub fn new() -> Self {
        Self
    }

    /// Scan a file's comment model into ordered directive groups
    pub fn scan(&self, file: &SourceFile) -> Vec<DirectiveGroup> {
        let mut groups = Vec::new();
        for block in comment_blocks(file.comments()) {
            let mut idx = 0;
            while idx < block.len() {
                let line = &block[idx];
                let Some(expression) = marker_expression(line) else {
                    idx += 1;
                    continue;
                };

                let (annotation, annotation_lines) =
                    classify_annotation(file.path(), &block[idx + 1..]);
                let consumed = annotation_lines.len();

                let last = annotation_lines.last().unwrap_or(line);
                let location = Location {
                    file: file.path().to_path_buf(),
                    start_line: line.line,
                    end_line: last.line,
                    start_col: line.col,
                    end_col: last.end_col,
                };

                groups.push(DirectiveGroup {
                    expression: expression.to_string(),
                    marker: line.clone(),
                    marker_text: line.text(),
                    annotation,
                    annotation_lines,
                    location,
                });

                idx += 1 + consumed;
            }
        }
        groups
    }
}

/// Comment content after trimming exactly one leading space
fn content_of(line: &CommentLine) -> &str {
    line.body.strip_prefix(' ').unwrap_or(&line.body)
}

/// If the comment is a directive marker, return its expression text
fn marker_expression(line: &CommentLine) -> Option<&str> {
    let content = content_of(line);
    let rest = content.strip_prefix(MARKER_TOKEN)?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Classify the comment lines immediately following a marker.
///
/// Malformed shapes (a `WAS` line without a `NOW` line, or a lone `NOW`
/// line) degrade to `Annotation::None` but keep their backing lines, so the
/// next write replaces them instead of stacking a new annotation on top.
fn classify_annotation(
    path: &std::path::Path,
    rest: &[CommentLine],
) -> (Annotation, Vec<CommentLine>) {
    let Some(first) = rest.first() else {
        return (Annotation::None, Vec::new());
    };
    let content = content_of(first);

    if content.starts_with(MARKER_TOKEN) {
        return (Annotation::None, Vec::new());
    }

    if let Some(was) = content.strip_prefix(WAS_PREFIX) {
        if let Some(second) = rest.get(1) {
            if let Some(now) = content_of(second).strip_prefix(NOW_PREFIX) {
                return (
                    Annotation::WasNow {
                        was: was.to_string(),
                        now: now.to_string(),
                    },
                    vec![first.clone(), second.clone()],
                );
            }
        }
        log::warn!(
            "{}:{}: WAS line without a NOW line; treating annotation as absent",
            path.display(),
            first.line + 1
        );
        return (Annotation::None, vec![first.clone()]);
    }

    if content.starts_with(NOW_PREFIX) {
        log::warn!(
            "{}:{}: NOW line without a WAS line; treating annotation as absent",
            path.display(),
            first.line + 1
        );
        return (Annotation::None, vec![first.clone()]);
    }

    (Annotation::Single(content.to_string()), vec![first.clone()])
}

/// Split the comment list into blocks of contiguous lines
fn comment_blocks(comments: &[CommentLine]) -> Vec<Vec<CommentLine>> {
    let mut blocks: Vec<Vec<CommentLine>> = Vec::new();
    for comment in comments {
        match blocks.last_mut() {
            Some(block)
                if block
                    .last()
                    .is_some_and(|prev| comment.line == prev.line + 1) =>
            {
                block.push(comment.clone());
            }
            _ => blocks.push(vec![comment.clone()]),
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use pretty_assertions::assert_eq;

    fn scan(src: &str) -> Vec<DirectiveGroup> {
        let file = SourceFile::parse_str("lib.rs", src, Language::Rust).unwrap();
        DirectiveScanner::new().scan(&file)
    }

    #[test]
    fn fresh_marker_has_no_annotation() {
        let groups = scan("// >>> add(2, 3)\nfn add(a: i32, b: i32) -> i32 { a + b }\n");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].expression, "add(2, 3)");
        assert_eq!(groups[0].annotation, Annotation::None);
        assert!(groups[0].annotation_lines.is_empty());
    }

    #[test]
    fn single_annotation_is_classified() {
        let groups = scan("// >>> add(2, 3)\n// 5\nfn main() {}\n");
        assert_eq!(groups[0].annotation, Annotation::Single("5".into()));
        assert_eq!(groups[0].annotation_lines.len(), 1);
        assert_eq!(groups[0].location.start_line, 0);
        assert_eq!(groups[0].location.end_line, 1);
    }

    #[test]
    fn was_now_pair_is_classified() {
        let groups = scan("// >>> add(2, 3)\n// WAS 5\n// NOW 6\nfn main() {}\n");
        assert_eq!(
            groups[0].annotation,
            Annotation::WasNow {
                was: "5".into(),
                now: "6".into()
            }
        );
        assert_eq!(groups[0].annotation_lines.len(), 2);
    }

    #[test]
    fn was_without_now_degrades_to_none() {
        let groups = scan("// >>> add(2, 3)\n// WAS 5\nfn main() {}\n");
        assert_eq!(groups[0].annotation, Annotation::None);
        // the malformed line is kept so the next write replaces it
        assert_eq!(groups[0].annotation_lines.len(), 1);
    }

    #[test]
    fn lone_now_degrades_to_none() {
        let groups = scan("// >>> add(2, 3)\n// NOW 6\nfn main() {}\n");
        assert_eq!(groups[0].annotation, Annotation::None);
        assert_eq!(groups[0].annotation_lines.len(), 1);
    }

    #[test]
    fn adjacent_markers_start_separate_groups() {
        let groups = scan("// >>> a()\n// >>> b()\n// 7\nfn main() {}\n");
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].expression, "a()");
        assert_eq!(groups[0].annotation, Annotation::None);
        assert_eq!(groups[1].expression, "b()");
        assert_eq!(groups[1].annotation, Annotation::Single("7".into()));
    }

    #[test]
    fn groups_keep_source_order() {
        let src = "// >>> first()\n// 1\nfn a() {}\n\n// >>> second()\n// 2\nfn b() {}\n";
        let groups = scan(src);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].expression, "first()");
        assert_eq!(groups[1].expression, "second()");
        assert!(groups[0].location.start_line < groups[1].location.start_line);
    }

    #[test]
    fn annotation_must_be_contiguous() {
        // a blank line separates the value comment from the marker
        let groups = scan("// >>> add(2, 3)\n\n// 5\nfn main() {}\n");
        assert_eq!(groups[0].annotation, Annotation::None);
        assert!(groups[0].annotation_lines.is_empty());
    }

    #[test]
    fn marker_requires_token_after_one_space() {
        let groups = scan("//  >>> not a marker (two spaces)\n// >>>no_space()\nfn main() {}\n");
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].expression, "no_space()");
    }

    #[test]
    fn doc_comments_are_not_markers() {
        let groups = scan("/// >>> looks like one\nfn main() {}\n");
        // `///` leaves a leading `/` in the body, so the marker test fails
        assert!(groups.is_empty());
    }

    #[test]
    fn python_hash_comments_work() {
        let file = SourceFile::parse_str(
            "run.py",
            "# >>> add(2, 3)\n# 5\ndef add(a, b):\n    return a + b\n",
            Language::Python,
        )
        .unwrap();
        let groups = DirectiveScanner::new().scan(&file);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].expression, "add(2, 3)");
        assert_eq!(groups[0].annotation, Annotation::Single("5".into()));
    }

    #[test]
    fn marker_text_matches_source() {
        let groups = scan("// >>> add(2, 3)\nfn main() {}\n");
        assert_eq!(groups[0].marker_text, "// >>> add(2, 3)");
    }
}
