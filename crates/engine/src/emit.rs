use crate::error::{EngineError, Result};
use doctest_scanner::{Annotation, DirectiveGroup, SourceFile};
use std::path::{Path, PathBuf};

/// One minimal replacement span: `(start_line, start_col)..(end_line,
/// end_col)` replaced by `new_text`. Lines and columns are 0-based; columns
/// are byte offsets within the line. An empty range is an insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanEdit {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub new_text: String,
}

/// Minimal edits for one file, keyed by path for the host to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdits {
    pub file: PathBuf,
    pub edits: Vec<SpanEdit>,
}

/// Render one annotation comment line with the marker's indent and leader
fn render_comment_line(file: &SourceFile, group: &DirectiveGroup, text: &str) -> String {
    let indent = file.indent_before(group.marker.line, group.marker.col);
    format!("{indent}{} {text}", group.marker.leader)
}

/// Render the comment lines an annotation occupies on disk
fn render_annotation(file: &SourceFile, group: &DirectiveGroup, annotation: &Annotation) -> Vec<String> {
    match annotation {
        Annotation::None => Vec::new(),
        Annotation::Single(value) => vec![render_comment_line(file, group, value)],
        Annotation::WasNow { was, now } => vec![
            render_comment_line(file, group, &format!("WAS {was}")),
            render_comment_line(file, group, &format!("NOW {now}")),
        ],
    }
}

/// Whole-file rewrite strategy.
///
/// Mutates the line model for every changed group and serializes the whole
/// model back to canonical bytes. Returns `None` when no group actually
/// changes, so an unchanged file is never rewritten.
pub fn full_rewrite_content(
    file: &SourceFile,
    changes: &[(&DirectiveGroup, Annotation)],
) -> Option<String> {
    let mut lines: Vec<String> = file.lines().to_vec();
    let mut changed = false;

    // Bottom-up so earlier line numbers stay valid while splicing.
    let mut ordered: Vec<&(&DirectiveGroup, Annotation)> = changes.iter().collect();
    ordered.sort_by(|a, b| b.0.marker.line.cmp(&a.0.marker.line));

    for (group, new_annotation) in ordered {
        if *new_annotation == group.annotation {
            continue;
        }
        let rendered = render_annotation(file, group, new_annotation);
        if rendered.is_empty() {
            // The reconciler never clears an annotation.
            continue;
        }

        match (&group.annotation, group.annotation_lines.as_slice()) {
            // Fresh directive: insert the value line directly below the marker.
            (Annotation::None, []) => {
                lines.insert(group.marker.line + 1, rendered[0].clone());
            }
            // Existing WAS/NOW pair: the baseline line's bytes stay put, only
            // the NOW line is rewritten.
            (Annotation::WasNow { .. }, backing) => {
                let now_line = backing[1].line;
                lines[now_line] = rendered.last().cloned().unwrap_or_default();
            }
            // Single value line, or malformed leftovers kept by the scanner:
            // replace the backing lines wholesale.
            (_, backing) => {
                let first = backing[0].line;
                let last = backing[backing.len() - 1].line;
                lines.splice(first..=last, rendered);
            }
        }
        changed = true;
    }

    if !changed {
        return None;
    }
    Some(SourceFile::render_lines(&lines, file.had_trailing_newline()))
}

/// Apply a full rewrite to disk. The write is atomic: content goes to a
/// sibling temp file first and is renamed over the original, so a failure
/// leaves the file untouched. Returns whether anything was written.
pub fn full_rewrite(file: &SourceFile, changes: &[(&DirectiveGroup, Annotation)]) -> Result<bool> {
    let Some(content) = full_rewrite_content(file, changes) else {
        return Ok(false);
    };
    write_atomic(file.path(), &content)?;
    log::debug!("rewrote {}", file.path().display());
    Ok(true)
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_extension(format!("{ext}.tmp")),
        None => path.with_extension("tmp"),
    };
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Incremental edit strategy for one targeted group.
///
/// Computes the minimal replacement span(s) for bringing the group's
/// annotation to `new_annotation`, touching no other byte of the file. The
/// marker at `snapshot_line` must still read exactly `snapshot_marker_text`;
/// otherwise the file changed since the snapshot was taken and the edit
/// fails with [`EngineError::StaleLocation`] instead of editing blindly.
pub fn incremental_edit(
    file: &SourceFile,
    groups: &[DirectiveGroup],
    snapshot_line: usize,
    snapshot_marker_text: &str,
    new_annotation: &Annotation,
) -> Result<FileEdits> {
    let group = groups
        .iter()
        .find(|g| g.marker.line == snapshot_line)
        .ok_or_else(|| EngineError::StaleLocation {
            file: file.path().to_path_buf(),
            line: snapshot_line,
            expected: snapshot_marker_text.to_string(),
            found: file.line(snapshot_line).unwrap_or_default().to_string(),
        })?;
    if group.marker_text != snapshot_marker_text {
        return Err(EngineError::StaleLocation {
            file: file.path().to_path_buf(),
            line: snapshot_line,
            expected: snapshot_marker_text.to_string(),
            found: group.marker_text.clone(),
        });
    }

    let mut edits = Vec::new();
    if *new_annotation != group.annotation {
        let rendered = render_annotation(file, group, new_annotation);
        if !rendered.is_empty() {
            match (&group.annotation, group.annotation_lines.as_slice()) {
                (Annotation::None, []) => {
                    edits.push(insert_lines_after(file, group.marker.line, &rendered));
                }
                (Annotation::WasNow { .. }, backing) => {
                    let now_line = backing[1].line;
                    let tail = &rendered[rendered.len() - 1..];
                    edits.push(replace_lines(file, now_line, now_line, tail));
                }
                (_, backing) => {
                    let first = backing[0].line;
                    let last = backing[backing.len() - 1].line;
                    edits.push(replace_lines(file, first, last, &rendered));
                }
            }
        }
    }

    Ok(FileEdits {
        file: file.path().to_path_buf(),
        edits,
    })
}

/// Span replacing whole lines `first..=last` with the rendered lines
fn replace_lines(file: &SourceFile, first: usize, last: usize, rendered: &[String]) -> SpanEdit {
    let last_file_line = file.line_count().saturating_sub(1);
    if last < last_file_line || file.had_trailing_newline() {
        SpanEdit {
            start_line: first,
            start_col: 0,
            end_line: last + 1,
            end_col: 0,
            new_text: format!("{}\n", rendered.join("\n")),
        }
    } else {
        // Last line of a file with no trailing newline: the span must not
        // invent one.
        let end_col = file.line(last).map(str::len).unwrap_or(0);
        SpanEdit {
            start_line: first,
            start_col: 0,
            end_line: last,
            end_col,
            new_text: rendered.join("\n"),
        }
    }
}

/// Insertion span placing the rendered lines directly below `line`
fn insert_lines_after(file: &SourceFile, line: usize, rendered: &[String]) -> SpanEdit {
    let last_file_line = file.line_count().saturating_sub(1);
    if line < last_file_line || file.had_trailing_newline() {
        SpanEdit {
            start_line: line + 1,
            start_col: 0,
            end_line: line + 1,
            end_col: 0,
            new_text: format!("{}\n", rendered.join("\n")),
        }
    } else {
        let end_col = file.line(line).map(str::len).unwrap_or(0);
        SpanEdit {
            start_line: line,
            start_col: end_col,
            end_line: line,
            end_col,
            new_text: format!("\n{}", rendered.join("\n")),
        }
    }
}

/// Reference applier for [`SpanEdit`]s, used by hosts without their own edit
/// machinery and by the equivalence tests. Edits must not overlap.
pub fn apply_edits(text: &str, edits: &[SpanEdit]) -> String {
    let mut resolved: Vec<(usize, usize, &str)> = edits
        .iter()
        .map(|e| {
            (
                offset_of(text, e.start_line, e.start_col),
                offset_of(text, e.end_line, e.end_col),
                e.new_text.as_str(),
            )
        })
        .collect();
    resolved.sort_by_key(|(start, _, _)| *start);

    let mut out = text.to_string();
    for (start, end, new_text) in resolved.into_iter().rev() {
        out.replace_range(start..end, new_text);
    }
    out
}

/// Byte offset of a 0-based (line, col) position; positions past the end of
/// the text clamp to the end
fn offset_of(text: &str, line: usize, col: usize) -> usize {
    if line == 0 {
        return col.min(text.len());
    }
    let mut remaining = line;
    for (idx, byte) in text.bytes().enumerate() {
        if byte == b'\n' {
            remaining -= 1;
            if remaining == 0 {
                return (idx + 1 + col).min(text.len());
            }
        }
    }
    text.len()
}
