use crate::error::{Result, ScanError};
use crate::language::Language;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};

/// One line comment as it appears in the source.
///
/// Columns are 0-based byte offsets within the line. `body` is the text
/// after the comment leader, untrimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    /// 0-based line of the comment
    pub line: usize,
    /// Column where the leader starts
    pub col: usize,
    /// Exclusive end column of the comment text
    pub end_col: usize,
    /// Comment leader, e.g. `//` or `#`
    pub leader: &'static str,
    /// Text after the leader, leading whitespace preserved
    pub body: String,
}

impl CommentLine {
    /// Full source text of the comment (leader + body)
    pub fn text(&self) -> String {
        format!("{}{}", self.leader, self.body)
    }
}

/// A file's line and comment model.
///
/// Holds the raw lines plus every line comment found by tree-sitter, ordered
/// by source position. The model is exclusively owned while a file is being
/// processed; edits are computed against it, never against the file on disk.
#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    language: Language,
    lines: Vec<String>,
    had_trailing_newline: bool,
    comments: Vec<CommentLine>,
}

impl SourceFile {
    /// Read and parse a file from disk
    pub fn parse(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let language = Language::from_path(path);
        Self::parse_str(path, &content, language)
    }

    /// Parse in-memory content as the given language
    pub fn parse_str(path: impl AsRef<Path>, content: &str, language: Language) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ScanError::parse_failed(&path, e.to_string()))?;
        let tree = parser
            .parse(content, None)
            .ok_or_else(|| ScanError::parse_failed(&path, "tree-sitter returned no tree"))?;

        let lines: Vec<String> = content.lines().map(str::to_string).collect();
        let had_trailing_newline = content.ends_with('\n');

        let mut comments = Vec::new();
        collect_comments(tree.root_node(), content, language, &mut comments);
        comments.sort_by_key(|c| (c.line, c.col));

        Ok(Self {
            path,
            language,
            lines,
            had_trailing_newline,
            comments,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// File content split into lines (newline terminators stripped)
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, idx: usize) -> Option<&str> {
        self.lines.get(idx).map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn had_trailing_newline(&self) -> bool {
        self.had_trailing_newline
    }

    /// All line comments in source order
    pub fn comments(&self) -> &[CommentLine] {
        &self.comments
    }

    /// Leading whitespace of the given line, up to `col`
    pub fn indent_before(&self, line: usize, col: usize) -> &str {
        self.line(line)
            .and_then(|l| l.get(..col))
            .unwrap_or_default()
    }

    /// Reassemble the file content from `lines`, preserving the presence or
    /// absence of the trailing newline.
    pub fn render_lines(lines: &[String], trailing_newline: bool) -> String {
        let mut out = lines.join("\n");
        if trailing_newline && !lines.is_empty() {
            out.push('\n');
        }
        out
    }
}

/// Walk the tree collecting single-line comments.
///
/// Tree-sitter reports block comments with the same node kind in some
/// grammars; anything spanning multiple lines or not starting with the
/// language's line leader is skipped.
fn collect_comments(node: Node, content: &str, language: Language, out: &mut Vec<CommentLine>) {
    let kinds = language.comment_node_kinds();
    let leader = language.comment_leader();

    let mut cursor = node.walk();
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        if kinds.contains(&node.kind()) {
            let start = node.start_position();
            let end = node.end_position();
            if start.row == end.row {
                if let Ok(text) = node.utf8_text(content.as_bytes()) {
                    if let Some(body) = text.strip_prefix(leader) {
                        out.push(CommentLine {
                            line: start.row,
                            col: start.column,
                            end_col: end.column,
                            leader,
                            body: body.to_string(),
                        });
                    }
                }
            }
            continue;
        }
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
}
