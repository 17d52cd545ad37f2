use crate::error::{Result, ScanError};
use std::path::Path;

/// Supported source language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" | "pyw" => Language::Python,
            "js" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            _ => Language::Unknown,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Get language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Unknown => "unknown",
        }
    }

    /// Whether a comment model can be built for this language
    pub fn is_supported(self) -> bool {
        self != Language::Unknown
    }

    /// Get Tree-sitter language instance
    pub fn tree_sitter_language(self) -> Result<tree_sitter::Language> {
        match self {
            Language::Rust => Ok(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Ok(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Unknown => Err(ScanError::UnsupportedLanguage(self.as_str().into())),
        }
    }

    /// Line-comment leader for this language
    pub fn comment_leader(self) -> &'static str {
        match self {
            Language::Rust | Language::JavaScript | Language::TypeScript => "//",
            Language::Python => "#",
            Language::Unknown => "",
        }
    }

    /// Node kinds that tree-sitter uses for comments in this grammar
    pub(crate) fn comment_node_kinds(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["line_comment"],
            Language::Python => &["comment"],
            Language::JavaScript | Language::TypeScript => &["comment"],
            Language::Unknown => &[],
        }
    }
}
