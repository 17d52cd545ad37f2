use doctest_scanner::Language;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Expand CLI arguments into concrete source files.
///
/// Files are kept when their language has a comment model; directories are
/// walked gitignore-aware, the way the rest of the toolchain expects.
pub fn discover(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk_dir(path, &mut files);
        } else if Language::from_path(path).is_supported() {
            files.push(path.clone());
        } else {
            log::warn!("skipping {}: unsupported language", path.display());
        }
    }
    files.sort();
    files.dedup();
    files
}

fn walk_dir(root: &Path, files: &mut Vec<PathBuf>) {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true);

    for result in builder.build() {
        match result {
            Ok(entry) => {
                if !entry.file_type().is_some_and(|t| t.is_file()) {
                    continue;
                }
                let path = entry.path();
                if Language::from_path(path).is_supported() {
                    files.push(path.to_path_buf());
                }
            }
            Err(e) => log::warn!("failed to read entry: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn keeps_supported_files_and_walks_directories() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn main() {}\n").unwrap();
        fs::write(dir.path().join("b.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello\n").unwrap();

        let files = discover(&[dir.path().to_path_buf()]);
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() != "txt"));
    }

    #[test]
    fn unsupported_explicit_file_is_skipped() {
        let dir = tempdir().unwrap();
        let txt = dir.path().join("notes.txt");
        fs::write(&txt, "hello\n").unwrap();

        let files = discover(&[txt]);
        assert!(files.is_empty());
    }
}
