//! Utility helpers - input collection for a batch

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffixes accepted as book input, matched case-insensitively
const SUPPORTED_SUFFIXES: [&str; 3] = [".fb2", ".fb2.zip", ".zip"];

/// Whether the path names a file type the converter accepts
pub fn is_supported_book(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_ascii_lowercase();
    SUPPORTED_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Expand the given files and directories into a flat, deduplicated list of
/// supported book files. Directories are walked recursively; input order is
/// preserved.
pub fn collect_book_files(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();

    let mut push = |path: PathBuf, files: &mut Vec<PathBuf>| {
        if seen.insert(path.clone()) {
            files.push(path);
        }
    };

    for input in inputs {
        if input.is_dir() {
            for entry in WalkDir::new(input)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                if is_supported_book(entry.path()) {
                    push(entry.into_path(), &mut files);
                }
            }
        } else if is_supported_book(input) {
            push(input.clone(), &mut files);
        }
    }

    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_supported_suffixes() {
        assert!(is_supported_book(Path::new("book.fb2")));
        assert!(is_supported_book(Path::new("book.FB2")));
        assert!(is_supported_book(Path::new("book.fb2.zip")));
        assert!(is_supported_book(Path::new("archive.zip")));
        assert!(!is_supported_book(Path::new("book.epub")));
        assert!(!is_supported_book(Path::new("notes.txt")));
    }

    #[test]
    fn test_collect_walks_dirs_and_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("shelf").join("inner");
        fs::create_dir_all(&nested).unwrap();

        let top = dir.path().join("top.fb2");
        let deep = nested.join("deep.fb2.zip");
        fs::write(&top, b"").unwrap();
        fs::write(&deep, b"").unwrap();
        fs::write(nested.join("ignored.txt"), b"").unwrap();

        // the explicit file also sits inside the walked directory
        let inputs = vec![top.clone(), dir.path().to_path_buf()];
        let files = collect_book_files(&inputs);

        assert_eq!(files.iter().filter(|f| **f == top).count(), 1);
        assert!(files.contains(&deep));
        assert_eq!(files.len(), 2);
    }
}
