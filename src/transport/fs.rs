use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::constants::layout::TABLE_EXTENSION;
use crate::errors::PipelineError;

/// Filesystem walker over a tier root.
pub struct FileStream {
    root: PathBuf,
}

impl FileStream {
    /// Create a stream rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Every regular file below the root, in lexicographic path order.
    ///
    /// A missing root yields an empty list.
    pub fn files(&self) -> Vec<PathBuf> {
        self.collect(None, |_| true)
    }

    /// Files exactly `depth` levels below the root that satisfy `keep`.
    pub fn files_at_depth(&self, depth: usize, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
        self.collect(Some(depth), keep)
    }

    fn collect(&self, depth: Option<usize>, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
        if !self.root.exists() {
            return Vec::new();
        }
        let mut walker = WalkDir::new(&self.root);
        if let Some(depth) = depth {
            walker = walker.min_depth(depth).max_depth(depth);
        }
        let mut candidates: Vec<PathBuf> = walker
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| keep(path))
            .collect();
        candidates.sort();
        candidates
    }
}

/// True if the path has a `.parquet` extension (case-insensitive).
pub fn is_table_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(TABLE_EXTENSION))
        .unwrap_or(false)
}

/// CLEAN files of the form `<clean_dir>/<key>/<split>.parquet`.
///
/// Top-level directories whose name starts with `_` are skipped, the union
/// output among them.
pub fn discover_clean_tables(clean_dir: &Path) -> Vec<PathBuf> {
    FileStream::new(clean_dir).files_at_depth(2, |path| {
        is_table_file(path) && !in_reserved_dir(clean_dir, path)
    })
}

fn in_reserved_dir(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root)
        .ok()
        .and_then(|relative| relative.components().next())
        .and_then(|first| first.as_os_str().to_str())
        .map(|name| name.starts_with('_'))
        .unwrap_or(false)
}

/// Size of a file in bytes, or `None` when it does not exist.
pub fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path)
        .ok()
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
}

/// Remove a directory tree if present.
pub fn remove_dir_if_exists(path: &Path) -> Result<(), PipelineError> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}

/// Forward-slash relative path of `path` under `root`.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect();
    parts.map(|parts| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn discovery_only_returns_depth_two_tables_outside_reserved_dirs() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        touch(&root.join("leetcode").join("train.parquet"));
        touch(&root.join("apps").join("test.parquet"));
        touch(&root.join("apps").join("notes.txt"));
        touch(&root.join("top.parquet"));
        touch(&root.join("_union").join("source=APPS").join("part-00000.parquet"));
        touch(&root.join("_scratch").join("train.parquet"));

        let found = discover_clean_tables(root);
        assert_eq!(
            found,
            vec![
                root.join("apps").join("test.parquet"),
                root.join("leetcode").join("train.parquet"),
            ]
        );
    }

    #[test]
    fn missing_root_discovers_nothing() {
        let temp = tempdir().unwrap();
        assert!(discover_clean_tables(&temp.path().join("absent")).is_empty());
        assert!(FileStream::new(temp.path().join("absent")).files().is_empty());
    }

    #[test]
    fn relative_paths_use_forward_slashes() {
        let root = Path::new("/data/clean");
        let path = root.join("_union").join("sample_50.csv");
        assert_eq!(
            relative_slash_path(root, &path).as_deref(),
            Some("_union/sample_50.csv")
        );
        assert_eq!(relative_slash_path(root, Path::new("/elsewhere")), None);
    }

    #[test]
    fn file_size_ignores_directories() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("a.bin");
        fs::write(&file, b"12345").unwrap();
        assert_eq!(file_size(&file), Some(5));
        assert_eq!(file_size(temp.path()), None);
        assert_eq!(file_size(&temp.path().join("none")), None);
    }
}
