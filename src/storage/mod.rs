//! Object-storage collaborator used to distribute pipeline artifacts.
//!
//! The pipeline never depends on storage for correctness. Backends implement
//! [`ObjectStore`]; key derivation and directory sync live here so every
//! backend shares the same size-based change skipping.

use std::collections::HashMap;
use std::path::Path;

use tracing::{info, warn};

use crate::errors::PipelineError;
use crate::transport::fs::{FileStream, file_size, relative_slash_path};
use crate::types::ObjectKey;

/// S3 and directory buckets through the `object_store` crate.
pub mod bucket;

pub use bucket::BucketStore;

/// One listed object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Full object key.
    pub key: ObjectKey,
    /// Object size in bytes.
    pub size: u64,
}

/// One page of a prefix listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Objects on this page, in key order.
    pub entries: Vec<ObjectEntry>,
    /// Token to pass back for the next page; `None` on the last page.
    pub next_token: Option<String>,
}

/// Minimal object-store surface.
pub trait ObjectStore: Send + Sync {
    /// Human-readable location used in log lines.
    fn describe(&self) -> String;
    /// Upload `local` under `key`, replacing any existing object.
    fn put_file(&self, local: &Path, key: &str) -> Result<(), PipelineError>;
    /// Download `key` to `dest`, creating parent directories.
    fn get_file(&self, key: &str, dest: &Path) -> Result<(), PipelineError>;
    /// One page of objects whose key starts with `prefix`.
    fn list_page(&self, prefix: &str, token: Option<&str>) -> Result<ListPage, PipelineError>;

    /// Every object under `prefix`, following continuation tokens.
    fn list_prefix(&self, prefix: &str) -> Result<Vec<ObjectEntry>, PipelineError> {
        let mut entries = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self.list_page(prefix, token.as_deref())?;
            entries.extend(page.entries);
            match page.next_token {
                Some(next) => token = Some(next),
                None => return Ok(entries),
            }
        }
    }
}

/// Counts reported by a directory sync.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Files uploaded or downloaded (would-be transfers on a dry run).
    pub transferred: usize,
    /// Files skipped because the size on the other side already matched.
    pub skipped: usize,
}

/// Object key of `local_path`: its path relative to `project_root`, with
/// forward slashes, under `prefix` when non-empty.
pub fn object_key_for(
    project_root: &Path,
    local_path: &Path,
    prefix: &str,
) -> Result<ObjectKey, PipelineError> {
    let relative = relative_slash_path(project_root, local_path).ok_or_else(|| {
        PipelineError::Storage(format!(
            "{} is not under project root {}",
            local_path.display(),
            project_root.display()
        ))
    })?;
    let prefix = prefix.trim_matches('/');
    let key = if prefix.is_empty() {
        relative
    } else {
        format!("{prefix}/{relative}")
    };
    Ok(key.trim_matches('/').to_string())
}

/// Upload every file under `local_dir`.
///
/// With `only_changed`, files whose remote object already has the same size
/// are skipped.
pub fn sync_up(
    store: &dyn ObjectStore,
    project_root: &Path,
    local_dir: &Path,
    prefix: &str,
    dry_run: bool,
    only_changed: bool,
) -> Result<SyncReport, PipelineError> {
    if !local_dir.is_dir() {
        return Err(PipelineError::MissingInput {
            path: local_dir.to_path_buf(),
        });
    }
    let prefix = prefix.trim_matches('/');
    info!(
        "[problemset:store] sync {} -> {}/{}",
        local_dir.display(),
        store.describe(),
        prefix
    );

    let remote: HashMap<ObjectKey, u64> = if only_changed {
        store
            .list_prefix(prefix)?
            .into_iter()
            .map(|entry| (entry.key, entry.size))
            .collect()
    } else {
        HashMap::new()
    };

    let mut report = SyncReport::default();
    for path in FileStream::new(local_dir).files() {
        let key = object_key_for(project_root, &path, prefix)?;
        let size = file_size(&path).unwrap_or(0);
        if only_changed && remote.get(&key) == Some(&size) {
            info!("[problemset:store] skip (same size) {key}");
            report.skipped += 1;
            continue;
        }
        if dry_run {
            info!("[problemset:store] DRY-RUN upload {} -> {key}", path.display());
        } else {
            store.put_file(&path, &key)?;
            info!("[problemset:store] uploaded {} -> {key}", path.display());
        }
        report.transferred += 1;
    }
    info!(
        "[problemset:store] sync complete: {} transferred, {} skipped",
        report.transferred, report.skipped
    );
    Ok(report)
}

/// Download every object under `prefix` into `local_dir`, keeping the key
/// structure below the prefix. Local files with a matching size are skipped.
pub fn sync_down(
    store: &dyn ObjectStore,
    prefix: &str,
    local_dir: &Path,
    dry_run: bool,
) -> Result<SyncReport, PipelineError> {
    let prefix = prefix.trim_matches('/');
    info!(
        "[problemset:store] sync-down {}/{} -> {}",
        store.describe(),
        prefix,
        local_dir.display()
    );
    if !dry_run {
        std::fs::create_dir_all(local_dir)?;
    }

    let mut report = SyncReport::default();
    for entry in store.list_prefix(prefix)? {
        let relative = entry
            .key
            .strip_prefix(prefix)
            .unwrap_or(&entry.key)
            .trim_start_matches('/');
        if relative.is_empty() || relative.split('/').any(|part| part == "..") {
            warn!("[problemset:store] skipping unsafe key {}", entry.key);
            continue;
        }
        let dest = local_dir.join(relative);
        if file_size(&dest) == Some(entry.size) {
            report.skipped += 1;
            continue;
        }
        if dry_run {
            info!("[problemset:store] DRY-RUN download {} -> {}", entry.key, dest.display());
        } else {
            store.get_file(&entry.key, &dest)?;
            info!("[problemset:store] downloaded {} -> {}", entry.key, dest.display());
        }
        report.transferred += 1;
    }
    info!(
        "[problemset:store] sync-down complete: {} transferred, {} skipped",
        report.transferred, report.skipped
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn object_keys_are_root_relative_and_prefixed() {
        let root = Path::new("/work/project");
        let file = root.join("data").join("clean").join("apps").join("train.parquet");
        assert_eq!(
            object_key_for(root, &file, "").unwrap(),
            "data/clean/apps/train.parquet"
        );
        assert_eq!(
            object_key_for(root, &file, "/corpus/v1/").unwrap(),
            "corpus/v1/data/clean/apps/train.parquet"
        );
    }

    #[test]
    fn paths_outside_the_root_are_rejected() {
        let err = object_key_for(
            Path::new("/work/project"),
            &PathBuf::from("/tmp/other.parquet"),
            "",
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Storage(_)));
    }
}
