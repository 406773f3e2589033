use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::PipelineError;
use crate::transport::fs::FileStream;

use super::fields::RawRecord;
use super::shards::{is_supported_shard, read_shard};
use super::{RawRecordSource, SourceSpec};

/// Reads pre-downloaded shards from `<root>/<source key>/`.
///
/// A shard belongs to a split when its file name starts with the split name
/// (`train.jsonl`, `train-00000-of-00002.parquet`) or when it sits under a
/// directory named after the split (`train/part-0.parquet`).
#[derive(Clone, Debug)]
pub struct LocalShardSource {
    root: PathBuf,
}

impl LocalShardSource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Shards of `split` under `dir`, sorted by path.
    pub fn shards_for(dir: &Path, split: &str) -> Vec<PathBuf> {
        FileStream::new(dir)
            .files()
            .into_iter()
            .filter(|path| is_supported_shard(path) && belongs_to_split(dir, path, split))
            .collect()
    }
}

impl RawRecordSource for LocalShardSource {
    fn name(&self) -> &str {
        "local"
    }

    fn fetch(&self, spec: &SourceSpec, split: &str) -> Result<Vec<RawRecord>, PipelineError> {
        let dir = self.root.join(&spec.key);
        if !dir.is_dir() {
            return Err(PipelineError::MissingInput { path: dir });
        }
        let shards = Self::shards_for(&dir, split);
        if shards.is_empty() {
            return Err(PipelineError::SourceUnavailable {
                source_key: spec.key.clone(),
                reason: format!("no '{split}' shards under {}", dir.display()),
            });
        }
        let mut records = Vec::new();
        for shard in &shards {
            let rows = read_shard(shard)?;
            debug!(
                "[problemset:local] read {} rows from {}",
                rows.len(),
                shard.display()
            );
            records.extend(rows);
        }
        Ok(records)
    }
}

fn belongs_to_split(root: &Path, path: &Path, split: &str) -> bool {
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    let mut components = relative
        .components()
        .filter_map(|component| component.as_os_str().to_str())
        .collect::<Vec<_>>();
    let Some(file_name) = components.pop() else {
        return false;
    };
    components.iter().any(|dir| *dir == split) || file_name_matches_split(file_name, split)
}

fn file_name_matches_split(file_name: &str, split: &str) -> bool {
    let Some(rest) = file_name.strip_prefix(split) else {
        return false;
    };
    rest.starts_with(['.', '-', '_'])
}
