//! HuggingFace acquisition backend.
//!
//! Shards are resolved through the datasets-server parquet manifest first;
//! when that yields nothing, repository siblings from the hub API are used.
//! Every shard is downloaded into a local cache before decoding.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use serde_json::Value;
use tracing::{info, warn};

use crate::constants::huggingface::{
    CACHE_DIR_ENV, DEFAULT_CACHE_DIR, DOWNLOAD_RETRIES, PARQUET_MANIFEST_ENDPOINT,
    SHARD_EXTENSIONS, TOKEN_ENV,
};
use crate::errors::PipelineError;
use crate::utils::escape_path_segment;

use super::fields::RawRecord;
use super::shards::read_shard;
use super::{RawRecordSource, SourceSpec};

/// Settings for [`HuggingFaceSource`].
#[derive(Clone, Debug)]
pub struct HuggingFaceSourceConfig {
    /// Directory holding downloaded shards.
    pub cache_dir: PathBuf,
    /// Dataset config name; `None` accepts every config of the dataset.
    pub config_name: Option<String>,
    /// Optional access token for gated datasets.
    pub token: Option<String>,
    /// Parquet manifest endpoint.
    pub manifest_endpoint: String,
}

impl HuggingFaceSourceConfig {
    /// Config caching shards under `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            config_name: None,
            token: None,
            manifest_endpoint: PARQUET_MANIFEST_ENDPOINT.to_string(),
        }
    }

    /// Resolve the cache directory and token from the environment.
    pub fn from_env(data_dir: &Path) -> Self {
        let cache_dir = std::env::var(CACHE_DIR_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DEFAULT_CACHE_DIR));
        let mut config = Self::new(cache_dir);
        config.token = std::env::var(TOKEN_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        config
    }
}

/// One shard listed by the parquet manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteShard {
    /// Download URL.
    pub url: String,
    /// Size in bytes when the manifest reports one.
    pub size: Option<u64>,
}

/// Downloads and decodes dataset shards from the HuggingFace hub.
pub struct HuggingFaceSource {
    config: HuggingFaceSourceConfig,
}

impl HuggingFaceSource {
    /// Source with the given cache and token settings.
    pub fn new(config: HuggingFaceSourceConfig) -> Self {
        Self { config }
    }

    /// Extract shards for `split` (and the configured config name) from a
    /// datasets-server manifest body.
    pub fn parse_manifest(
        body: &str,
        split: &str,
        config_name: Option<&str>,
    ) -> Result<Vec<RemoteShard>, String> {
        let json: Value = serde_json::from_str(body)
            .map_err(|err| format!("failed parsing parquet manifest: {err}"))?;
        let mut shards = Vec::new();
        let Some(entries) = json.get("parquet_files").and_then(Value::as_array) else {
            return Ok(shards);
        };
        for entry in entries {
            let Some(url) = entry.get("url").and_then(Value::as_str) else {
                continue;
            };
            if entry
                .get("split")
                .and_then(Value::as_str)
                .is_some_and(|value| value != split)
            {
                continue;
            }
            if let Some(wanted) = config_name
                && entry
                    .get("config")
                    .and_then(Value::as_str)
                    .is_some_and(|value| value != wanted)
            {
                continue;
            }
            shards.push(RemoteShard {
                url: url.to_string(),
                size: entry.get("size").and_then(Value::as_u64),
            });
        }
        Ok(shards)
    }

    /// Repository files that look like shards of `split`, sorted.
    pub fn select_siblings(siblings: &[String], split: &str) -> Vec<String> {
        let mut selected: Vec<String> = siblings
            .iter()
            .filter(|name| {
                let lower = name.to_ascii_lowercase();
                let has_extension = SHARD_EXTENSIONS
                    .iter()
                    .any(|ext| lower.ends_with(&format!(".{ext}")));
                has_extension
                    && Path::new(name.as_str())
                        .components()
                        .filter_map(|component| component.as_os_str().to_str())
                        .any(|part| {
                            part == split
                                || part.starts_with(&format!("{split}-"))
                                || part.starts_with(&format!("{split}."))
                        })
            })
            .cloned()
            .collect();
        selected.sort();
        selected
    }

    fn manifest_shards(
        &self,
        spec: &SourceSpec,
        split: &str,
    ) -> Result<Vec<RemoteShard>, PipelineError> {
        info!(
            "[problemset:hf] reading parquet manifest for dataset {} split={}",
            spec.locator, split
        );
        let mut request = ureq::get(&self.config.manifest_endpoint)
            .query("dataset", &spec.locator)
            .query("split", split);
        if let Some(config_name) = &self.config.config_name {
            request = request.query("config", config_name);
        }
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", &format!("Bearer {token}"));
        }
        let response = request.call().map_err(|err| PipelineError::SourceUnavailable {
            source_key: spec.key.clone(),
            reason: format!("failed querying parquet manifest: {err}"),
        })?;
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|err| PipelineError::SourceUnavailable {
                source_key: spec.key.clone(),
                reason: format!("failed reading parquet manifest body: {err}"),
            })?;
        Self::parse_manifest(&body, split, self.config.config_name.as_deref()).map_err(|reason| {
            PipelineError::SourceUnavailable {
                source_key: spec.key.clone(),
                reason,
            }
        })
    }

    fn download_shard(
        &self,
        spec: &SourceSpec,
        shard: &RemoteShard,
    ) -> Result<PathBuf, PipelineError> {
        let target = self.cache_path_for(spec, &shard.url);
        if target_matches_expected_size(&target, shard.size) {
            return Ok(target);
        }
        if target.exists() {
            warn!(
                "[problemset:hf] incomplete cached shard detected (will redownload): {}",
                target.display()
            );
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let partial = target.with_extension("part");
        let mut last_error = String::new();
        for attempt in 1..=DOWNLOAD_RETRIES {
            let mut request = ureq::get(&shard.url);
            if let Some(token) = &self.config.token {
                request = request.header("Authorization", &format!("Bearer {token}"));
            }
            let result = request
                .call()
                .map_err(|err| err.to_string())
                .and_then(|response| {
                    let mut reader = response.into_body().into_reader();
                    let mut file = File::create(&partial).map_err(|err| err.to_string())?;
                    io::copy(&mut reader, &mut file).map_err(|err| err.to_string())
                });
            match result {
                Ok(bytes) => {
                    fs::rename(&partial, &target)?;
                    info!(
                        "[problemset:hf] downloaded {} ({} bytes)",
                        shard.url, bytes
                    );
                    return Ok(target);
                }
                Err(err) => {
                    warn!(
                        "[problemset:hf] download attempt {attempt}/{DOWNLOAD_RETRIES} failed for {}: {err}",
                        shard.url
                    );
                    last_error = err;
                }
            }
        }
        Err(PipelineError::SourceUnavailable {
            source_key: spec.key.clone(),
            reason: format!("failed downloading {}: {last_error}", shard.url),
        })
    }

    fn hub_shards(&self, spec: &SourceSpec, split: &str) -> Result<Vec<PathBuf>, PipelineError> {
        let unavailable = |reason: String| PipelineError::SourceUnavailable {
            source_key: spec.key.clone(),
            reason,
        };
        let api = ApiBuilder::new()
            .with_progress(true)
            .with_retries(DOWNLOAD_RETRIES)
            .with_token(self.config.token.clone())
            .with_cache_dir(self.config.cache_dir.join("hub"))
            .build()
            .map_err(|err| unavailable(format!("failed building hf-hub client: {err}")))?;
        let repo_api = api.repo(Repo::new(spec.locator.clone(), RepoType::Dataset));
        info!(
            "[problemset:hf] reading remote file list for dataset {}",
            spec.locator
        );
        let repo_info = repo_api
            .info()
            .map_err(|err| unavailable(format!("failed reading hf-hub repository info: {err}")))?;
        let siblings = repo_info
            .siblings
            .into_iter()
            .map(|entry| entry.rfilename)
            .collect::<Vec<_>>();

        let mut paths = Vec::new();
        for remote_path in Self::select_siblings(&siblings, split) {
            let local = repo_api.get(&remote_path).map_err(|err| {
                unavailable(format!("failed downloading '{remote_path}' from hf-hub: {err}"))
            })?;
            paths.push(local);
        }
        Ok(paths)
    }

    fn cache_path_for(&self, spec: &SourceSpec, url: &str) -> PathBuf {
        let suffix = url
            .split("/resolve/")
            .nth(1)
            .or_else(|| url.rsplit_once("://").map(|(_, rest)| rest))
            .unwrap_or(url);
        let mut path = self.config.cache_dir.join(escape_path_segment(&spec.key));
        for segment in suffix.split('/').filter(|segment| !segment.is_empty()) {
            path.push(escape_path_segment(segment));
        }
        path
    }
}

impl RawRecordSource for HuggingFaceSource {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn fetch(&self, spec: &SourceSpec, split: &str) -> Result<Vec<RawRecord>, PipelineError> {
        let manifest = match self.manifest_shards(spec, split) {
            Ok(shards) => shards,
            Err(err) => {
                warn!("[problemset:hf] {err}; falling back to repository listing");
                Vec::new()
            }
        };

        let mut local_paths = Vec::with_capacity(manifest.len());
        for shard in &manifest {
            local_paths.push(self.download_shard(spec, shard)?);
        }
        if local_paths.is_empty() {
            local_paths = self.hub_shards(spec, split)?;
        }
        if local_paths.is_empty() {
            return Err(PipelineError::SourceUnavailable {
                source_key: spec.key.clone(),
                reason: format!("no shards found for split '{split}' of {}", spec.locator),
            });
        }

        let mut records = Vec::new();
        for path in &local_paths {
            records.extend(read_shard(path)?);
        }
        info!(
            "[problemset:hf] loaded {} raw records for {} split={} from {} shard(s)",
            records.len(),
            spec.locator,
            split,
            local_paths.len()
        );
        Ok(records)
    }
}

fn target_matches_expected_size(target: &Path, expected: Option<u64>) -> bool {
    let Ok(metadata) = fs::metadata(target) else {
        return false;
    };
    match expected {
        Some(size) => metadata.len() == size,
        None => metadata.len() > 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::registry::SourceRegistry;
    use tempfile::tempdir;

    #[test]
    fn parse_manifest_filters_split_and_config() {
        let body = r#"{
            "parquet_files": [
                {"config": "default", "split": "train", "url": "https://host/d/resolve/refs/train/0000.parquet", "size": 11},
                {"config": "default", "split": "test", "url": "https://host/d/resolve/refs/test/0000.parquet", "size": 5},
                {"config": "other", "split": "train", "url": "https://host/d/resolve/refs/other/0000.parquet"},
                {"split": "train"}
            ]
        }"#;
        let all = HuggingFaceSource::parse_manifest(body, "train", None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].size, Some(11));

        let only_default =
            HuggingFaceSource::parse_manifest(body, "train", Some("default")).unwrap();
        assert_eq!(
            only_default,
            vec![RemoteShard {
                url: "https://host/d/resolve/refs/train/0000.parquet".to_string(),
                size: Some(11),
            }]
        );

        assert!(HuggingFaceSource::parse_manifest("{}", "train", None).unwrap().is_empty());
        assert!(HuggingFaceSource::parse_manifest("nope", "train", None).is_err());
    }

    #[test]
    fn select_siblings_keeps_split_shards_only() {
        let siblings = vec![
            "README.md".to_string(),
            "data/train-00000-of-00002.parquet".to_string(),
            "data/test-00000-of-00001.parquet".to_string(),
            "train/part.jsonl".to_string(),
            "training_notes.json".to_string(),
        ];
        assert_eq!(
            HuggingFaceSource::select_siblings(&siblings, "train"),
            vec![
                "data/train-00000-of-00002.parquet".to_string(),
                "train/part.jsonl".to_string()
            ]
        );
    }

    #[test]
    fn cache_paths_are_scoped_by_source_key() {
        let dir = tempdir().unwrap();
        let source = HuggingFaceSource::new(HuggingFaceSourceConfig::new(dir.path()));
        let registry = SourceRegistry::builtin();
        let spec = registry.get("apps").unwrap();
        let path =
            source.cache_path_for(spec, "https://host/datasets/x/resolve/main/train/0000.parquet");
        assert_eq!(
            path,
            dir.path().join("apps").join("main").join("train").join("0000.parquet")
        );
    }

    #[test]
    fn size_check_requires_matching_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shard.parquet");
        assert!(!target_matches_expected_size(&path, Some(3)));
        fs::write(&path, b"abc").unwrap();
        assert!(target_matches_expected_size(&path, Some(3)));
        assert!(!target_matches_expected_size(&path, Some(4)));
        assert!(target_matches_expected_size(&path, None));
    }
}
