use std::env;
use std::path::{Path, PathBuf};

use crate::constants::layout::{
    CLEAN_DIR, DATA_DIR_ENV, DEFAULT_DATA_DIR, RAW_DIR, TABLE_EXTENSION, UNION_DIR,
};
use crate::constants::normalize::MIN_PROMPT_CHARS;
use crate::constants::storage::{
    ACCESS_KEY_ENV, DEFAULT_REGION, SECRET_KEY_ENV, STORE_BUCKET_ENV, STORE_ENDPOINT_ENV,
    STORE_PREFIX_ENV, STORE_REGION_ENV,
};
use crate::constants::union::{DEFAULT_SHUFFLE_PARTITIONS, SAMPLE_ROWS};
use crate::errors::PipelineError;

/// Location of the RAW, CLEAN, and UNION tiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Root data directory.
    pub data_dir: PathBuf,
}

impl PipelineConfig {
    /// Config rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolve the data directory from `PROBLEMSET_DATA_DIR`, defaulting to `data`.
    pub fn from_env() -> Self {
        let data_dir = env::var(DATA_DIR_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        Self::new(data_dir)
    }

    /// Mapped-only tier.
    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join(RAW_DIR)
    }

    /// Locally cleaned tier.
    pub fn clean_dir(&self) -> PathBuf {
        self.data_dir.join(CLEAN_DIR)
    }

    /// Globally unified tier.
    pub fn union_dir(&self) -> PathBuf {
        self.clean_dir().join(UNION_DIR)
    }

    /// RAW file of one (source, split) pair.
    pub fn raw_path(&self, source_key: &str, split: &str) -> PathBuf {
        tier_file(&self.raw_dir(), source_key, split)
    }

    /// CLEAN file of one (source, split) pair.
    pub fn clean_path(&self, source_key: &str, split: &str) -> PathBuf {
        tier_file(&self.clean_dir(), source_key, split)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

fn tier_file(tier: &Path, source_key: &str, split: &str) -> PathBuf {
    tier.join(source_key)
        .join(format!("{split}.{TABLE_EXTENSION}"))
}

/// Controls for the local cleaning stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanOptions {
    /// Drop rows whose `solution` is empty.
    pub require_solution: bool,
    /// Minimum normalized prompt length, in characters.
    pub min_prompt_chars: usize,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            require_solution: false,
            min_prompt_chars: MIN_PROMPT_CHARS,
        }
    }
}

/// Controls for the distributed union stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnionConfig {
    /// Worker threads; `None` lets the engine pick one per core.
    pub workers: Option<usize>,
    /// Number of shuffle buckets used for global deduplication.
    pub shuffle_partitions: usize,
    /// Rows written to the flat inspection sample.
    pub sample_rows: usize,
    /// Minimum normalized prompt length, in characters.
    pub min_prompt_chars: usize,
}

impl Default for UnionConfig {
    fn default() -> Self {
        Self {
            workers: None,
            shuffle_partitions: DEFAULT_SHUFFLE_PARTITIONS,
            sample_rows: SAMPLE_ROWS,
            min_prompt_chars: MIN_PROMPT_CHARS,
        }
    }
}

/// Object-storage settings. Credentials are checked before any storage call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageConfig {
    /// Bucket name.
    pub bucket: String,
    /// Bucket region.
    pub region: String,
    /// Custom endpoint for S3-compatible services; `None` uses AWS.
    pub endpoint: Option<String>,
    /// Key prefix prepended to derived keys; may be empty.
    pub prefix: String,
    /// Access key id.
    pub access_key: String,
    /// Secret access key.
    pub secret_key: String,
}

impl StorageConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, PipelineError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load through `lookup`, reporting every missing required name at once.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PipelineError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let bucket = read(STORE_BUCKET_ENV);
        let access_key = read(ACCESS_KEY_ENV);
        let secret_key = read(SECRET_KEY_ENV);

        let missing: Vec<String> = [
            (STORE_BUCKET_ENV, bucket.is_none()),
            (ACCESS_KEY_ENV, access_key.is_none()),
            (SECRET_KEY_ENV, secret_key.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name.to_string())
        .collect();

        match (bucket, access_key, secret_key) {
            (Some(bucket), Some(access_key), Some(secret_key)) => Ok(Self {
                bucket,
                region: read(STORE_REGION_ENV).unwrap_or_else(|| DEFAULT_REGION.to_string()),
                endpoint: read(STORE_ENDPOINT_ENV),
                prefix: read(STORE_PREFIX_ENV)
                    .map(|prefix| prefix.trim_matches('/').to_string())
                    .unwrap_or_default(),
                access_key,
                secret_key,
            }),
            _ => Err(PipelineError::CredentialMissing { missing }),
        }
    }
}
