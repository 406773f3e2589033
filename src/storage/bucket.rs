use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::TryStreamExt;
use object_store::aws::{AmazonS3Builder, AmazonS3ConfigKey};
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

use crate::config::StorageConfig;
use crate::constants::storage::LIST_PAGE_SIZE;
use crate::errors::PipelineError;

use super::{ListPage, ObjectEntry, ObjectStore};

/// Bucket reached through the `object_store` crate.
///
/// `connect` talks to S3 (or an S3-compatible endpoint) with the validated
/// credentials; `local` serves a directory with the same key semantics.
/// Calls block on a private current-thread runtime.
pub struct BucketStore {
    backend: Arc<dyn object_store::ObjectStore>,
    runtime: Runtime,
    location: String,
    page_size: usize,
}

impl BucketStore {
    /// Open the S3 bucket described by validated storage settings.
    pub fn connect(config: &StorageConfig) -> Result<Self, PipelineError> {
        let backend = s3_builder(config).build()?;
        let location = match &config.endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket),
            None => format!("s3://{}", config.bucket),
        };
        Self::with_backend(Arc::new(backend), location)
    }

    /// Serve objects from the directory `root`, creating it when absent.
    pub fn local(root: impl Into<PathBuf>) -> Result<Self, PipelineError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let backend = LocalFileSystem::new_with_prefix(&root)?;
        Self::with_backend(Arc::new(backend), format!("file://{}", root.display()))
    }

    fn with_backend(
        backend: Arc<dyn object_store::ObjectStore>,
        location: String,
    ) -> Result<Self, PipelineError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| PipelineError::Storage(format!("storage runtime: {err}")))?;
        Ok(Self {
            backend,
            runtime,
            location,
            page_size: LIST_PAGE_SIZE,
        })
    }

    /// Override the listing page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

/// S3 client settings built from `config`. Nothing is read from the ambient
/// AWS environment.
pub(crate) fn s3_builder(config: &StorageConfig) -> AmazonS3Builder {
    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(&config.bucket)
        .with_region(&config.region)
        .with_access_key_id(&config.access_key)
        .with_secret_access_key(&config.secret_key);
    if let Some(endpoint) = &config.endpoint {
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(endpoint.starts_with("http://"))
            .with_config(AmazonS3ConfigKey::VirtualHostedStyleRequest, "false");
    }
    builder
}

fn object_path(key: &str) -> Result<ObjectPath, PipelineError> {
    let key = key.trim_matches('/');
    if key.is_empty() {
        return Err(PipelineError::Storage("empty object key".to_string()));
    }
    ObjectPath::parse(key)
        .map_err(|err| PipelineError::Storage(format!("invalid object key '{key}': {err}")))
}

fn prefix_path(prefix: &str) -> Result<Option<ObjectPath>, PipelineError> {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        Ok(None)
    } else {
        object_path(prefix).map(Some)
    }
}

impl ObjectStore for BucketStore {
    fn describe(&self) -> String {
        self.location.clone()
    }

    fn put_file(&self, local: &Path, key: &str) -> Result<(), PipelineError> {
        if !local.is_file() {
            return Err(PipelineError::MissingInput {
                path: local.to_path_buf(),
            });
        }
        let location = object_path(key)?;
        let body = fs::read(local)?;
        debug!("[problemset:store] put {} ({} bytes)", location, body.len());
        self.runtime.block_on(self.backend.put(&location, body.into()))?;
        Ok(())
    }

    fn get_file(&self, key: &str, dest: &Path) -> Result<(), PipelineError> {
        let location = object_path(key)?;
        let body = self.runtime.block_on(async {
            self.backend.get(&location).await?.bytes().await
        })?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, &body)?;
        Ok(())
    }

    fn list_page(&self, prefix: &str, token: Option<&str>) -> Result<ListPage, PipelineError> {
        let prefix = prefix_path(prefix)?;
        let metas: Vec<object_store::ObjectMeta> = self.runtime.block_on(async {
            match token {
                Some(after) => {
                    let offset = ObjectPath::from(after);
                    self.backend
                        .list_with_offset(prefix.as_ref(), &offset)
                        .try_collect::<Vec<_>>()
                        .await
                }
                None => {
                    self.backend
                        .list(prefix.as_ref())
                        .try_collect::<Vec<_>>()
                        .await
                }
            }
        })?;

        let mut entries: Vec<ObjectEntry> = metas
            .into_iter()
            .map(|meta| ObjectEntry {
                key: meta.location.to_string(),
                size: meta.size as u64,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        let next_token = if entries.len() > self.page_size {
            entries.truncate(self.page_size);
            entries.last().map(|entry| entry.key.clone())
        } else {
            None
        };
        Ok(ListPage {
            entries,
            next_token,
        })
    }
}
