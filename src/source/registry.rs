//! Explicit source registry: source key to (locator, mapper, default splits).

use indexmap::IndexMap;

use crate::errors::PipelineError;
use crate::schema::UnifiedRecord;
use crate::types::{DatasetLocator, SourceKey, SplitName};

use super::fields::RawRecord;
use super::mappers::{MapperFn, map_apps, map_codeforces, map_codesearchnet, map_leetcode};

/// Everything the pipeline knows about one registered source.
#[derive(Clone, Debug)]
pub struct SourceSpec {
    /// Registry key, also the RAW/CLEAN directory name.
    pub key: SourceKey,
    /// External dataset locator handed to the acquisition backend.
    pub locator: DatasetLocator,
    /// Raw-record translator.
    pub mapper: MapperFn,
    /// Partitions materialized when the caller does not name any.
    pub default_splits: Vec<SplitName>,
}

impl SourceSpec {
    /// Capability triple for `key`.
    pub fn new(
        key: impl Into<SourceKey>,
        locator: impl Into<DatasetLocator>,
        mapper: MapperFn,
        default_splits: &[&str],
    ) -> Self {
        Self {
            key: key.into(),
            locator: locator.into(),
            mapper,
            default_splits: default_splits.iter().map(|split| split.to_string()).collect(),
        }
    }

    /// Translate one raw record.
    pub fn map(&self, record: &RawRecord) -> UnifiedRecord {
        (self.mapper)(record)
    }
}

/// Source registry, built once at startup and passed to the stages needing it.
#[derive(Clone, Debug, Default)]
pub struct SourceRegistry {
    specs: IndexMap<SourceKey, SourceSpec>,
}

impl SourceRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in sources.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(SourceSpec::new(
            "leetcode",
            "newfacade/LeetCodeDataset",
            map_leetcode,
            &["train"],
        ));
        registry.register(SourceSpec::new(
            "apps",
            "codeparrot/apps",
            map_apps,
            &["train"],
        ));
        registry.register(SourceSpec::new(
            "codeforces",
            "DenCT/codeforces-problems-7k",
            map_codeforces,
            &["train"],
        ));
        registry.register(SourceSpec::new(
            "codesearchnet",
            "sentence-transformers/codesearchnet",
            map_codesearchnet,
            &["train"],
        ));
        registry
    }

    /// Add or replace a source.
    pub fn register(&mut self, spec: SourceSpec) {
        self.specs.insert(spec.key.clone(), spec);
    }

    /// Look up a source by key.
    pub fn get(&self, key: &str) -> Result<&SourceSpec, PipelineError> {
        self.specs
            .get(key)
            .ok_or_else(|| PipelineError::UnknownSource(key.to_string()))
    }

    /// Registered keys, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    /// Every registered spec, in registration order.
    pub fn specs(&self) -> impl Iterator<Item = &SourceSpec> {
        self.specs.values()
    }
}
