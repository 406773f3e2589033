#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line runners shared by the stage binaries.
pub mod apps;
/// Local cleaning stage.
pub mod clean;
/// Pipeline, stage, and storage configuration.
pub mod config;
/// Centralized constants used across stages and backends.
pub mod constants;
/// Identity hashing and shuffle bucketing.
pub mod hash;
/// Mapping stage.
pub mod map;
/// Summary and statistics helpers.
pub mod metrics;
/// Prompt-text normalizer.
pub mod normalize;
/// Unified schema definition.
pub mod schema;
/// Dataset acquisition and per-source mappers.
pub mod source;
/// Object-storage collaborator.
pub mod storage;
/// Parquet persistence for unified tables.
pub mod table;
/// Input transports (filesystem today).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Distributed union stage.
pub mod union;
/// Field-level string helpers.
pub mod utils;

mod errors;

pub use clean::{CleanReport, clean_split, normalize_record};
pub use config::{CleanOptions, PipelineConfig, StorageConfig, UnionConfig};
pub use errors::PipelineError;
pub use hash::identity_key;
pub use map::{map_source, map_split};
pub use metrics::UnionStats;
pub use normalize::{is_acceptable_prompt, normalize_prompt};
pub use schema::{Column, UnifiedRecord};
#[cfg(feature = "huggingface")]
pub use source::{HuggingFaceSource, HuggingFaceSourceConfig};
pub use source::{LocalShardSource, RawRecord, RawRecordSource, SourceRegistry, SourceSpec};
pub use storage::{BucketStore, ObjectStore};
pub use types::{DatasetLocator, IdentityKey, ObjectKey, SourceKey, SourceName, SplitName};
pub use union::{UnionReport, run_union};
