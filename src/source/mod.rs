//! Dataset acquisition and per-source mapping.
//!
//! Ownership model:
//! - `SourceRegistry` maps a source key to its locator, mapper, and default
//!   partitions. It is built once and passed explicitly.
//! - `RawRecordSource` is the acquisition seam: given a spec and a partition
//!   name it returns raw records. The mapping stage never talks to a remote
//!   registry directly.

use crate::errors::PipelineError;

/// Field probing and coercion helpers used by mappers.
pub mod fields;
#[cfg(feature = "huggingface")]
/// HuggingFace hub acquisition backend.
pub mod huggingface;
/// Local shard directory acquisition backend.
pub mod local;
/// Built-in source mappers.
pub mod mappers;
/// Source registry.
pub mod registry;
/// Shard decoding.
pub mod shards;

pub use fields::RawRecord;
#[cfg(feature = "huggingface")]
pub use huggingface::{HuggingFaceSource, HuggingFaceSourceConfig};
pub use local::LocalShardSource;
pub use mappers::MapperFn;
pub use registry::{SourceRegistry, SourceSpec};

/// Acquisition backend producing raw records for one source partition.
pub trait RawRecordSource: Send + Sync {
    /// Short backend name used in log lines.
    fn name(&self) -> &str;
    /// Fetch every raw record of `split` for `spec`.
    fn fetch(&self, spec: &SourceSpec, split: &str) -> Result<Vec<RawRecord>, PipelineError>;
}
