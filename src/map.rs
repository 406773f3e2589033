//! RAW tier: acquire, map, and persist one source's partitions.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::errors::PipelineError;
use crate::schema::UnifiedRecord;
use crate::source::{RawRecord, RawRecordSource, SourceRegistry, SourceSpec};
use crate::table::write_unified_table;
use crate::types::SplitName;
use crate::utils::blank_missing;

/// Map raw records through `spec`, trimming every field, blanking the
/// missing marker, and stamping `split`.
pub fn map_records(spec: &SourceSpec, raw: &[RawRecord], split: &str) -> Vec<UnifiedRecord> {
    raw.iter()
        .map(|record| {
            let mut mapped = spec.map(record);
            mapped.map_fields(|_, value| blank_missing(value.trim().to_string()));
            mapped.split = split.to_string();
            mapped
        })
        .collect()
}

/// Acquire and map one partition of a registered source.
pub fn map_split(
    spec: &SourceSpec,
    source: &dyn RawRecordSource,
    split: &str,
) -> Result<Vec<UnifiedRecord>, PipelineError> {
    let raw = source.fetch(spec, split)?;
    info!(
        "[problemset:map] fetched {} raw records for {}/{} via {}",
        raw.len(),
        spec.key,
        split,
        source.name()
    );
    Ok(map_records(spec, &raw, split))
}

/// Materialize the RAW file of every requested split of `key`.
///
/// An empty `splits` falls back to the registry defaults. Returns the paths
/// written, in split order.
pub fn map_source(
    config: &PipelineConfig,
    registry: &SourceRegistry,
    source: &dyn RawRecordSource,
    key: &str,
    splits: &[SplitName],
) -> Result<Vec<PathBuf>, PipelineError> {
    let spec = registry.get(key)?;
    let splits: &[SplitName] = if splits.is_empty() {
        &spec.default_splits
    } else {
        splits
    };
    if splits.is_empty() {
        warn!("[problemset:map] no splits requested or registered for {key}");
    }

    let mut written = Vec::with_capacity(splits.len());
    for split in splits {
        let records = map_split(spec, source, split)?;
        let path = config.raw_path(&spec.key, split);
        write_unified_table(&path, &records)?;
        info!(
            "[problemset:map] wrote {} rows to {}",
            records.len(),
            path.display()
        );
        written.push(path);
    }
    Ok(written)
}
