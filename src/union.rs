//! UNION tier: cross-source union, global deduplication, and partitioned
//! output.
//!
//! Work is split by CLEAN file and run on a dedicated rayon pool. Rows are
//! then redistributed into shuffle buckets by identity key so every bucket
//! can be deduplicated independently. Survivors are re-emitted in discovery
//! order (file path, then row position).

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use indexmap::IndexMap;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{PipelineConfig, UnionConfig};
use crate::constants::layout::{PARTITION_COLUMN, PARTITION_FILE, STATS_FILE};
use crate::constants::union::{SAMPLE_FILE, WORKER_THREAD_PREFIX};
use crate::errors::PipelineError;
use crate::hash::{bucket_for, identity_key};
use crate::metrics::UnionStats;
use crate::normalize::{is_acceptable_prompt, normalize_prompt};
use crate::schema::{UnifiedRecord, column_names};
use crate::table::{read_unified_table, write_unified_table};
use crate::transport::fs::{discover_clean_tables, remove_dir_if_exists};
use crate::types::IdentityKey;
use crate::utils::escape_path_segment;

/// Outcome of one union run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnionReport {
    /// CLEAN files read.
    pub files: usize,
    /// Rows read across every CLEAN file.
    pub input_rows: usize,
    /// Rows whose prompt failed the acceptance rule after normalization.
    pub dropped_prompts: usize,
    /// Rows removed by global deduplication.
    pub duplicates_removed: usize,
    /// Statistics of the surviving rows.
    pub stats: UnionStats,
    /// Written `source=<value>` data files, in first-appearance order.
    pub partitions: Vec<PathBuf>,
}

#[derive(Clone, Debug)]
struct KeyedRow {
    file: usize,
    row: usize,
    key: IdentityKey,
    record: UnifiedRecord,
}

impl KeyedRow {
    fn position(&self) -> (usize, usize) {
        (self.file, self.row)
    }
}

#[derive(Debug, Default)]
struct FileBatch {
    input_rows: usize,
    dropped: usize,
    rows: Vec<KeyedRow>,
}

#[derive(Serialize)]
struct StatsDocument<'a> {
    #[serde(flatten)]
    stats: &'a UnionStats,
    files: usize,
    duplicates_removed: usize,
    generated_at: String,
}

/// Build the worker pool used by one union run.
pub fn build_pool(workers: Option<usize>) -> Result<ThreadPool, PipelineError> {
    ThreadPoolBuilder::new()
        .num_threads(workers.unwrap_or(0))
        .thread_name(|idx| format!("{WORKER_THREAD_PREFIX}-{idx}"))
        .build()
        .map_err(|err| PipelineError::EngineStartup(err.to_string()))
}

/// Union every CLEAN file under `config` into the UNION tier.
///
/// Returns `Ok(None)` without touching the output when no CLEAN file exists.
pub fn run_union(
    config: &PipelineConfig,
    union: &UnionConfig,
) -> Result<Option<UnionReport>, PipelineError> {
    let pool = build_pool(union.workers)?;
    debug!(
        "[problemset:union] engine started with {} workers",
        pool.current_num_threads()
    );

    let files = discover_clean_tables(&config.clean_dir());
    if files.is_empty() {
        info!(
            "[problemset:union] no clean tables under {}; nothing to do",
            config.clean_dir().display()
        );
        return Ok(None);
    }
    info!("[problemset:union] discovered {} clean tables", files.len());

    let batches = pool.install(|| read_batches(&files, union.min_prompt_chars))?;
    let input_rows = batches.iter().map(|batch| batch.input_rows).sum();
    let dropped_prompts = batches.iter().map(|batch| batch.dropped).sum();

    let (survivors, duplicates_removed) =
        pool.install(|| dedup_global(batches, union.shuffle_partitions));
    let stats = UnionStats::from_records(&survivors);
    info!(
        "[problemset:union] rows={} sources={} languages={} (dropped={}, duplicates={})",
        stats.rows, stats.sources, stats.languages, dropped_prompts, duplicates_removed
    );

    let union_dir = config.union_dir();
    remove_dir_if_exists(&union_dir)?;
    fs::create_dir_all(&union_dir)?;

    let partitions = pool.install(|| write_partitions(&union_dir, &survivors))?;
    write_sample(&union_dir.join(SAMPLE_FILE), &survivors, union.sample_rows)?;
    write_stats(
        &union_dir.join(STATS_FILE),
        &StatsDocument {
            stats: &stats,
            files: files.len(),
            duplicates_removed,
            generated_at: Utc::now().to_rfc3339(),
        },
    )?;
    info!(
        "[problemset:union] wrote {} partitions to {}",
        partitions.len(),
        union_dir.display()
    );

    Ok(Some(UnionReport {
        files: files.len(),
        input_rows,
        dropped_prompts,
        duplicates_removed,
        stats,
        partitions,
    }))
}

fn read_batches(
    files: &[PathBuf],
    min_prompt_chars: usize,
) -> Result<Vec<FileBatch>, PipelineError> {
    files
        .par_iter()
        .enumerate()
        .map(|(file, path)| {
            let table = read_unified_table(path)?;
            let mut batch = FileBatch {
                input_rows: table.records.len(),
                ..FileBatch::default()
            };
            for (row, mut record) in table.records.into_iter().enumerate() {
                record.prompt = normalize_prompt(&record.prompt);
                if !is_acceptable_prompt(&record.prompt, min_prompt_chars) {
                    batch.dropped += 1;
                    continue;
                }
                batch.rows.push(KeyedRow {
                    file,
                    row,
                    key: identity_key(&record),
                    record,
                });
            }
            debug!(
                "[problemset:union] {}: kept {} of {} rows",
                path.display(),
                batch.rows.len(),
                batch.input_rows
            );
            Ok(batch)
        })
        .collect()
}

/// Shuffle keyed rows into buckets, keep the earliest row per key in each
/// bucket, and restore discovery order. Returns survivors and rows removed.
fn dedup_global(batches: Vec<FileBatch>, shuffle_partitions: usize) -> (Vec<UnifiedRecord>, usize) {
    let buckets_len = shuffle_partitions.max(1);
    let mut buckets: Vec<Vec<KeyedRow>> = (0..buckets_len).map(|_| Vec::new()).collect();
    let mut keyed = 0;
    for batch in batches {
        for row in batch.rows {
            keyed += 1;
            buckets[bucket_for(&row.key, buckets_len)].push(row);
        }
    }

    let mut survivors: Vec<KeyedRow> = buckets
        .into_par_iter()
        .flat_map_iter(|mut bucket| {
            bucket.sort_by_key(KeyedRow::position);
            let mut seen: HashSet<IdentityKey> = HashSet::with_capacity(bucket.len());
            bucket.retain(|row| seen.insert(row.key.clone()));
            bucket
        })
        .collect();
    survivors.sort_by_key(KeyedRow::position);

    let removed = keyed - survivors.len();
    (survivors.into_iter().map(|row| row.record).collect(), removed)
}

fn write_partitions(
    union_dir: &Path,
    records: &[UnifiedRecord],
) -> Result<Vec<PathBuf>, PipelineError> {
    let mut groups: IndexMap<&str, Vec<UnifiedRecord>> = IndexMap::new();
    for record in records {
        groups
            .entry(record.source.as_str())
            .or_default()
            .push(record.clone());
    }
    groups
        .into_iter()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(source, rows)| {
            let path = union_dir
                .join(format!("{PARTITION_COLUMN}={}", escape_path_segment(source)))
                .join(PARTITION_FILE);
            write_unified_table(&path, &rows)?;
            Ok(path)
        })
        .collect()
}

fn write_sample(path: &Path, records: &[UnifiedRecord], rows: usize) -> Result<(), PipelineError> {
    let mut writer = csv::Writer::from_path(path).map_err(|err| PipelineError::table(path, err))?;
    writer
        .write_record(column_names())
        .map_err(|err| PipelineError::table(path, err))?;
    for record in records.iter().take(rows) {
        writer
            .write_record(record.values())
            .map_err(|err| PipelineError::table(path, err))?;
    }
    writer.flush()?;
    Ok(())
}

fn write_stats(path: &Path, document: &StatsDocument<'_>) -> Result<(), PipelineError> {
    let payload =
        serde_json::to_string_pretty(document).map_err(|err| PipelineError::table(path, err))?;
    fs::write(path, payload)?;
    Ok(())
}
