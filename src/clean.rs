//! CLEAN tier: per-partition schema enforcement, normalization, filtering,
//! and first-occurrence deduplication.

use std::collections::HashSet;
use std::path::PathBuf;

use tracing::info;

use crate::config::{CleanOptions, PipelineConfig};
use crate::errors::PipelineError;
use crate::hash::identity_key;
use crate::metrics::{CleanSummary, clean_summary};
use crate::normalize::{is_acceptable_prompt, normalize_prompt};
use crate::schema::{Column, UnifiedRecord};
use crate::table::{UnifiedTable, read_unified_table, write_unified_table};
use crate::utils::{blank_missing, normalize_field, normalize_tags};

/// Outcome of cleaning one partition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Rows read from the RAW file.
    pub input_rows: usize,
    /// Rows whose prompt was empty after normalization.
    pub dropped_empty: usize,
    /// Rows whose prompt was non-empty but below the length threshold.
    pub dropped_short: usize,
    /// Rows dropped for an empty solution when one is required.
    pub dropped_no_solution: usize,
    /// Later rows sharing an identity key with an earlier row.
    pub duplicates_removed: usize,
    /// Row, null and distinct-title counts of the cleaned output.
    pub summary: CleanSummary,
    /// Written CLEAN file, when the stage persisted one.
    pub output: Option<PathBuf>,
}

impl CleanReport {
    /// Rows that survived cleaning.
    pub fn output_rows(&self) -> usize {
        self.summary.get("rows").copied().unwrap_or(0)
    }
}

/// Normalize every field of `record` in place.
///
/// Text columns get whitespace collapsing and missing-marker blanking;
/// `prompt` additionally goes through the prompt normalizer, `tags` is
/// tokenized and lowercased, and `difficulty` is lowercased.
pub fn normalize_record(record: &mut UnifiedRecord) {
    record.map_fields(|column, value| match column {
        Column::Prompt => blank_missing(normalize_prompt(value)),
        Column::Tags => normalize_tags(&normalize_field(value)),
        Column::Difficulty => normalize_field(value).to_lowercase(),
        _ => normalize_field(value),
    });
}

/// Keep the first row per identity key, in input order. Returns the number
/// of rows removed.
pub fn dedup_first(records: &mut Vec<UnifiedRecord>) -> usize {
    let before = records.len();
    let mut seen = HashSet::with_capacity(before);
    records.retain(|record| seen.insert(identity_key(record)));
    before - records.len()
}

/// Clean an in-memory table without touching the filesystem.
pub fn clean_table(table: UnifiedTable, opts: &CleanOptions) -> (Vec<UnifiedRecord>, CleanReport) {
    let mut report = CleanReport {
        input_rows: table.records.len(),
        ..CleanReport::default()
    };

    let mut kept = Vec::with_capacity(table.records.len());
    for mut record in table.records {
        normalize_record(&mut record);
        if record.prompt.is_empty() {
            report.dropped_empty += 1;
            continue;
        }
        if !is_acceptable_prompt(&record.prompt, opts.min_prompt_chars) {
            report.dropped_short += 1;
            continue;
        }
        if opts.require_solution && record.solution.is_empty() {
            report.dropped_no_solution += 1;
            continue;
        }
        kept.push(record);
    }

    report.duplicates_removed = dedup_first(&mut kept);
    report.summary = clean_summary(&kept, &table.null_counts);
    (kept, report)
}

/// Clean the RAW file of `(key, split)` into its CLEAN location.
pub fn clean_split(
    config: &PipelineConfig,
    key: &str,
    split: &str,
    opts: &CleanOptions,
) -> Result<CleanReport, PipelineError> {
    let input = config.raw_path(key, split);
    let table = read_unified_table(&input)?;
    let (records, mut report) = clean_table(table, opts);

    let output = config.clean_path(key, split);
    write_unified_table(&output, &records)?;
    info!(
        "[problemset:clean] {key}/{split}: {} -> {} rows (empty={}, short={}, no_solution={}, duplicates={})",
        report.input_rows,
        records.len(),
        report.dropped_empty,
        report.dropped_short,
        report.dropped_no_solution,
        report.duplicates_removed
    );
    info!("[problemset:clean] summary {:?}", report.summary);
    report.output = Some(output);
    Ok(report)
}
