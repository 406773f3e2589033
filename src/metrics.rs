use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::{Column, UnifiedRecord};

/// Observability summary of one cleaned partition.
///
/// Keys are emitted in a fixed order: `rows`, then `null_<col>` and
/// `empty_<col>` for each summarized column, then `unique_titles`.
pub type CleanSummary = IndexMap<String, usize>;

/// Summarize cleaned `records`.
///
/// `null_counts` holds the per-column nulls seen when the input was read,
/// indexed by `Column::index`.
pub fn clean_summary(records: &[UnifiedRecord], null_counts: &[usize; 9]) -> CleanSummary {
    let mut summary = CleanSummary::new();
    summary.insert("rows".to_string(), records.len());
    for column in Column::SUMMARIZED {
        summary.insert(
            format!("null_{}", column.name()),
            null_counts[column.index()],
        );
        summary.insert(
            format!("empty_{}", column.name()),
            records
                .iter()
                .filter(|record| record.get(column).is_empty())
                .count(),
        );
    }
    let titles: HashSet<&str> = records.iter().map(|record| record.title.as_str()).collect();
    summary.insert("unique_titles".to_string(), titles.len());
    summary
}

/// Summary statistics of the unified corpus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionStats {
    /// Rows in the unified corpus.
    pub rows: usize,
    /// Distinct `source` values.
    pub sources: usize,
    /// Distinct `language` values; the empty string counts as one.
    pub languages: usize,
}

impl UnionStats {
    /// Compute stats over the surviving unified rows.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a UnifiedRecord>) -> Self {
        let mut rows = 0;
        let mut sources = HashSet::new();
        let mut languages = HashSet::new();
        for record in records {
            rows += 1;
            sources.insert(record.source.as_str());
            languages.insert(record.language.as_str());
        }
        Self {
            rows,
            sources: sources.len(),
            languages: languages.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, title: &str, language: &str, solution: &str) -> UnifiedRecord {
        UnifiedRecord {
            source: source.to_string(),
            title: title.to_string(),
            prompt: "Implement a stack using two queues.".to_string(),
            solution: solution.to_string(),
            language: language.to_string(),
            ..UnifiedRecord::default()
        }
    }

    #[test]
    fn clean_summary_has_fixed_key_order() {
        let records = vec![
            record("APPS", "a", "python", ""),
            record("APPS", "a", "", "pass"),
            record("APPS", "b", "python", "pass"),
        ];
        let mut nulls = [0; 9];
        nulls[Column::Tags.index()] = 2;
        let summary = clean_summary(&records, &nulls);

        let keys: Vec<&str> = summary.keys().map(String::as_str).collect();
        assert_eq!(keys.first(), Some(&"rows"));
        assert_eq!(keys.last(), Some(&"unique_titles"));
        assert_eq!(keys[1], "null_prompt");
        assert_eq!(keys.len(), 12);

        assert_eq!(summary["rows"], 3);
        assert_eq!(summary["empty_solution"], 1);
        assert_eq!(summary["empty_language"], 1);
        assert_eq!(summary["empty_tags"], 3);
        assert_eq!(summary["null_tags"], 2);
        assert_eq!(summary["unique_titles"], 2);
    }

    #[test]
    fn union_stats_count_empty_language_as_a_value() {
        let records = [
            record("APPS", "a", "python", ""),
            record("Codeforces", "b", "", ""),
            record("Codeforces", "c", "", ""),
        ];
        let stats = UnionStats::from_records(&records);
        assert_eq!(
            stats,
            UnionStats {
                rows: 3,
                sources: 2,
                languages: 2
            }
        );
        assert_eq!(
            UnionStats::from_records(Vec::<UnifiedRecord>::new().iter()),
            UnionStats::default()
        );
    }
}
