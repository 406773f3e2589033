use std::fs;
use std::path::Path;

use problemset::clean::clean_split;
use problemset::map::map_source;
use problemset::schema::column_names;
use problemset::table::{read_json_rows, read_unified_table, write_unified_table};
use problemset::{
    CleanOptions, Column, LocalShardSource, PipelineConfig, PipelineError, SourceRegistry,
    UnifiedRecord, UnionConfig, identity_key, run_union,
};
use serde_json::{Value, json};
use tempfile::tempdir;

fn write_jsonl(path: &Path, rows: &[Value]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let body: Vec<String> = rows.iter().map(Value::to_string).collect();
    fs::write(path, body.join("\n")).unwrap();
}

fn record(source: &str, title: &str, prompt: &str, language: &str) -> UnifiedRecord {
    UnifiedRecord {
        source: source.to_string(),
        dataset_id: String::new(),
        title: title.to_string(),
        prompt: prompt.to_string(),
        solution: "print(42)".to_string(),
        language: language.to_string(),
        difficulty: String::new(),
        tags: String::new(),
        split: "train".to_string(),
    }
}

#[test]
fn fenced_leetcode_prompt_maps_and_cleans() {
    let temp = tempdir().unwrap();
    let shards = temp.path().join("shards");
    let config = PipelineConfig::new(temp.path().join("data"));
    let content = format!("```python\nimport os\nSolve it. {}```", "x".repeat(30));
    write_jsonl(
        &shards.join("leetcode").join("train.jsonl"),
        &[json!({"question_id": "42", "title": "Two Sum", "content": content})],
    );

    let registry = SourceRegistry::builtin();
    let source = LocalShardSource::new(&shards);
    map_source(&config, &registry, &source, "leetcode", &[]).unwrap();
    let report = clean_split(&config, "leetcode", "train", &CleanOptions::default()).unwrap();
    assert_eq!(report.output_rows(), 1);

    let cleaned = read_unified_table(&config.clean_path("leetcode", "train")).unwrap();
    let row = &cleaned.records[0];
    assert_eq!(row.dataset_id, "42");
    assert_eq!(row.title, "Two Sum");
    assert_eq!(row.prompt, format!("Solve it. {}", "x".repeat(30)));
    assert_eq!(row.split, "train");
}

#[test]
fn raw_files_always_carry_the_full_column_set() {
    let temp = tempdir().unwrap();
    let shards = temp.path().join("shards");
    let config = PipelineConfig::new(temp.path().join("data"));
    write_jsonl(
        &shards.join("codeforces").join("train.jsonl"),
        &[json!({"unexpected": 1}), json!({"name": "A", "tags": ["dp"], "rating": 800})],
    );

    let registry = SourceRegistry::builtin();
    map_source(&config, &registry, &LocalShardSource::new(&shards), "codeforces", &[]).unwrap();

    let rows = read_json_rows(&config.raw_path("codeforces", "train")).unwrap();
    assert_eq!(rows.len(), 2);
    for row in rows {
        let mut keys: Vec<&str> = row.keys().map(String::as_str).collect();
        let mut expected = column_names().to_vec();
        keys.sort();
        expected.sort();
        assert_eq!(keys, expected);
    }
}

#[test]
fn local_clean_keeps_one_row_per_identity() {
    let temp = tempdir().unwrap();
    let shards = temp.path().join("shards");
    let config = PipelineConfig::new(temp.path().join("data"));
    let prompt = "Return the indices of the two numbers that add up to target.";
    write_jsonl(
        &shards.join("leetcode").join("train.jsonl"),
        &[
            json!({"question_id": 1, "title": "Two Sum", "content": prompt}),
            json!({"question_id": 2, "title": "Two Sum", "content": prompt}),
        ],
    );

    let registry = SourceRegistry::builtin();
    map_source(&config, &registry, &LocalShardSource::new(&shards), "leetcode", &[]).unwrap();
    let report = clean_split(&config, "leetcode", "train", &CleanOptions::default()).unwrap();
    assert_eq!(report.duplicates_removed, 1);

    let cleaned = read_unified_table(&config.clean_path("leetcode", "train")).unwrap();
    assert_eq!(cleaned.records.len(), 1);
    assert_eq!(cleaned.records[0].dataset_id, "1");
}

#[test]
fn require_solution_drops_rows_without_one() {
    let temp = tempdir().unwrap();
    let config = PipelineConfig::new(temp.path());
    let mut with_solution =
        record("APPS", "sum", "Print the sum of two integers a and b.", "python");
    let mut without = record("APPS", "diff", "Print the difference of two integers.", "python");
    without.solution = String::new();
    with_solution.dataset_id = "1".to_string();
    write_unified_table(&config.raw_path("apps", "train"), &[with_solution, without]).unwrap();

    let strict = CleanOptions {
        require_solution: true,
        ..CleanOptions::default()
    };
    let report = clean_split(&config, "apps", "train", &strict).unwrap();
    assert_eq!(report.dropped_no_solution, 1);
    assert_eq!(report.output_rows(), 1);

    let lenient = clean_split(&config, "apps", "train", &CleanOptions::default()).unwrap();
    assert_eq!(lenient.output_rows(), 2);
}

#[test]
fn cleaning_clean_output_is_a_fixed_point() {
    let temp = tempdir().unwrap();
    let config = PipelineConfig::new(temp.path());
    let mut messy = record(
        "LeetCodeDataset",
        "  Valid   Parentheses ",
        "```\nfrom typing import List\n\nGiven a string s,   determine if it is valid.\n```",
        "None",
    );
    messy.tags = "Stack, String ,stack".to_string();
    messy.difficulty = "Easy".to_string();
    write_unified_table(&config.raw_path("leetcode", "train"), &[messy]).unwrap();
    clean_split(&config, "leetcode", "train", &CleanOptions::default()).unwrap();
    let first = read_unified_table(&config.clean_path("leetcode", "train")).unwrap();
    assert_eq!(first.records[0].prompt, "Given a string s, determine if it is valid.");
    assert_eq!(first.records[0].tags, "stack,string");

    fs::create_dir_all(config.raw_path("again", "train").parent().unwrap()).unwrap();
    fs::copy(
        config.clean_path("leetcode", "train"),
        config.raw_path("again", "train"),
    )
    .unwrap();
    let report = clean_split(&config, "again", "train", &CleanOptions::default()).unwrap();
    let second = read_unified_table(&config.clean_path("again", "train")).unwrap();
    assert_eq!(second.records, first.records);
    assert_eq!(report.duplicates_removed, 0);
}

#[test]
fn clean_reports_missing_raw_input() {
    let temp = tempdir().unwrap();
    let config = PipelineConfig::new(temp.path());
    let err = clean_split(&config, "apps", "train", &CleanOptions::default()).unwrap_err();
    match err {
        PipelineError::MissingInput { path } => assert_eq!(path, config.raw_path("apps", "train")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn union_dedups_across_sources_and_partitions_by_source() {
    let temp = tempdir().unwrap();
    let config = PipelineConfig::new(temp.path());
    let shared = record("APPS", "stairs", "Count the ways to climb n stairs.", "python");
    write_unified_table(
        &config.clean_path("apps", "train"),
        &[
            shared.clone(),
            record("APPS", "coins", "Find the minimum number of coins.", "python"),
        ],
    )
    .unwrap();
    write_unified_table(
        &config.clean_path("codeforces", "train"),
        &[
            record("Codeforces", "watermelon", "Split the watermelon into even parts.", ""),
            shared.clone(),
        ],
    )
    .unwrap();

    let union = UnionConfig {
        workers: Some(2),
        shuffle_partitions: 4,
        ..UnionConfig::default()
    };
    let report = run_union(&config, &union).unwrap().unwrap();
    assert_eq!(report.files, 2);
    assert_eq!(report.input_rows, 4);
    assert_eq!(report.duplicates_removed, 1);
    assert_eq!(report.stats.rows, 3);
    assert_eq!(report.stats.sources, 2);
    assert_eq!(report.stats.languages, 2);

    let union_dir = config.union_dir();
    let read_partition = |value: &str| {
        let dir = union_dir.join(format!("source={value}"));
        read_unified_table(&dir.join("part-00000.parquet")).unwrap()
    };
    let apps = read_partition("APPS");
    let codeforces = read_partition("Codeforces");
    assert_eq!(apps.records.len(), 2);
    assert_eq!(codeforces.records.len(), 1);
    let shared_key = identity_key(&shared);
    let copies = apps
        .records
        .iter()
        .chain(&codeforces.records)
        .filter(|row| identity_key(row) == shared_key)
        .count();
    assert_eq!(copies, 1);

    let sample = fs::read_to_string(union_dir.join("sample_50.csv")).unwrap();
    let mut lines = sample.lines();
    assert_eq!(lines.next(), Some(column_names().join(",").as_str()));
    assert_eq!(lines.count(), 3);

    let stats: Value =
        serde_json::from_str(&fs::read_to_string(union_dir.join("_stats.json")).unwrap()).unwrap();
    assert_eq!(stats["rows"], 3);
    assert_eq!(stats["sources"], 2);
    assert!(stats["generated_at"].is_string());
}

#[test]
fn union_sample_holds_the_first_fifty_survivors() {
    let temp = tempdir().unwrap();
    let config = PipelineConfig::new(temp.path());
    let numbered = |source: &str, prefix: &str, count: usize| -> Vec<UnifiedRecord> {
        (0..count)
            .map(|idx| {
                let title = format!("{prefix}-{idx:02}");
                let prompt = format!("Solve problem {title} within the time limit.");
                record(source, &title, &prompt, "python")
            })
            .collect()
    };
    let apps = numbered("APPS", "apps", 30);
    let codeforces = numbered("Codeforces", "cf", 45);
    write_unified_table(&config.clean_path("apps", "train"), &apps).unwrap();
    write_unified_table(&config.clean_path("codeforces", "train"), &codeforces).unwrap();

    let union = UnionConfig {
        workers: Some(3),
        shuffle_partitions: 8,
        ..UnionConfig::default()
    };
    let report = run_union(&config, &union).unwrap().unwrap();
    assert_eq!(report.stats.rows, 75);

    let sample_path = config.union_dir().join("sample_50.csv");
    assert_eq!(fs::read_to_string(&sample_path).unwrap().lines().count(), 51);

    let mut reader = csv::Reader::from_path(&sample_path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(headers, column_names());
    let titles: Vec<String> = reader
        .records()
        .map(|row| row.unwrap()[Column::Title.index()].to_string())
        .collect();
    let expected: Vec<String> = apps
        .iter()
        .chain(&codeforces)
        .take(50)
        .map(|row| row.title.clone())
        .collect();
    assert_eq!(titles, expected);
}

#[test]
fn union_applies_the_prompt_length_boundary() {
    let temp = tempdir().unwrap();
    let config = PipelineConfig::new(temp.path());
    let nineteen = "a".repeat(19);
    let twenty = "b".repeat(20);
    assert_eq!(nineteen.chars().count(), 19);
    write_unified_table(
        &config.clean_path("apps", "train"),
        &[
            record("APPS", "short", &nineteen, ""),
            record("APPS", "long", &twenty, ""),
        ],
    )
    .unwrap();

    let report = run_union(&config, &UnionConfig::default()).unwrap().unwrap();
    assert_eq!(report.dropped_prompts, 1);
    assert_eq!(report.stats.rows, 1);
}

#[test]
fn union_without_clean_tables_is_a_no_op() {
    let temp = tempdir().unwrap();
    let config = PipelineConfig::new(temp.path());
    assert!(run_union(&config, &UnionConfig::default()).unwrap().is_none());
    assert!(!config.union_dir().exists());
}

#[test]
fn union_replaces_previous_output() {
    let temp = tempdir().unwrap();
    let config = PipelineConfig::new(temp.path());
    let stale = config.union_dir().join("source=Gone").join("part-00000.parquet");
    write_unified_table(&stale, &[record("Gone", "old", "An outdated problem statement.", "")])
        .unwrap();
    write_unified_table(
        &config.clean_path("apps", "train"),
        &[record("APPS", "fresh", "A freshly cleaned problem statement.", "python")],
    )
    .unwrap();

    let report = run_union(&config, &UnionConfig::default()).unwrap().unwrap();
    assert_eq!(report.files, 1);
    assert!(!stale.exists());
    assert_eq!(report.partitions.len(), 1);
    assert!(report.partitions[0].ends_with("source=APPS/part-00000.parquet"));
}
