//! Decoding of downloaded dataset shards into raw records.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::{Map, Value};

use crate::errors::PipelineError;
use crate::table::read_json_rows;

use super::fields::RawRecord;

/// True when `path` has an extension this module can decode.
pub fn is_supported_shard(path: &Path) -> bool {
    shard_extension(path)
        .is_some_and(|ext| matches!(ext.as_str(), "parquet" | "jsonl" | "ndjson" | "json"))
}

/// Decode a parquet, JSON-lines, or JSON-array shard.
///
/// Rows that are not JSON objects become empty records.
pub fn read_shard(path: &Path) -> Result<Vec<RawRecord>, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    match shard_extension(path).as_deref() {
        Some("parquet") => read_json_rows(path),
        Some("json") => read_json_document(path),
        _ => read_json_lines(path),
    }
}

fn read_json_lines(path: &Path) -> Result<Vec<RawRecord>, PipelineError> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str::<Value>(line.trim()).map_err(|err| {
            PipelineError::table(path, format!("invalid json on line {}: {err}", line_no + 1))
        })?;
        rows.push(into_raw_record(value));
    }
    Ok(rows)
}

fn read_json_document(path: &Path) -> Result<Vec<RawRecord>, PipelineError> {
    let body = fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::Array(items)) => Ok(items.into_iter().map(into_raw_record).collect()),
        Ok(Value::Object(mut object)) => match object.remove("rows") {
            Some(Value::Array(items)) => Ok(items.into_iter().map(into_raw_record).collect()),
            _ => Ok(vec![object]),
        },
        // Many `.json` shards on the hub are JSON lines.
        _ => read_json_lines(path),
    }
}

fn into_raw_record(value: Value) -> RawRecord {
    match value {
        Value::Object(object) => object,
        _ => Map::new(),
    }
}

fn shard_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
