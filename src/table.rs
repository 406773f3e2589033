//! Parquet persistence for unified-schema tables.
//!
//! Files are written with one required UTF8 column per unified field, in
//! unified order. Reading accepts any parquet shape and re-derives the
//! unified column set from each decoded row.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use parquet::data_type::{ByteArray, ByteArrayType};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::file::writer::SerializedFileWriter;
use parquet::record::reader::RowIter;
use parquet::schema::parser::parse_message_type;
use serde_json::{Map, Value};

use crate::errors::PipelineError;
use crate::schema::{Column, UnifiedRecord, column_names};
use crate::source::fields::value_to_text;

/// Unified rows decoded from one file, with per-column counts of explicit
/// nulls that were coerced to empty strings.
#[derive(Clone, Debug, Default)]
pub struct UnifiedTable {
    /// Decoded rows, in file order.
    pub records: Vec<UnifiedRecord>,
    /// Explicit nulls per column, indexed by [`Column::index`].
    pub null_counts: [usize; 9],
}

impl UnifiedTable {
    /// Null count observed for `column` while reading.
    pub fn nulls(&self, column: Column) -> usize {
        self.null_counts[column.index()]
    }
}

/// Decode every row of a parquet file into a JSON object keyed by column name.
pub fn read_json_rows(path: &Path) -> Result<Vec<Map<String, Value>>, PipelineError> {
    if !path.exists() {
        return Err(PipelineError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    let file = File::open(path)?;
    let reader = SerializedFileReader::new(file)
        .map_err(|err| PipelineError::table(path, format!("failed reading parquet: {err}")))?;

    let mut rows = Vec::new();
    for group_pos in 0..reader.metadata().num_row_groups() {
        let row_group = reader.get_row_group(group_pos).map_err(|err| {
            PipelineError::table(path, format!("failed opening row group {group_pos}: {err}"))
        })?;
        let iter = RowIter::from_row_group(None, row_group.as_ref()).map_err(|err| {
            PipelineError::table(
                path,
                format!("failed iterating row group {group_pos}: {err}"),
            )
        })?;
        for (position, row_result) in iter.enumerate() {
            let row = row_result.map_err(|err| {
                PipelineError::table(
                    path,
                    format!("failed reading row {position} in row group {group_pos}: {err}"),
                )
            })?;
            match row.to_json_value() {
                Value::Object(object) => rows.push(object),
                _ => rows.push(Map::new()),
            }
        }
    }
    Ok(rows)
}

/// Read a unified table, synthesizing missing columns and dropping extras.
pub fn read_unified_table(path: &Path) -> Result<UnifiedTable, PipelineError> {
    let rows = read_json_rows(path)?;
    let mut table = UnifiedTable {
        records: Vec::with_capacity(rows.len()),
        null_counts: [0; 9],
    };
    for row in &rows {
        let record = UnifiedRecord::from_json_object(row, value_to_text, |column| {
            table.null_counts[column.index()] += 1;
        });
        table.records.push(record);
    }
    Ok(table)
}

/// Write `records` to `path` in unified column order, creating parent
/// directories and replacing any existing file.
pub fn write_unified_table(path: &Path, records: &[UnifiedRecord]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let schema = Arc::new(
        parse_message_type(&unified_message_type())
            .map_err(|err| PipelineError::table(path, format!("invalid schema: {err}")))?,
    );
    let props = Arc::new(WriterProperties::builder().build());
    let file = File::create(path)?;
    let mut writer = SerializedFileWriter::new(file, schema, props)
        .map_err(|err| PipelineError::table(path, format!("failed opening writer: {err}")))?;

    if !records.is_empty() {
        let mut row_group = writer
            .next_row_group()
            .map_err(|err| {
                PipelineError::table(path, format!("failed starting row group: {err}"))
            })?;
        for column in Column::ALL {
            let name = column.name();
            let mut col_writer = row_group
                .next_column()
                .map_err(|err| {
                    PipelineError::table(path, format!("failed opening column {name}: {err}"))
                })?
                .ok_or_else(|| {
                    PipelineError::table(path, format!("schema has no column {name}"))
                })?;
            let values = records
                .iter()
                .map(|record| ByteArray::from(record.get(column)))
                .collect::<Vec<_>>();
            col_writer
                .typed::<ByteArrayType>()
                .write_batch(&values, None, None)
                .map_err(|err| {
                    PipelineError::table(path, format!("failed writing column {name}: {err}"))
                })?;
            col_writer.close().map_err(|err| {
                PipelineError::table(path, format!("failed closing column {name}: {err}"))
            })?;
        }
        row_group
            .close()
            .map_err(|err| PipelineError::table(path, format!("failed closing row group: {err}")))?;
    }

    writer
        .close()
        .map_err(|err| PipelineError::table(path, format!("failed finalizing file: {err}")))?;
    Ok(())
}

fn unified_message_type() -> String {
    let mut message = String::from("message unified_record {\n");
    for name in column_names() {
        message.push_str(&format!("    REQUIRED BINARY {name} (UTF8);\n"));
    }
    message.push('}');
    message
}
