//! The fixed unified record shape and its column order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{SourceName, SplitName};

/// One column of the unified schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    /// Origin dataset name.
    Source,
    /// Identifier inside the origin dataset.
    DatasetId,
    /// Problem title.
    Title,
    /// Problem statement.
    Prompt,
    /// Reference solution text.
    Solution,
    /// Solution language.
    Language,
    /// Difficulty label.
    Difficulty,
    /// Comma-joined tags.
    Tags,
    /// Partition the row came from.
    Split,
}

impl Column {
    /// Every column, in persisted order.
    pub const ALL: [Column; 9] = [
        Column::Source,
        Column::DatasetId,
        Column::Title,
        Column::Prompt,
        Column::Solution,
        Column::Language,
        Column::Difficulty,
        Column::Tags,
        Column::Split,
    ];

    /// Columns reported in clean-stage null/empty summaries.
    pub const SUMMARIZED: [Column; 5] = [
        Column::Prompt,
        Column::Solution,
        Column::Language,
        Column::Difficulty,
        Column::Tags,
    ];

    /// Persisted column name.
    pub const fn name(self) -> &'static str {
        match self {
            Column::Source => "source",
            Column::DatasetId => "dataset_id",
            Column::Title => "title",
            Column::Prompt => "prompt",
            Column::Solution => "solution",
            Column::Language => "language",
            Column::Difficulty => "difficulty",
            Column::Tags => "tags",
            Column::Split => "split",
        }
    }

    /// Position of this column in persisted order.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Resolve a persisted column name.
    pub fn from_name(name: &str) -> Option<Column> {
        Column::ALL.into_iter().find(|column| column.name() == name)
    }
}

/// Column names in persisted order.
pub fn column_names() -> [&'static str; 9] {
    Column::ALL.map(Column::name)
}

/// A problem record in the unified schema. Absent values are empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnifiedRecord {
    /// Origin dataset name.
    pub source: SourceName,
    /// Identifier inside the origin dataset.
    pub dataset_id: String,
    /// Problem title.
    pub title: String,
    /// Problem statement.
    pub prompt: String,
    /// Reference solution text.
    pub solution: String,
    /// Solution language.
    pub language: String,
    /// Difficulty label.
    pub difficulty: String,
    /// Comma-joined tags.
    pub tags: String,
    /// Partition the row came from.
    pub split: SplitName,
}

impl UnifiedRecord {
    /// Borrow the value of `column`.
    pub fn get(&self, column: Column) -> &str {
        match column {
            Column::Source => &self.source,
            Column::DatasetId => &self.dataset_id,
            Column::Title => &self.title,
            Column::Prompt => &self.prompt,
            Column::Solution => &self.solution,
            Column::Language => &self.language,
            Column::Difficulty => &self.difficulty,
            Column::Tags => &self.tags,
            Column::Split => &self.split,
        }
    }

    /// Mutable access to the value of `column`.
    pub fn get_mut(&mut self, column: Column) -> &mut String {
        match column {
            Column::Source => &mut self.source,
            Column::DatasetId => &mut self.dataset_id,
            Column::Title => &mut self.title,
            Column::Prompt => &mut self.prompt,
            Column::Solution => &mut self.solution,
            Column::Language => &mut self.language,
            Column::Difficulty => &mut self.difficulty,
            Column::Tags => &mut self.tags,
            Column::Split => &mut self.split,
        }
    }

    /// Values in persisted column order.
    pub fn values(&self) -> [&str; 9] {
        Column::ALL.map(|column| self.get(column))
    }

    /// Apply `f` to every field in place.
    pub fn map_fields(&mut self, mut f: impl FnMut(Column, &str) -> String) {
        for column in Column::ALL {
            let updated = f(column, self.get(column));
            *self.get_mut(column) = updated;
        }
    }

    /// Build a record from a JSON object, filling absent columns with empty
    /// strings and dropping extra keys.
    ///
    /// Values that are not strings go through `coerce`; `on_null` is called
    /// once for every column that held an explicit null.
    pub fn from_json_object(
        object: &Map<String, Value>,
        mut coerce: impl FnMut(&Value) -> String,
        mut on_null: impl FnMut(Column),
    ) -> Self {
        let mut record = UnifiedRecord::default();
        for column in Column::ALL {
            match object.get(column.name()) {
                None => {}
                Some(Value::Null) => on_null(column),
                Some(Value::String(text)) => *record.get_mut(column) = text.clone(),
                Some(other) => *record.get_mut(column) = coerce(other),
            }
        }
        record
    }

    /// Render as a JSON object with exactly the unified keys.
    pub fn to_json_object(&self) -> Map<String, Value> {
        Column::ALL
            .into_iter()
            .map(|column| {
                (
                    column.name().to_string(),
                    Value::String(self.get(column).to_string()),
                )
            })
            .collect()
    }
}
