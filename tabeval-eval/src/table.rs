//! Record store
//!
//! Ingests an uploaded table, decides its schema once from the columns present,
//! and keeps the rows as ordered field/value records.

use std::collections::HashSet;
use std::fmt;
use std::io::Read;
use std::path::Path;

use calamine::{Reader, open_workbook_auto};
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result, SchemaMismatch};

/// Name of the unique row identifier column.
pub const INDEX_FIELD: &str = "Index";

const QA_FIELDS: [&str; 6] =
    ["Index", "Question", "Context", "Answer", "Reference Context", "Reference Answer"];
const CONVERSATION_FIELDS: [&str; 3] = ["Index", "Conversation", "Agent Prompt"];

/// Columns whose presence marks a table as QA-shaped even when incomplete.
const QA_MARKERS: [&str; 3] = ["Question", "Context", "Answer"];
const CONVERSATION_MARKERS: [&str; 2] = ["Conversation", "Agent Prompt"];

/// The recognized table shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Schema {
    Qa,
    Conversation,
}

impl Schema {
    /// Required columns, in display order.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Schema::Qa => &QA_FIELDS,
            Schema::Conversation => &CONVERSATION_FIELDS,
        }
    }

    /// Columns a metric may select (every required column except `Index`).
    pub fn selectable_fields(self) -> &'static [&'static str] {
        &self.fields()[1..]
    }

    fn markers(self) -> &'static [&'static str] {
        match self {
            Schema::Qa => &QA_MARKERS,
            Schema::Conversation => &CONVERSATION_MARKERS,
        }
    }

    fn missing(self, columns: &[String]) -> Vec<String> {
        self.fields()
            .iter()
            .filter(|field| !columns.iter().any(|c| c == *field))
            .map(|field| field.to_string())
            .collect()
    }

    /// Decide the schema from the column set.
    ///
    /// A table must carry every required column of exactly one schema. When it
    /// carries neither, the error names the missing columns of the schema the
    /// table resembles, or of both when it resembles neither.
    pub fn detect(columns: &[String]) -> Result<Schema> {
        let qa_missing = Schema::Qa.missing(columns);
        let conversation_missing = Schema::Conversation.missing(columns);

        match (qa_missing.is_empty(), conversation_missing.is_empty()) {
            (true, true) => return Err(EvalError::AmbiguousSchema),
            (true, false) => return Ok(Schema::Qa),
            (false, true) => return Ok(Schema::Conversation),
            (false, false) => {}
        }

        let resembles = |schema: Schema| {
            schema.markers().iter().all(|marker| columns.iter().any(|c| c == marker))
        };

        let mismatches = if resembles(Schema::Qa) {
            vec![SchemaMismatch { schema: Schema::Qa, missing: qa_missing }]
        } else if resembles(Schema::Conversation) {
            vec![SchemaMismatch { schema: Schema::Conversation, missing: conversation_missing }]
        } else {
            vec![
                SchemaMismatch { schema: Schema::Qa, missing: qa_missing },
                SchemaMismatch { schema: Schema::Conversation, missing: conversation_missing },
            ]
        };

        Err(EvalError::IngestSchema(mismatches))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schema::Qa => write!(f, "QA"),
            Schema::Conversation => write!(f, "Conversation"),
        }
    }
}

/// A table cell, kept exactly as it was read.
///
/// Cells are free text: `"3.10"` and `"007"` survive ingest, prompting and
/// export unchanged, and two Index cells collide only when their text does.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(String);

impl Value {
    pub fn new(text: impl Into<String>) -> Self {
        Value(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value(text)
    }
}

/// One table row: its `Index` plus every other column in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    index: Value,
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(index: Value, fields: Vec<(String, Value)>) -> Self {
        Self { index, fields }
    }

    pub fn index(&self) -> &Value {
        &self.index
    }

    /// Look up a field by exact column name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        if field == INDEX_FIELD {
            return Some(&self.index);
        }
        self.fields.iter().find(|(name, _)| name == field).map(|(_, value)| value)
    }

    /// Field text, or an empty string when the record lacks the column.
    pub fn text(&self, field: &str) -> String {
        self.get(field).map(|value| value.as_str().to_string()).unwrap_or_default()
    }

    /// Non-index fields in table order.
    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }
}

/// An ingested table with its detected schema.
#[derive(Debug, Clone)]
pub struct Table {
    schema: Schema,
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Table {
    /// Build a table from a header row and string cells.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let columns: Vec<String> =
            columns.into_iter().map(|c| c.trim_start_matches('\u{feff}').trim().to_string()).collect();
        let schema = Schema::detect(&columns)?;
        let index_position = columns
            .iter()
            .position(|c| c == INDEX_FIELD)
            .ok_or_else(|| EvalError::Config("Index column vanished after detection".into()))?;

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            let mut index = Value::default();
            let mut fields = Vec::with_capacity(columns.len().saturating_sub(1));
            for (position, column) in columns.iter().enumerate() {
                let value = Value::new(row.get(position).cloned().unwrap_or_default());
                if position == index_position {
                    index = value;
                } else {
                    fields.push((column.clone(), value));
                }
            }

            if !seen.insert(index.clone()) {
                return Err(EvalError::DuplicateIndex(index.to_string()));
            }
            records.push(Record::new(index, fields));
        }

        tracing::debug!(%schema, rows = records.len(), "table ingested");
        Ok(Self { schema, columns, records })
    }

    /// Read a CSV table with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }

        Self::from_rows(columns, rows)
    }

    /// Read a CSV file from disk.
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_csv_reader(std::io::BufReader::new(file))
    }

    /// Read the first worksheet of an Excel or OpenDocument workbook.
    ///
    /// The first row is the header. Cells are taken as their displayed text;
    /// numbers print in shortest form, so a stored `4.0` reads as `4`.
    pub fn from_xlsx_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut workbook = open_workbook_auto(path.as_ref())?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(calamine::Error::Msg("workbook has no worksheets"))??;

        let mut rows = range.rows().map(|row| row.iter().map(ToString::to_string).collect::<Vec<_>>());
        let columns = rows.next().unwrap_or_default();
        Self::from_rows(columns, rows.collect())
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The first `n` rows.
    pub fn preview(&self, n: usize) -> &[Record] {
        &self.records[..n.min(self.records.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_detect_qa() {
        let cols = columns(&QA_FIELDS);
        assert_eq!(Schema::detect(&cols).unwrap(), Schema::Qa);
    }

    #[test]
    fn test_detect_conversation_with_extra_columns() {
        let cols = columns(&["Agent Prompt", "Notes", "Index", "Conversation"]);
        assert_eq!(Schema::detect(&cols).unwrap(), Schema::Conversation);
    }

    #[test]
    fn test_detect_incomplete_qa_names_missing_columns() {
        let cols = columns(&["Index", "Question", "Context", "Answer"]);
        match Schema::detect(&cols) {
            Err(EvalError::IngestSchema(mismatches)) => {
                assert_eq!(mismatches.len(), 1);
                assert_eq!(mismatches[0].schema, Schema::Qa);
                assert_eq!(mismatches[0].missing, vec!["Reference Context", "Reference Answer"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_detect_neither_lists_both_schemas() {
        let cols = columns(&["id", "text"]);
        match Schema::detect(&cols) {
            Err(EvalError::IngestSchema(mismatches)) => {
                assert_eq!(mismatches.len(), 2);
                assert_eq!(mismatches[1].missing, vec!["Index", "Conversation", "Agent Prompt"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_detect_both_is_ambiguous() {
        let mut cols = columns(&QA_FIELDS);
        cols.extend(columns(&["Conversation", "Agent Prompt"]));
        assert!(matches!(Schema::detect(&cols), Err(EvalError::AmbiguousSchema)));
    }

    #[test]
    fn test_value_keeps_cell_text() {
        assert_eq!(Value::from("3.10").to_string(), "3.10");
        assert_eq!(Value::from(" 42 ").as_str(), " 42 ");
        assert_eq!(Value::default().as_str(), "");
    }

    #[test]
    fn test_index_text_is_the_key() {
        let table = Table::from_rows(
            columns(&["Index", "Conversation", "Agent Prompt"]),
            vec![
                vec!["007".into(), "a".into(), "b".into()],
                vec!["7".into(), "c".into(), "d".into()],
                vec!["12345678901234567891".into(), "e".into(), "f".into()],
            ],
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.records()[0].index().as_str(), "007");
        assert_eq!(table.records()[1].index().as_str(), "7");
        assert_eq!(table.records()[2].text("Index"), "12345678901234567891");
    }

    #[test]
    fn test_from_rows_keeps_table_order() {
        let table = Table::from_rows(
            columns(&["Index", "Conversation", "Agent Prompt"]),
            vec![
                vec!["2".into(), "User: hi".into(), "Be nice".into()],
                vec!["1".into(), "User: bye".into(), "Be brief".into()],
            ],
        )
        .unwrap();

        assert_eq!(table.schema(), Schema::Conversation);
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].index(), &Value::from("2"));
        assert_eq!(table.records()[1].text("Conversation"), "User: bye");
        assert_eq!(table.records()[1].text("Index"), "1");
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let err = Table::from_rows(
            columns(&["Index", "Conversation", "Agent Prompt"]),
            vec![vec!["1".into(), "a".into(), "b".into()], vec!["1".into(), "c".into(), "d".into()]],
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::DuplicateIndex(index) if index == "1"));
    }

    #[test]
    fn test_from_csv_reader_with_quoted_cells() {
        let data = "Index,Conversation,Agent Prompt\n1,\"User: hi\nAgent: hello\",Greet the user\n";
        let table = Table::from_csv_reader(data.as_bytes()).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].text("Conversation"), "User: hi\nAgent: hello");
        assert_eq!(table.preview(5).len(), 1);
    }

    #[test]
    fn test_header_whitespace_and_bom_trimmed() {
        let data = "\u{feff}Index , Conversation,Agent Prompt\n1,a,b\n";
        let table = Table::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(table.columns()[0], "Index");
        assert_eq!(table.columns()[1], "Conversation");
    }
}
