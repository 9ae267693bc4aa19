//! Evaluation results
//!
//! [`ResultRecord`] is one (metric, record) verdict. [`ResultAggregator`] is the
//! append-only combined report that collects them across metric runs.

use std::io::Write;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::error::{EvalError, Result};
use crate::extract::Judgment;
use crate::table::{Record, Schema, Value};

/// Fixed leading columns of every results table.
pub const OUTPUT_COLUMNS: [&str; 6] =
    ["Index", "Metric", "Selected Columns", "Score", "Criteria", "Supporting Evidence"];

/// Widest cell printed by [`render_table`] before it is cut.
const MAX_CELL_WIDTH: usize = 40;

/// The verdict for one record under one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRecord {
    pub index: Value,
    pub metric_label: String,
    pub selected_columns: String,
    pub judgment: Judgment,
    /// The record's non-Index schema fields, in schema order.
    pub fields: Vec<(String, Value)>,
}

impl ResultRecord {
    pub fn new(
        record: &Record,
        schema: Schema,
        metric_label: impl Into<String>,
        selected_columns: impl Into<String>,
        judgment: Judgment,
    ) -> Self {
        let fields = schema
            .selectable_fields()
            .iter()
            .map(|field| {
                let value = record.get(field).cloned().unwrap_or_default();
                (field.to_string(), value)
            })
            .collect();

        Self {
            index: record.index().clone(),
            metric_label: metric_label.into(),
            selected_columns: selected_columns.into(),
            judgment,
            fields,
        }
    }

    /// Column names of this row, fixed columns first.
    pub fn column_names(&self) -> Vec<String> {
        OUTPUT_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.fields.iter().map(|(name, _)| name.clone()))
            .collect()
    }

    /// Cell text in [`column_names`](Self::column_names) order.
    pub fn cells(&self) -> Vec<String> {
        let mut cells = vec![
            self.index.to_string(),
            self.metric_label.clone(),
            self.selected_columns.clone(),
            self.judgment.score.clone(),
            self.judgment.criteria.clone(),
            self.judgment.supporting_evidence.clone(),
        ];
        cells.extend(self.fields.iter().map(|(_, value)| value.to_string()));
        cells
    }

    pub fn is_failure(&self) -> bool {
        self.judgment.is_failure()
    }
}

impl Serialize for ResultRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(OUTPUT_COLUMNS.len() + self.fields.len()))?;
        map.serialize_entry("Index", &self.index)?;
        map.serialize_entry("Metric", &self.metric_label)?;
        map.serialize_entry("Selected Columns", &self.selected_columns)?;
        map.serialize_entry("Score", &self.judgment.score)?;
        map.serialize_entry("Criteria", &self.judgment.criteria)?;
        map.serialize_entry("Supporting Evidence", &self.judgment.supporting_evidence)?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Per-metric statistics over a combined report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub label: String,
    /// Rows evaluated, failures included
    pub evaluated: usize,
    /// Rows carrying the failure sentinel
    pub failed: usize,
    /// Mean of the scores that start with a number
    pub mean_score: Option<f64>,
}

/// Session-scoped combined report. Append-only; reruns are kept side by side.
#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    results: Vec<ResultRecord>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one run's results after everything already held.
    pub fn append(&mut self, results: impl IntoIterator<Item = ResultRecord>) {
        self.results.extend(results);
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<ResultRecord> {
        self.results.clone()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The combined view, or [`EvalError::NoResults`] when nothing has run yet.
    pub fn overall(&self) -> Result<&[ResultRecord]> {
        if self.results.is_empty() { Err(EvalError::NoResults) } else { Ok(&self.results) }
    }

    /// Results produced under `label`, in append order.
    pub fn for_metric(&self, label: &str) -> Vec<&ResultRecord> {
        self.results.iter().filter(|r| r.metric_label == label).collect()
    }

    /// Metric labels in first-seen order.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for result in &self.results {
            if !labels.contains(&result.metric_label.as_str()) {
                labels.push(&result.metric_label);
            }
        }
        labels
    }

    pub fn summary(&self) -> Vec<MetricSummary> {
        self.labels()
            .into_iter()
            .map(|label| {
                let rows = self.for_metric(label);
                let scores: Vec<f64> =
                    rows.iter().filter_map(|r| r.judgment.numeric_score()).collect();
                let mean_score = if scores.is_empty() {
                    None
                } else {
                    Some(scores.iter().sum::<f64>() / scores.len() as f64)
                };

                MetricSummary {
                    label: label.to_string(),
                    evaluated: rows.len(),
                    failed: rows.iter().filter(|r| r.is_failure()).count(),
                    mean_score,
                }
            })
            .collect()
    }

    /// Human-readable summary lines.
    pub fn format_summary(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!("Results: {}\n", self.results.len()));
        for summary in self.summary() {
            output.push_str(&format!(
                "  {}: {} evaluated, {} failed",
                summary.label, summary.evaluated, summary.failed
            ));
            if let Some(mean) = summary.mean_score {
                output.push_str(&format!(", mean score {:.2}", mean));
            }
            output.push('\n');
        }
        output
    }

    /// Write the combined report as CSV with the fixed output columns first.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv = csv::Writer::from_writer(writer);
        match self.results.first() {
            Some(first) => csv.write_record(first.column_names())?,
            None => csv.write_record(OUTPUT_COLUMNS)?,
        }
        for result in &self.results {
            csv.write_record(result.cells())?;
        }
        csv.flush()?;
        Ok(())
    }

    /// The combined report as a pretty JSON array.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.results)?)
    }
}

fn cell_text(text: &str) -> String {
    let flat = text.replace(['\r', '\n'], " ");
    if flat.chars().count() > MAX_CELL_WIDTH {
        let cut: String = flat.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

/// Render rows as a plain-text table for the terminal.
pub fn render_table<'a>(rows: impl IntoIterator<Item = &'a ResultRecord>) -> String {
    let rows: Vec<&ResultRecord> = rows.into_iter().collect();
    let Some(first) = rows.first() else {
        return String::new();
    };

    let header: Vec<String> = first.column_names().iter().map(|c| cell_text(c)).collect();
    let body: Vec<Vec<String>> =
        rows.iter().map(|r| r.cells().iter().map(|c| cell_text(c)).collect()).collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        format!("| {} |\n", padded.join(" | "))
    };

    let mut output = line(&header);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    output.push_str(&format!("|-{}-|\n", rule.join("-|-")));
    for row in &body {
        output.push_str(&line(row));
    }
    output
}
