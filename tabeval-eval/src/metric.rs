//! Metric definitions
//!
//! A metric is a grading instruction plus the columns that feed it. Metrics are
//! built once per slot and never mutated; editing a metric means building a new one.

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::table::Schema;
use crate::validator;

/// Validation message for a manual metric with no selected column.
pub const EMPTY_SELECTION_MESSAGE: &str = "Select at least one column to validate the system prompt against.";

/// Relevance rubric used when a metric asks for an automatically generated instruction.
pub const RELEVANCE_RUBRIC: &str = concat!(
    "You are a RELEVANCE grader; providing the relevance of the given question to the given answer.\n",
    "    Respond only as a number from 0 to 10 where 0 is the least relevant and 10 is the most relevant. \n",
    "\n",
    "    A few additional scoring guidelines:\n",
    "    - Long answer should score equally well as short answer.\n",
    "    - RELEVANCE score should increase as the answer provides more RELEVANT context to the question.\n",
    "    - RELEVANCE score should increase as the answer provides RELEVANT context to more parts of the question.\n",
    "    - Answer that is RELEVANT to some of the question should score of 2, 3, or 4. Higher score indicates more RELEVANCE.\n",
    "    - Answer that is RELEVANT to most of the question should get a score of 5, 6, 7, or 8. Higher score indicates more RELEVANCE.\n",
    "    - Answer that is RELEVANT to the entire question should get a score of 9 or 10. Higher score indicates more RELEVANCE.\n",
    "    - Answer must be relevant and helpful for answering the entire question to get a score of 10.\n",
    "    - Never elaborate."
);

/// Factual-accuracy rubric, the counterpart of [`RELEVANCE_RUBRIC`] for odd metric slots.
pub const FACTUAL_ACCURACY_RUBRIC: &str = concat!(
    "You are a FACTUAL ACCURACY grader; providing the factual correctness of the given answer with respect to the given reference.\n",
    "    Respond only as a number from 0 to 10 where 0 is the least accurate and 10 is the most accurate. \n",
    "\n",
    "    A few additional scoring guidelines:\n",
    "    - Long answer should score equally well as short answer.\n",
    "    - FACTUAL ACCURACY score should decrease for every claim that contradicts the reference.\n",
    "    - FACTUAL ACCURACY score should decrease for claims that cannot be supported by the reference or context.\n",
    "    - Answer with major factual errors should get a score of 0, 1, 2, 3, or 4. Higher score indicates more FACTUAL ACCURACY.\n",
    "    - Answer with minor factual errors should get a score of 5, 6, 7, or 8. Higher score indicates more FACTUAL ACCURACY.\n",
    "    - Answer that is entirely consistent with the reference should get a score of 9 or 10. Higher score indicates more FACTUAL ACCURACY.\n",
    "    - Answer must be fully correct and complete with respect to the reference to get a score of 10.\n",
    "    - Never elaborate."
);

/// The fixed rubrics offered by automatic generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoRubric {
    Relevance,
    FactualAccuracy,
}

impl AutoRubric {
    /// Even slots (0-based) get relevance, odd slots factual accuracy.
    pub fn for_position(position: usize) -> Self {
        if position % 2 == 0 { AutoRubric::Relevance } else { AutoRubric::FactualAccuracy }
    }

    pub fn text(self) -> &'static str {
        match self {
            AutoRubric::Relevance => RELEVANCE_RUBRIC,
            AutoRubric::FactualAccuracy => FACTUAL_ACCURACY_RUBRIC,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AutoRubric::Relevance => "relevance",
            AutoRubric::FactualAccuracy => "factual accuracy",
        }
    }
}

/// Where a metric's grading instruction comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstructionSource {
    /// Typed by the user.
    Manual(String),
    /// One of the fixed rubrics.
    Auto(AutoRubric),
}

impl InstructionSource {
    pub fn text(&self) -> &str {
        match self {
            InstructionSource::Manual(text) => text,
            InstructionSource::Auto(rubric) => rubric.text(),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, InstructionSource::Auto(_))
    }
}

/// Default label of the metric in slot `position` (0-based).
pub fn default_label(position: usize) -> String {
    format!("Metric {}", position + 1)
}

/// A validated metric definition bound to one table schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSpec {
    label: String,
    schema: Schema,
    selected_fields: Vec<String>,
    instruction: InstructionSource,
}

impl MetricSpec {
    /// Build a metric.
    ///
    /// Selected fields are deduplicated and reordered to the schema's column
    /// order. `Index` and columns outside the schema are rejected, as is a blank
    /// manual instruction.
    pub fn new(
        label: impl Into<String>,
        schema: Schema,
        selected_fields: &[String],
        instruction: InstructionSource,
    ) -> Result<Self> {
        for field in selected_fields {
            if !schema.selectable_fields().contains(&field.as_str()) {
                return Err(EvalError::UnknownField { field: field.clone(), schema });
            }
        }

        if let InstructionSource::Manual(text) = &instruction {
            if text.trim().is_empty() {
                return Err(EvalError::EmptyInstruction);
            }
        }

        let selected_fields = schema
            .selectable_fields()
            .iter()
            .filter(|field| selected_fields.iter().any(|s| s == *field))
            .map(|field| field.to_string())
            .collect();

        Ok(Self { label: label.into(), schema, selected_fields, instruction })
    }

    /// Build the metric for slot `position`, choosing the rubric by slot parity
    /// when `auto` is set.
    pub fn for_slot(
        position: usize,
        label: Option<String>,
        schema: Schema,
        selected_fields: &[String],
        instruction: Option<String>,
        auto: bool,
    ) -> Result<Self> {
        let source = if auto {
            InstructionSource::Auto(AutoRubric::for_position(position))
        } else {
            InstructionSource::Manual(instruction.unwrap_or_default())
        };
        Self::new(label.unwrap_or_else(|| default_label(position)), schema, selected_fields, source)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn selected_fields(&self) -> &[String] {
        &self.selected_fields
    }

    pub fn instruction(&self) -> &InstructionSource {
        &self.instruction
    }

    /// Selected fields joined for display.
    pub fn selected_columns(&self) -> String {
        self.selected_fields.join(", ")
    }

    /// Fields that feed the prompt: the selection, or every selectable column
    /// when nothing was selected.
    pub fn prompt_fields(&self) -> Vec<&str> {
        if self.selected_fields.is_empty() {
            self.schema.selectable_fields().to_vec()
        } else {
            self.selected_fields.iter().map(String::as_str).collect()
        }
    }

    /// Check that the instruction mentions every selected field. Always empty
    /// for automatically generated instructions; a manual instruction with no
    /// selected field has nothing to be checked against and fails.
    pub fn validate(&self) -> Vec<String> {
        match &self.instruction {
            InstructionSource::Auto(_) => Vec::new(),
            InstructionSource::Manual(_) if self.selected_fields.is_empty() => {
                vec![EMPTY_SELECTION_MESSAGE.to_string()]
            }
            InstructionSource::Manual(text) => validator::validate(text, &self.selected_fields),
        }
    }
}
