//! Error types for the evaluation workflow

use crate::table::Schema;
use std::fmt;
use thiserror::Error;

/// Result type alias for evaluation operations
pub type Result<T> = std::result::Result<T, EvalError>;

/// Columns a table lacks for one candidate schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaMismatch {
    pub schema: Schema,
    pub missing: Vec<String>,
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tables must contain these columns: {} (missing: {})",
            self.schema,
            self.schema.fields().join(", "),
            self.missing.join(", ")
        )
    }
}

fn join_mismatches(mismatches: &[SchemaMismatch]) -> String {
    mismatches.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Errors that can occur during evaluation
#[derive(Error, Debug)]
pub enum EvalError {
    /// Uploaded table matches no recognized schema
    #[error("The uploaded file does not match a recognized schema. {}", join_mismatches(.0))]
    IngestSchema(Vec<SchemaMismatch>),

    /// Uploaded table carries the full column set of both schemas
    #[error("The uploaded file matches both the QA and the Conversation schema")]
    AmbiguousSchema,

    /// Two rows share the same Index value
    #[error("Duplicate Index value: {0}")]
    DuplicateIndex(String),

    /// CSV decoding failed
    #[error("Failed to read table: {0}")]
    Csv(#[from] csv::Error),

    /// Workbook decoding failed
    #[error("Failed to read workbook: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// A metric selected a column the schema does not offer
    #[error("Column '{field}' is not selectable for {schema} tables")]
    UnknownField { field: String, schema: Schema },

    /// A manual metric has a blank instruction
    #[error("Please enter a valid system prompt.")]
    EmptyInstruction,

    /// Instruction does not mention every selected column
    #[error("The following errors were found in your system prompt: {}", .0.join("; "))]
    InstructionValidation(Vec<String>),

    /// The model call failed
    #[error("Model invocation failed: {0}")]
    ModelInvocation(String),

    /// The model replied without any of the expected labelled fields
    #[error("Response does not contain the required structured fields: {0}")]
    MalformedResponse(String),

    /// Combined view requested before any metric produced results
    #[error("No results to combine. Please generate results for individual metrics first.")]
    NoResults,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<tabeval_core::TabevalError> for EvalError {
    fn from(err: tabeval_core::TabevalError) -> Self {
        match err {
            tabeval_core::TabevalError::Model(message) => EvalError::ModelInvocation(message),
            other => EvalError::ModelInvocation(other.to_string()),
        }
    }
}
