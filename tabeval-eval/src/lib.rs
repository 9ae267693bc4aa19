//! # tabeval-eval
//!
//! Spreadsheet-driven LLM judge evaluation.
//!
//! A table of QA pairs or agent conversations is graded by one or more metrics.
//! Each metric is an instruction plus the columns that feed it; every row is sent
//! to a judge model and the reply is read back as a score with its criteria and
//! supporting evidence.
//!
//! ## Features
//!
//! - **Record store**: CSV ingest with QA / Conversation schema detection
//! - **Metrics**: manual instructions or one of two built-in rubrics
//! - **Instruction validation**: every selected column must be named in the instruction
//! - **Prompt composition**: schema-specific response templates, instruction truncation
//! - **Response extraction**: line-anchored or numbered-list labels, with sentinels
//! - **Runner**: sequential, per-record failure isolation
//! - **Reports**: append-only combined report with CSV / JSON export
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tabeval_eval::prelude::*;
//! use std::sync::Arc;
//!
//! let table = Table::from_csv_path("qa.csv")?;
//! let config = EvalConfig::load("eval.toml")?;
//! let judge = LlmJudge::with_config(Arc::new(model), config.model.judge_config());
//!
//! let mut report = ResultAggregator::new();
//! for spec in config.metric_specs(table.schema())? {
//!     let results = config.runner().run(&spec, table.records(), &judge).await;
//!     report.append(results);
//! }
//! println!("{}", report.format_summary());
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod metric;
pub mod prompt;
pub mod report;
pub mod runner;
pub mod table;
pub mod validator;

// Re-exports
pub use config::{EvalConfig, MetricSlot, ModelSettings, PromptSettings, Provider};
pub use error::{EvalError, Result, SchemaMismatch};
pub use extract::{Judgment, NOT_AVAILABLE, ResponseExtractor};
pub use metric::{AutoRubric, InstructionSource, MetricSpec, default_label};
pub use prompt::{AnchorStrategy, ComposedPrompt, PromptComposer};
pub use report::{MetricSummary, OUTPUT_COLUMNS, ResultAggregator, ResultRecord, render_table};
pub use runner::{EvaluationRunner, LlmJudge, LlmJudgeConfig, ModelCapability};
pub use table::{Record, Schema, Table, Value};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::config::EvalConfig;
    pub use crate::error::{EvalError, Result};
    pub use crate::extract::{Judgment, ResponseExtractor};
    pub use crate::metric::{InstructionSource, MetricSpec};
    pub use crate::prompt::{AnchorStrategy, PromptComposer};
    pub use crate::report::{ResultAggregator, ResultRecord};
    pub use crate::runner::{EvaluationRunner, LlmJudge, ModelCapability};
    pub use crate::table::{Record, Schema, Table};
}
