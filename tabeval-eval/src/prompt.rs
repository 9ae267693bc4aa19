//! Prompt composition
//!
//! Turns a metric and one record into the system and user prompts sent to the
//! judge model. The user prompt lists the metric's fields in schema order and
//! closes with a response template whose labels the extractor anchors on.

use serde::{Deserialize, Serialize};

use crate::metric::MetricSpec;
use crate::table::{Record, Schema};

/// Longest instruction, in characters, sent without truncation.
pub const DEFAULT_MAX_INSTRUCTION_CHARS: usize = 1500;

/// Appended to a truncated instruction.
pub const TRUNCATION_MARKER: &str = "...";

/// How the judge is asked to lay out its reply, and how the reply is read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorStrategy {
    /// One `Label: value` line per field.
    #[default]
    Line,
    /// A numbered list (`1. Criteria: ...`) whose values may span lines.
    Numbered,
}

/// The exact text sent to the model for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedPrompt {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Whether the instruction was cut to the length ceiling.
    pub truncated: bool,
}

/// Prompt key of a column: `Reference Context` becomes `reference_context`.
pub fn field_key(field: &str) -> String {
    field.to_lowercase().replace(' ', "_")
}

/// Cut `instruction` to `max_chars` characters plus [`TRUNCATION_MARKER`].
pub fn truncate_instruction(instruction: &str, max_chars: usize) -> (String, bool) {
    match instruction.char_indices().nth(max_chars) {
        Some((byte_offset, _)) => {
            (format!("{}{}", &instruction[..byte_offset], TRUNCATION_MARKER), true)
        }
        None => (instruction.to_string(), false),
    }
}

const QA_CUE_INTRO: &str = "Please answer using the entire template below.\n\nTEMPLATE:\n";
const QA_CRITERIA: &str = "Criteria: <Provide the criteria for this evaluation>";
const QA_EVIDENCE: &str = "Supporting Evidence: <Provide your reasons for scoring based on the listed criteria step by step. Tie it back to the evaluation being completed.>";
const QA_SCORE: &str = "Score: <The score 0-10 based on the given criteria>";

const CONVERSATION_CUE_INTRO: &str =
    "Evaluate the entire conversation for Agent-Goal Accuracy. Use the following format:\n\n";
const CONVERSATION_CRITERIA: &str =
    "Criteria: [Explain how well the Agent responded to the User's input and fulfilled their goals]";
const CONVERSATION_EVIDENCE: &str =
    "Supporting Evidence: [Highlight specific faulty or insufficient responses from the Agent]";
const CONVERSATION_SCORE: &str = "Score: [Provide a numerical or qualitative score here]";

/// Closing cue for a schema. Always ends on the `Score:` template line.
pub fn closing_cue(schema: Schema, anchor: AnchorStrategy) -> String {
    let (intro, lines) = match schema {
        Schema::Qa => (QA_CUE_INTRO, [QA_CRITERIA, QA_EVIDENCE, QA_SCORE]),
        Schema::Conversation => {
            (CONVERSATION_CUE_INTRO, [CONVERSATION_CRITERIA, CONVERSATION_EVIDENCE, CONVERSATION_SCORE])
        }
    };

    let body: Vec<String> = match anchor {
        AnchorStrategy::Line => lines.iter().map(|l| l.to_string()).collect(),
        AnchorStrategy::Numbered => {
            lines.iter().enumerate().map(|(i, l)| format!("{}. {}", i + 1, l)).collect()
        }
    };

    format!("{}{}", intro, body.join("\n"))
}

/// Builds prompts for a fixed instruction ceiling and reply layout.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    max_instruction_chars: usize,
    anchor: AnchorStrategy,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self { max_instruction_chars: DEFAULT_MAX_INSTRUCTION_CHARS, anchor: AnchorStrategy::Line }
    }
}

impl PromptComposer {
    pub fn new(max_instruction_chars: usize, anchor: AnchorStrategy) -> Self {
        Self { max_instruction_chars, anchor }
    }

    pub fn max_instruction_chars(&self) -> usize {
        self.max_instruction_chars
    }

    /// The metric's instruction after truncation.
    pub fn system_prompt(&self, spec: &MetricSpec) -> (String, bool) {
        truncate_instruction(spec.instruction().text(), self.max_instruction_chars)
    }

    /// The record's fields followed by the closing cue.
    pub fn user_prompt(&self, spec: &MetricSpec, record: &Record) -> String {
        let mut prompt = String::new();
        for field in spec.prompt_fields() {
            prompt.push_str(&format!("{}: {}\n\n", field_key(field), record.text(field)));
        }
        prompt.push_str(&closing_cue(spec.schema(), self.anchor));
        prompt
    }

    pub fn compose(&self, spec: &MetricSpec, record: &Record) -> ComposedPrompt {
        let (system_prompt, truncated) = self.system_prompt(spec);
        ComposedPrompt { system_prompt, user_prompt: self.user_prompt(spec, record), truncated }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{AutoRubric, InstructionSource, RELEVANCE_RUBRIC};
    use crate::table::Value;

    fn qa_record() -> Record {
        Record::new(
            Value::from("1"),
            vec![
                ("Question".into(), "What is Rust?".into()),
                ("Context".into(), "Rust is a systems language.".into()),
                ("Answer".into(), "A programming language.".into()),
                ("Reference Context".into(), "Rust docs".into()),
                ("Reference Answer".into(), "A language.".into()),
            ],
        )
    }

    fn spec(fields: &[&str], instruction: InstructionSource) -> MetricSpec {
        let fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        MetricSpec::new("Metric 1", Schema::Qa, &fields, instruction).unwrap()
    }

    #[test]
    fn test_field_key() {
        assert_eq!(field_key("Reference Context"), "reference_context");
        assert_eq!(field_key("Question"), "question");
    }

    #[test]
    fn test_user_prompt_uses_schema_order() {
        let spec = spec(
            &["Reference Answer", "Question"],
            InstructionSource::Manual("question vs reference answer".into()),
        );
        let prompt = PromptComposer::default().compose(&spec, &qa_record());

        assert_eq!(prompt.system_prompt, "question vs reference answer");
        assert!(prompt.user_prompt.starts_with(
            "question: What is Rust?\n\nreference_answer: A language.\n\nPlease answer using"
        ));
        assert!(prompt.user_prompt.ends_with(QA_SCORE));
        assert!(!prompt.truncated);
    }

    #[test]
    fn test_auto_instruction_uses_rubric() {
        let spec = spec(&["Question", "Answer"], InstructionSource::Auto(AutoRubric::Relevance));
        let prompt = PromptComposer::default().compose(&spec, &qa_record());
        assert_eq!(prompt.system_prompt, RELEVANCE_RUBRIC);
    }

    #[test]
    fn test_long_instruction_truncated() {
        let instruction = "x".repeat(1600);
        let spec = spec(&[], InstructionSource::Manual(instruction));
        let prompt = PromptComposer::default().compose(&spec, &qa_record());

        assert!(prompt.truncated);
        assert_eq!(prompt.system_prompt.chars().count(), 1500 + TRUNCATION_MARKER.len());
        assert!(prompt.system_prompt.ends_with("x..."));
    }

    #[test]
    fn test_truncate_counts_characters() {
        let (text, truncated) = truncate_instruction("ééééé", 3);
        assert_eq!(text, "ééé...");
        assert!(truncated);

        let (text, truncated) = truncate_instruction("abc", 3);
        assert_eq!(text, "abc");
        assert!(!truncated);
    }

    #[test]
    fn test_conversation_numbered_cue() {
        let cue = closing_cue(Schema::Conversation, AnchorStrategy::Numbered);
        assert!(cue.starts_with("Evaluate the entire conversation for Agent-Goal Accuracy."));
        assert!(cue.contains("\n1. Criteria: ["));
        assert!(cue.contains("\n2. Supporting Evidence: ["));
        assert!(cue.ends_with("3. Score: [Provide a numerical or qualitative score here]"));
    }
}
