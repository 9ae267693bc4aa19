//! Instruction validation
//!
//! A manual instruction must mention every selected column by its canonical
//! term, as a case-insensitive whole word.

use regex::RegexBuilder;

use crate::error::{EvalError, Result};

/// Canonical term of a column name: `Reference Context` becomes `reference context`.
pub fn canonical_term(field: &str) -> String {
    field.to_lowercase().replace(' ', "_").replace('_', " ")
}

/// Whether `text` contains `term` bounded by word boundaries on both ends.
pub fn mentions_term(text: &str, term: &str) -> bool {
    let pattern = format!(r"\b{}\b", regex::escape(term));
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.is_match(text),
        Err(e) => {
            tracing::warn!(term, error = %e, "term pattern failed to compile");
            text.to_lowercase().contains(term)
        }
    }
}

/// Check `instruction` against `selected_fields`, returning one message per
/// field it fails to mention.
pub fn validate(instruction: &str, selected_fields: &[String]) -> Vec<String> {
    selected_fields
        .iter()
        .filter_map(|field| {
            let term = canonical_term(field);
            if mentions_term(instruction, &term) {
                None
            } else {
                Some(format!("'{}' needs to be included as '{}' in the system prompt.", field, term))
            }
        })
        .collect()
}

/// Like [`validate`], but folds the messages into an error.
pub fn ensure_valid(instruction: &str, selected_fields: &[String]) -> Result<()> {
    let errors = validate(instruction, selected_fields);
    if errors.is_empty() { Ok(()) } else { Err(EvalError::InstructionValidation(errors)) }
}
