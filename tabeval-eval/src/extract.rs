//! Response extraction
//!
//! Reads the judge's free-text reply back into a [`Judgment`] by anchoring on the
//! `Criteria:`, `Supporting Evidence:` and `Score:` labels.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::{EvalError, Result};
use crate::prompt::AnchorStrategy;

/// Value of a label the reply never filled in.
pub const NOT_AVAILABLE: &str = "Not available";

/// Criteria of a record whose evaluation failed.
pub const ERROR_SENTINEL: &str = "Error";

/// Score of a record whose evaluation failed.
pub const SCORE_UNAVAILABLE: &str = "N/A";

/// Structured verdict for one record. All fields are free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub score: String,
    pub criteria: String,
    pub supporting_evidence: String,
}

impl Judgment {
    /// Sentinel judgment recorded when the model call or extraction fails.
    pub fn failure(description: impl std::fmt::Display) -> Self {
        Self {
            score: SCORE_UNAVAILABLE.to_string(),
            criteria: ERROR_SENTINEL.to_string(),
            supporting_evidence: format!("Error processing record: {}", description),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.score == SCORE_UNAVAILABLE && self.criteria == ERROR_SENTINEL
    }

    /// The leading number of the score, if it has one (`"8/10"` gives 8).
    pub fn numeric_score(&self) -> Option<f64> {
        let token: String = self
            .score
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();
        token.trim_end_matches('.').parse().ok()
    }
}

#[derive(Debug, Clone, Copy)]
enum Label {
    Criteria,
    SupportingEvidence,
    Score,
}

impl Label {
    const ALL: [Label; 3] = [Label::Criteria, Label::SupportingEvidence, Label::Score];

    fn prefix(self) -> &'static str {
        match self {
            Label::Criteria => "criteria:",
            Label::SupportingEvidence => "supporting evidence:",
            Label::Score => "score:",
        }
    }

    fn numbered_pattern(self) -> &'static Regex {
        static CRITERIA: OnceLock<Regex> = OnceLock::new();
        static EVIDENCE: OnceLock<Regex> = OnceLock::new();
        static SCORE: OnceLock<Regex> = OnceLock::new();

        let (cell, label) = match self {
            Label::Criteria => (&CRITERIA, "Criteria"),
            Label::SupportingEvidence => (&EVIDENCE, "Supporting Evidence"),
            Label::Score => (&SCORE, "Score"),
        };
        cell.get_or_init(|| {
            Regex::new(&format!(r"(?is)(?:^|\n)[ \t]*\d+\.[ \t]*{}:(.*?)(?:\n[ \t]*\d+\.\s|\n[ \t]*\r?\n|\z)", label))
                .expect("Invalid regex pattern")
        })
    }
}

/// Value after `label` when `line` starts with it, ignoring case.
fn strip_label<'a>(line: &'a str, label: Label) -> Option<&'a str> {
    let prefix = label.prefix();
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) { line.get(prefix.len()..) } else { None }
}

/// First line starting with `label`, as its trimmed remainder.
fn scan_lines(raw: &str, label: Label) -> Option<String> {
    raw.lines()
        .map(str::trim)
        .find_map(|line| strip_label(line, label))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn scan_numbered(raw: &str, label: Label) -> Option<String> {
    label
        .numbered_pattern()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parses judge replies for one [`AnchorStrategy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseExtractor {
    anchor: AnchorStrategy,
}

impl ResponseExtractor {
    pub fn new(anchor: AnchorStrategy) -> Self {
        Self { anchor }
    }

    fn find(&self, raw: &str, label: Label) -> Option<String> {
        match self.anchor {
            AnchorStrategy::Line => scan_lines(raw, label),
            AnchorStrategy::Numbered => {
                scan_numbered(raw, label).or_else(|| scan_lines(raw, label))
            }
        }
    }

    /// Extract a judgment from `raw`.
    ///
    /// Missing labels default to [`NOT_AVAILABLE`]. Fails with
    /// [`EvalError::MalformedResponse`] only when no label was found at all.
    pub fn extract(&self, raw: &str) -> Result<Judgment> {
        let [criteria, supporting_evidence, score] = Label::ALL.map(|label| self.find(raw, label));

        if criteria.is_none() && supporting_evidence.is_none() && score.is_none() {
            let preview: String = raw.chars().take(200).collect();
            return Err(EvalError::MalformedResponse(preview));
        }

        let or_sentinel = |value: Option<String>| value.unwrap_or_else(|| NOT_AVAILABLE.to_string());
        Ok(Judgment {
            score: or_sentinel(score),
            criteria: or_sentinel(criteria),
            supporting_evidence: or_sentinel(supporting_evidence),
        })
    }
}
