//! Evaluation configuration files
//!
//! A TOML file names the judge model, the prompt layout, and one `[[metrics]]`
//! block per metric slot.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, Result};
use crate::extract::ResponseExtractor;
use crate::metric::MetricSpec;
use crate::prompt::{AnchorStrategy, DEFAULT_MAX_INSTRUCTION_CHARS, PromptComposer};
use crate::runner::{EvaluationRunner, LlmJudgeConfig};
use crate::table::Schema;

/// Environment variable holding the API key unless configured otherwise.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Judge model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAI,
    /// Scripted replies, no network
    Mock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub provider: Provider,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key_env: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
    pub stream: bool,
    /// Replies returned in order by the mock provider
    pub mock_replies: Vec<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAI,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            temperature: Some(0.0),
            max_tokens: None,
            stream: false,
            mock_replies: Vec::new(),
        }
    }
}

impl ModelSettings {
    pub fn judge_config(&self) -> LlmJudgeConfig {
        LlmJudgeConfig {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: self.stream,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    pub max_instruction_chars: usize,
    pub anchor: AnchorStrategy,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self { max_instruction_chars: DEFAULT_MAX_INSTRUCTION_CHARS, anchor: AnchorStrategy::Line }
    }
}

/// One metric slot as written in the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSlot {
    pub label: Option<String>,
    pub fields: Vec<String>,
    pub instruction: Option<String>,
    pub auto: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub model: ModelSettings,
    pub prompt: PromptSettings,
    pub metrics: Vec<MetricSlot>,
}

impl EvalConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EvalConfig = toml::from_str(text)?;
        if config.prompt.max_instruction_chars == 0 {
            return Err(EvalError::Config("max_instruction_chars must be positive".to_string()));
        }
        Ok(config)
    }

    /// Build the configured metrics against `schema`, in slot order.
    pub fn metric_specs(&self, schema: Schema) -> Result<Vec<MetricSpec>> {
        if self.metrics.is_empty() {
            return Err(EvalError::Config("at least one [[metrics]] entry is required".to_string()));
        }

        self.metrics
            .iter()
            .enumerate()
            .map(|(position, slot)| {
                MetricSpec::for_slot(
                    position,
                    slot.label.clone(),
                    schema,
                    &slot.fields,
                    slot.instruction.clone(),
                    slot.auto,
                )
                .map_err(|e| match e {
                    EvalError::UnknownField { field, schema } => EvalError::Config(format!(
                        "metric {}: column '{}' is not selectable for {} tables (choose from: {})",
                        position + 1,
                        field,
                        schema,
                        schema.selectable_fields().join(", ")
                    )),
                    other => other,
                })
            })
            .collect()
    }

    pub fn composer(&self) -> PromptComposer {
        PromptComposer::new(self.prompt.max_instruction_chars, self.prompt.anchor)
    }

    pub fn extractor(&self) -> ResponseExtractor {
        ResponseExtractor::new(self.prompt.anchor)
    }

    pub fn runner(&self) -> EvaluationRunner {
        EvaluationRunner::new(self.composer(), self.extractor())
    }
}
