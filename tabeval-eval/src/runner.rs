//! Evaluation runner
//!
//! Drives one metric over a table: compose, call the judge, extract, and collect
//! one [`ResultRecord`] per record in table order. A failing record becomes a
//! sentinel row; it never stops the run.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use tabeval_core::{Content, GenerateContentConfig, Llm, LlmRequest};
use tabeval_telemetry::{eval_run_span, model_call_span, record_span};
use tracing::Instrument;

use crate::error::{EvalError, Result};
use crate::extract::{Judgment, ResponseExtractor};
use crate::metric::MetricSpec;
use crate::prompt::{ComposedPrompt, PromptComposer};
use crate::report::ResultRecord;
use crate::table::Record;

/// The judge as the runner sees it: two prompts in, reply text out.
#[async_trait]
pub trait ModelCapability: Send + Sync {
    fn name(&self) -> &str;
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Sampling settings sent with every judge call.
#[derive(Debug, Clone)]
pub struct LlmJudgeConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
    /// Read the reply as a stream of deltas.
    pub stream: bool,
}

impl Default for LlmJudgeConfig {
    fn default() -> Self {
        Self { temperature: Some(0.0), max_tokens: None, stream: false }
    }
}

/// [`ModelCapability`] over any [`Llm`].
pub struct LlmJudge {
    model: Arc<dyn Llm>,
    config: LlmJudgeConfig,
}

impl LlmJudge {
    pub fn new(model: Arc<dyn Llm>) -> Self {
        Self { model, config: LlmJudgeConfig::default() }
    }

    pub fn with_config(model: Arc<dyn Llm>, config: LlmJudgeConfig) -> Self {
        Self { model, config }
    }
}

#[async_trait]
impl ModelCapability for LlmJudge {
    fn name(&self) -> &str {
        self.model.name()
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request =
            LlmRequest::new(self.model.name(), vec![Content::new("user").with_text(user_prompt)])
                .with_system_instruction(system_prompt)
                .with_config(GenerateContentConfig {
                    temperature: self.config.temperature,
                    max_output_tokens: self.config.max_tokens,
                });

        let mut stream = self.model.generate_content(request, self.config.stream).await?;

        let mut response_text = String::new();
        while let Some(result) = stream.next().await {
            if let Some(content) = result?.content {
                response_text.push_str(&content.text());
            }
        }

        if response_text.trim().is_empty() {
            return Err(EvalError::ModelInvocation("Empty response from judge".to_string()));
        }

        Ok(response_text)
    }
}

/// Runs metrics over records, one record at a time.
#[derive(Debug, Clone, Default)]
pub struct EvaluationRunner {
    composer: PromptComposer,
    extractor: ResponseExtractor,
}

impl EvaluationRunner {
    pub fn new(composer: PromptComposer, extractor: ResponseExtractor) -> Self {
        Self { composer, extractor }
    }

    /// Warning shown once per run when the instruction is cut.
    pub fn truncation_warning(&self) -> String {
        format!(
            "The system prompt exceeds {} characters and will be truncated.",
            self.composer.max_instruction_chars()
        )
    }

    async fn judge(&self, prompt: &ComposedPrompt, model: &dyn ModelCapability) -> Result<Judgment> {
        let reply = model
            .complete(&prompt.system_prompt, &prompt.user_prompt)
            .instrument(model_call_span(model.name()))
            .await?;
        self.extractor.extract(&reply)
    }

    /// Evaluate `records` under `spec`, in order.
    ///
    /// Always returns exactly one result per record. Model and extraction
    /// failures are recorded as [`Judgment::failure`] rows.
    pub async fn run(
        &self,
        spec: &MetricSpec,
        records: &[Record],
        model: &dyn ModelCapability,
    ) -> Vec<ResultRecord> {
        let span = eval_run_span(spec.label(), records.len());
        async move {
            tracing::info!(model = model.name(), "evaluation started");

            let mut results = Vec::with_capacity(records.len());
            let mut warned = false;
            let mut failed = 0usize;

            for record in records {
                let prompt = self.composer.compose(spec, record);
                if prompt.truncated && !warned {
                    tracing::warn!("{}", self.truncation_warning());
                    warned = true;
                }

                let index = record.index().to_string();
                let judgment = self
                    .judge(&prompt, model)
                    .instrument(record_span(&index))
                    .await
                    .unwrap_or_else(|e| {
                        tracing::warn!(index = %index, error = %e, "record evaluation failed");
                        failed += 1;
                        Judgment::failure(e)
                    });

                results.push(ResultRecord::new(
                    record,
                    spec.schema(),
                    spec.label(),
                    spec.selected_columns(),
                    judgment,
                ));
            }

            tracing::info!(evaluated = results.len(), failed, "evaluation finished");
            results
        }
        .instrument(span)
        .await
    }
}
