//! Wire types for the OpenAI chat completions API.

use serde::{Deserialize, Serialize};
use tabeval_core::{Content, FinishReason, LlmRequest, LlmResponse, UsageMetadata};

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: Option<String>,
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// Chat completion response, also used for streamed chunks.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub delta: Option<DeltaMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DeltaMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Map a content role onto the OpenAI vocabulary.
fn openai_role(role: &str) -> &str {
    match role {
        "model" => "assistant",
        other => other,
    }
}

/// Flatten a request into OpenAI messages: system instruction first, then contents.
pub fn request_messages(request: &LlmRequest) -> Vec<Message> {
    let mut messages = Vec::with_capacity(request.contents.len() + 1);
    if let Some(system) = &request.system_instruction {
        messages.push(Message { role: "system".to_string(), content: Some(system.clone()) });
    }
    messages.extend(request.contents.iter().map(|content| Message {
        role: openai_role(&content.role).to_string(),
        content: Some(content.text()),
    }));
    messages
}

fn usage_metadata(usage: &Usage) -> UsageMetadata {
    UsageMetadata {
        prompt_token_count: usage.prompt_tokens as i32,
        candidates_token_count: usage.completion_tokens as i32,
        total_token_count: usage.total_tokens as i32,
    }
}

/// Convert a non-streaming response.
pub fn from_response(response: &ChatCompletionResponse) -> LlmResponse {
    let choice = response.choices.first();
    let text = choice.and_then(|c| c.message.as_ref()).and_then(|m| m.content.clone());

    LlmResponse {
        content: text.map(|t| Content::new("model").with_text(t)),
        usage_metadata: response.usage.as_ref().map(usage_metadata),
        finish_reason: choice
            .and_then(|c| c.finish_reason.as_deref())
            .map(FinishReason::from_openai),
        partial: false,
        turn_complete: true,
    }
}

/// Convert one streamed chunk. Returns `None` for chunks carrying neither text
/// nor a finish reason.
pub fn from_chunk(chunk: &ChatCompletionResponse) -> Option<LlmResponse> {
    let choice = chunk.choices.first()?;
    let text = choice.delta.as_ref().and_then(|d| d.content.clone()).filter(|t| !t.is_empty());
    let finish_reason = choice.finish_reason.as_deref().map(FinishReason::from_openai);

    if text.is_none() && finish_reason.is_none() {
        return None;
    }

    Some(LlmResponse {
        content: text.map(|t| Content::new("model").with_text(t)),
        usage_metadata: chunk.usage.as_ref().map(usage_metadata),
        finish_reason,
        partial: finish_reason.is_none(),
        turn_complete: finish_reason.is_some(),
    })
}
