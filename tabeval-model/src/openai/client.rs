//! OpenAI client implementation.

use super::config::OpenAIConfig;
use super::convert::{self, ChatCompletionRequest, ChatCompletionResponse};
use async_stream::try_stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tabeval_core::{Llm, LlmRequest, LlmResponseStream, TabevalError};

/// OpenAI client for the chat completions API and OpenAI-compatible APIs.
///
/// Each call issues exactly one HTTP request; failures are returned to the
/// caller without retrying.
pub struct OpenAIClient {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIClient {
    /// Create a new OpenAI client.
    pub fn new(config: OpenAIConfig) -> Result<Self, TabevalError> {
        let client = Client::builder()
            .build()
            .map_err(|e| TabevalError::Model(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create a client for an OpenAI-compatible API.
    pub fn compatible(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, TabevalError> {
        Self::new(OpenAIConfig::compatible(api_key, base_url, model))
    }

    /// Build the API URL for chat completions.
    fn api_url(&self) -> String {
        format!("{}/chat/completions", self.config.effective_base_url().trim_end_matches('/'))
    }

    /// Build a chat completion request from an LLM request.
    fn build_request(&self, request: &LlmRequest, stream: bool) -> ChatCompletionRequest {
        let temperature = request.config.as_ref().and_then(|c| c.temperature);
        let max_tokens =
            request.config.as_ref().and_then(|c| c.max_output_tokens).map(|t| t as u32);

        ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: convert::request_messages(request),
            temperature,
            max_tokens,
            stream: if stream { Some(true) } else { None },
        }
    }
}

/// Raw SSE bytes waiting for a line break.
///
/// Lines are decoded only once complete, so a multi-byte character split
/// across network chunks is reassembled before decoding.
#[derive(Debug, Default)]
struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    /// Append a chunk and return every line it completes, trimmed.
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.bytes.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(end) = self.bytes.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.bytes.drain(..=end).collect();
            lines.push(String::from_utf8_lossy(&line[..end]).trim().to_string());
        }
        lines
    }

    /// The trailing line when the stream ends without a final newline.
    fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.bytes);
        let line = String::from_utf8_lossy(&rest).trim().to_string();
        (!line.is_empty()).then_some(line)
    }
}

#[async_trait]
impl Llm for OpenAIClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate_content(
        &self,
        request: LlmRequest,
        stream: bool,
    ) -> Result<LlmResponseStream, TabevalError> {
        let chat_request = self.build_request(&request, stream);

        let mut builder = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.config.api_key)
            .json(&chat_request);
        if let Some(org_id) = &self.config.organization_id {
            builder = builder.header("OpenAI-Organization", org_id);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(model = %self.config.model, error = %e, "OpenAI request failed");
            TabevalError::Model(format!("OpenAI API request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(model = %self.config.model, %status, "OpenAI API returned an error");
            return Err(TabevalError::Model(format!("OpenAI API error ({}): {}", status, error_text)));
        }

        let response_stream = try_stream! {
            if stream {
                let mut byte_stream = response.bytes_stream();
                let mut lines = LineBuffer::default();
                let mut finished = false;

                while !finished {
                    let batch = match byte_stream.next().await {
                        Some(chunk_result) => {
                            let chunk = chunk_result
                                .map_err(|e| TabevalError::Model(format!("Stream read error: {}", e)))?;
                            lines.push(&chunk)
                        }
                        None => {
                            finished = true;
                            lines.finish().into_iter().collect()
                        }
                    };

                    for line in batch {
                        if line.is_empty() || line == "data: [DONE]" {
                            continue;
                        }

                        if let Some(data) = line.strip_prefix("data: ") {
                            match serde_json::from_str::<ChatCompletionResponse>(data) {
                                Ok(chunk_response) => {
                                    if let Some(response) = convert::from_chunk(&chunk_response) {
                                        yield response;
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!("Failed to parse OpenAI chunk: {} - {}", e, data);
                                }
                            }
                        }
                    }
                }
            } else {
                let response_text = response.text().await
                    .map_err(|e| TabevalError::Model(format!("Failed to read response: {}", e)))?;

                let chat_response: ChatCompletionResponse = serde_json::from_str(&response_text)
                    .map_err(|e| TabevalError::Model(format!(
                        "Failed to parse response: {} - {}",
                        e, response_text
                    )))?;

                yield convert::from_response(&chat_response);
            }
        };

        Ok(Box::pin(response_stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabeval_core::{Content, GenerateContentConfig};

    #[test]
    fn test_line_buffer_joins_split_characters() {
        let line = "data: caf\u{e9}\n".as_bytes();
        let split = line.iter().position(|b| *b == 0xC3).unwrap() + 1;

        let mut buffer = LineBuffer::default();
        assert!(buffer.push(&line[..split]).is_empty());
        assert_eq!(buffer.push(&line[split..]), vec!["data: caf\u{e9}".to_string()]);
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn test_line_buffer_keeps_unterminated_tail() {
        let mut buffer = LineBuffer::default();
        assert_eq!(buffer.push(b"data: a\r\ndata: b"), vec!["data: a".to_string()]);
        assert_eq!(buffer.finish(), Some("data: b".to_string()));
    }

    #[test]
    fn test_api_url_trims_trailing_slash() {
        let client =
            OpenAIClient::compatible("key", "http://localhost:8000/v1/", "judge").unwrap();
        assert_eq!(client.api_url(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_build_request_carries_config() {
        let client = OpenAIClient::new(OpenAIConfig::new("key", "gpt-4")).unwrap();
        let request = LlmRequest::new("ignored", vec![Content::new("user").with_text("hi")])
            .with_system_instruction("grade")
            .with_config(GenerateContentConfig {
                temperature: Some(0.0),
                max_output_tokens: Some(256),
            });

        let chat = client.build_request(&request, false);
        assert_eq!(chat.model, "gpt-4");
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.temperature, Some(0.0));
        assert_eq!(chat.max_tokens, Some(256));
        assert_eq!(chat.stream, None);
    }
}
