use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tabeval_core::{Llm, LlmRequest, LlmResponse, LlmResponseStream, Result, TabevalError};

/// Scripted model for tests and dry runs.
///
/// The n-th call receives the n-th scripted reply; once the script is exhausted
/// the last reply is repeated. A model with no script yields an empty stream.
pub struct MockLlm {
    name: String,
    replies: Vec<std::result::Result<LlmResponse, String>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: vec![],
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: LlmResponse) -> Self {
        self.replies.push(Ok(response));
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_response(LlmResponse::text(text))
    }

    /// Script a failed call, surfaced as a model error.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.replies.push(Err(message.into()));
        self
    }

    /// Number of `generate_content` calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl Llm for MockLlm {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate_content(&self, req: LlmRequest, _stream: bool) -> Result<LlmResponseStream> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).push(req);

        let reply = self.replies.get(call).or_else(|| self.replies.last()).cloned();
        let response = match reply {
            Some(Ok(response)) => Some(response),
            Some(Err(message)) => return Err(TabevalError::Model(message)),
            None => None,
        };

        let stream = async_stream::stream! {
            if let Some(response) = response {
                yield Ok(response);
            }
        };
        Ok(Box::pin(stream))
    }
}
