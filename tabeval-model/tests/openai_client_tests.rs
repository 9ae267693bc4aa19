use futures::StreamExt;
use serde_json::json;
use tabeval_core::{Content, Llm, LlmRequest, TabevalError};
use tabeval_model::openai::{OpenAIClient, OpenAIConfig};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn judge_request() -> LlmRequest {
    LlmRequest::new(
        "gpt-4",
        vec![Content::new("user").with_text("question: What is Rust?\n\nanswer: A language.\n\n")],
    )
    .with_system_instruction("You are a RELEVANCE grader")
}

async fn collect_text(client: &OpenAIClient, stream: bool) -> Result<String, TabevalError> {
    let mut responses = client.generate_content(judge_request(), stream).await?;
    let mut text = String::new();
    while let Some(response) = responses.next().await {
        if let Some(content) = response?.content {
            text.push_str(&content.text());
        }
    }
    Ok(text)
}

#[tokio::test]
async fn test_non_streaming_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({ "model": "gpt-4" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1,
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "Criteria: relevant\nSupporting Evidence: mentions Rust\nScore: 8"
                },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client =
        OpenAIClient::new(OpenAIConfig::new("sk-test", "gpt-4").with_base_url(server.uri()))
            .unwrap();
    let text = collect_text(&client, false).await.unwrap();

    assert!(text.starts_with("Criteria: relevant"));
    assert!(text.ends_with("Score: 8"));

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "You are a RELEVANCE grader");
    assert_eq!(body["messages"][1]["role"], "user");
    assert!(body.get("stream").is_none());
}

#[tokio::test]
async fn test_streaming_completion_concatenates_deltas() {
    let server = MockServer::start().await;
    let body = [
        r#"data: {"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#,
        r#"data: {"choices":[{"index":0,"delta":{"content":"Score: "}}]}"#,
        r#"data: {"choices":[{"index":0,"delta":{"content":"9"}}]}"#,
        r#"data: {"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
        "data: [DONE]",
        "",
    ]
    .join("\n\n");

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "stream": true })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = OpenAIClient::compatible("sk-test", server.uri(), "gpt-4").unwrap();
    let text = collect_text(&client, true).await.unwrap();

    assert_eq!(text, "Score: 9");
}

#[tokio::test]
async fn test_streaming_keeps_multibyte_text_and_unterminated_tail() {
    let server = MockServer::start().await;
    let body = [
        r#"data: {"choices":[{"index":0,"delta":{"content":"Criteria: caf\u00e9 "}}]}"#,
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"na\u{ef}ve \u{2713}\"}}]}",
    ]
    .join("\n\n");

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/event-stream"))
        .mount(&server)
        .await;

    let client = OpenAIClient::compatible("sk-test", server.uri(), "gpt-4").unwrap();
    let text = collect_text(&client, true).await.unwrap();

    assert_eq!(text, "Criteria: caf\u{e9} na\u{ef}ve \u{2713}");
    assert!(!text.contains('\u{fffd}'));
}

#[tokio::test]
async fn test_error_status_is_model_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limit reached"))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAIClient::compatible("sk-test", server.uri(), "gpt-4").unwrap();
    let err = collect_text(&client, false).await.unwrap_err();

    match err {
        TabevalError::Model(message) => {
            assert!(message.contains("429"));
            assert!(message.contains("rate limit reached"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
