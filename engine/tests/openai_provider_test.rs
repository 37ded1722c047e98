//! OpenAI-compatible backend against a mock HTTP server

use pollex_engine::config::LLMConfig;
use pollex_engine::llm::openai::OpenAIProvider;
use pollex_engine::llm::{
    CompletionOptions, LLMError, LLMProvider, Message, ToolCall, ToolSchema,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> OpenAIProvider {
    let config = LLMConfig {
        base_url: format!("{}/v1", server.uri()),
        model: "test-model".to_string(),
        ..LLMConfig::default()
    };
    OpenAIProvider::new(config).with_api_key("test-key")
}

fn assign_schema() -> ToolSchema {
    ToolSchema {
        name: "assign_task".to_string(),
        description: "Assign a subtask".to_string(),
        parameters: json!({"type": "object", "properties": {}}),
    }
}

async fn mount(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_text_completion_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "test-model", "max_tokens": 1000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "All done."}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messages = vec![Message::system("You are helpful."), Message::user("Summarize")];
    let completion = provider(&server)
        .complete(&messages, None, CompletionOptions::new(0.3).with_max_tokens(1000))
        .await
        .unwrap();

    assert_eq!(completion.content, "All done.");
    assert!(completion.tool_calls.is_empty());

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "Summarize");
    assert!(body.get("tools").is_none());
    assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
}

#[tokio::test]
async fn test_tool_calls_decoded_in_order() {
    let server = MockServer::start().await;
    mount(
        &server,
        200,
        json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {
                            "id": "call_a",
                            "type": "function",
                            "function": {
                                "name": "assign_task",
                                "arguments": "{\"agent\":\"browser\",\"task\":\"search\",\"reason\":\"web\"}"
                            }
                        },
                        {
                            "id": "call_b",
                            "type": "function",
                            "function": {
                                "name": "assign_task",
                                "arguments": {"agent": "code", "task": "compute", "reason": "math"}
                            }
                        }
                    ]
                }
            }]
        }),
    )
    .await;

    let completion = provider(&server)
        .complete(
            &[Message::user("plan this")],
            Some(&[assign_schema()]),
            CompletionOptions::new(0.7),
        )
        .await
        .unwrap();

    assert_eq!(completion.content, "");
    assert_eq!(completion.tool_calls.len(), 2);
    assert_eq!(completion.tool_calls[0].id, "call_a");
    assert_eq!(completion.tool_calls[1].id, "call_b");
    let args: Value = serde_json::from_str(&completion.tool_calls[1].arguments).unwrap();
    assert_eq!(args["agent"], "code");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["name"], "assign_task");
    assert!(body.get("max_tokens").is_none());
}

#[tokio::test]
async fn test_history_with_tool_messages_is_encoded() {
    let server = MockServer::start().await;
    mount(
        &server,
        200,
        json!({"choices": [{"message": {"role": "assistant", "content": "ok"}}]}),
    )
    .await;

    let history = vec![
        Message::user("task"),
        Message::assistant_with_calls("", vec![ToolCall::new("c1", "assign_task", "{}")]),
        Message::tool_result("[code] 4", "c1"),
    ];
    provider(&server)
        .complete(&history, None, CompletionOptions::new(0.3))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][1]["tool_calls"][0]["id"], "c1");
    assert_eq!(body["messages"][1]["tool_calls"][0]["function"]["name"], "assign_task");
    assert_eq!(body["messages"][2]["role"], "tool");
    assert_eq!(body["messages"][2]["tool_call_id"], "c1");
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_failed() {
    let server = MockServer::start().await;
    mount(&server, 401, json!({"error": {"message": "bad key"}})).await;

    let err = provider(&server)
        .complete(&[Message::user("hi")], None, CompletionOptions::new(0.7))
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::AuthenticationFailed(_)));
}

#[tokio::test]
async fn test_rate_limit_maps_to_rate_limit_exceeded() {
    let server = MockServer::start().await;
    mount(&server, 429, json!({"error": {"message": "slow down"}})).await;

    let err = provider(&server)
        .complete(&[Message::user("hi")], None, CompletionOptions::new(0.7))
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::RateLimitExceeded));
}

#[tokio::test]
async fn test_server_error_maps_to_provider_unavailable() {
    let server = MockServer::start().await;
    mount(&server, 503, json!({"error": {"message": "overloaded"}})).await;

    let err = provider(&server)
        .complete(&[Message::user("hi")], None, CompletionOptions::new(0.7))
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::ProviderUnavailable(_)));
}

#[tokio::test]
async fn test_missing_choices_is_parse_error() {
    let server = MockServer::start().await;
    mount(&server, 200, json!({"choices": []})).await;

    let err = provider(&server)
        .complete(&[Message::user("hi")], None, CompletionOptions::new(0.7))
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::ParseError(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let config = LLMConfig {
        base_url: "http://127.0.0.1:9/v1".to_string(),
        ..LLMConfig::default()
    };
    let err = OpenAIProvider::new(config)
        .with_api_key("k")
        .complete(&[Message::user("hi")], None, CompletionOptions::new(0.7))
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::NetworkError(_) | LLMError::Timeout(_)));
}

#[tokio::test]
async fn test_slow_endpoint_times_out_with_configured_seconds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(std::time::Duration::from_secs(5))
                .set_body_json(json!({"choices": [{"message": {"content": "late"}}]})),
        )
        .mount(&server)
        .await;
    let config = LLMConfig {
        base_url: format!("{}/v1", server.uri()),
        request_timeout_secs: 1,
        ..LLMConfig::default()
    };

    let err = OpenAIProvider::new(config)
        .with_api_key("k")
        .complete(&[Message::user("hi")], None, CompletionOptions::new(0.7))
        .await
        .unwrap_err();

    assert!(matches!(err, LLMError::Timeout(1)));
    let engine_err: sdk::EngineError = err.into();
    assert!(matches!(engine_err, sdk::EngineError::LLMTimeout(1)));
}
