use super::{Completion, CompletionOptions, LLMError, LLMProvider, Message, ToolCall, ToolSchema};
use crate::config::LLMConfig;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

/// Client for any OpenAI-compatible chat-completions endpoint
pub struct OpenAIProvider {
    config: LLMConfig,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAIProvider {
    pub fn new(config: LLMConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config,
            api_key: None,
            client,
        }
    }

    /// Use a fixed key instead of reading `api_key_env` on every request
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    fn resolve_api_key(&self) -> super::Result<String> {
        if let Some(key) = &self.api_key {
            return Ok(key.clone());
        }
        self.config
            .api_key()
            .map_err(|e| LLMError::AuthenticationFailed(e.to_string()))
    }
}

fn encode_message(msg: &Message) -> Value {
    let mut encoded = json!({
        "role": msg.role.to_string(),
        "content": msg.content,
    });

    if let Some(calls) = &msg.tool_calls {
        encoded["tool_calls"] = calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.arguments,
                    }
                })
            })
            .collect();
    }
    if let Some(id) = &msg.tool_call_id {
        encoded["tool_call_id"] = json!(id);
    }

    encoded
}

fn encode_tool(schema: &ToolSchema) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": schema.name,
            "description": schema.description,
            "parameters": schema.parameters,
        }
    })
}

fn decode_tool_calls(message: &Value) -> super::Result<Vec<ToolCall>> {
    let Some(calls) = message.get("tool_calls").and_then(|c| c.as_array()) else {
        return Ok(Vec::new());
    };

    calls
        .iter()
        .map(|call| {
            let id = call
                .get("id")
                .and_then(|v| v.as_str())
                .ok_or_else(|| LLMError::ParseError("Tool call without id".to_string()))?;
            let function = call
                .get("function")
                .ok_or_else(|| LLMError::ParseError("Tool call without function".to_string()))?;
            let name = function
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| LLMError::ParseError("Tool call without name".to_string()))?;
            // Some servers send arguments as an object rather than a JSON string
            let arguments = match function.get("arguments") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            Ok(ToolCall::new(id, name, arguments))
        })
        .collect()
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn check_health(&self) -> bool {
        self.resolve_api_key().is_ok()
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolSchema]>,
        options: CompletionOptions,
    ) -> super::Result<Completion> {
        let api_key = self.resolve_api_key()?;

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));

        let api_messages: Vec<Value> = messages.iter().map(encode_message).collect();

        let mut payload = json!({
            "model": self.config.model,
            "messages": api_messages,
            "temperature": options.temperature,
        });
        if let Some(max_tokens) = options.max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }
        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            payload["tools"] = tools.iter().map(encode_tool).collect();
        }

        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            tools = tools.map_or(0, <[ToolSchema]>::len),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout(self.config.request_timeout_secs)
                } else {
                    LLMError::NetworkError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(LLMError::AuthenticationFailed(text));
            } else if status.as_u16() == 429 {
                return Err(LLMError::RateLimitExceeded);
            } else if status.is_server_error() {
                return Err(LLMError::ProviderUnavailable(format!("{}: {}", status, text)));
            } else {
                return Err(LLMError::InvalidRequest(text));
            }
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| LLMError::ParseError(e.to_string()))?;

        let choice = data
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| LLMError::ParseError("No choices in response".to_string()))?;

        let message = choice
            .get("message")
            .ok_or_else(|| LLMError::ParseError("No message in choice".to_string()))?;

        let content = message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default();
        let tool_calls = decode_tool_calls(message)?;

        Ok(Completion::with_calls(content, tool_calls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_assistant_with_calls() {
        let msg = Message::assistant_with_calls(
            "",
            vec![ToolCall::new("call_1", "assign_task", r#"{"agent":"file"}"#)],
        );
        let encoded = encode_message(&msg);
        assert_eq!(encoded["role"], "assistant");
        assert_eq!(encoded["tool_calls"][0]["type"], "function");
        assert_eq!(encoded["tool_calls"][0]["function"]["name"], "assign_task");
        assert!(encoded.get("tool_call_id").is_none());
    }

    #[test]
    fn test_encode_tool_result() {
        let encoded = encode_message(&Message::tool_result("[agent] ok", "call_1"));
        assert_eq!(encoded["role"], "tool");
        assert_eq!(encoded["tool_call_id"], "call_1");
        assert!(encoded.get("tool_calls").is_none());
    }

    #[test]
    fn test_decode_tool_calls_accepts_object_arguments() {
        let message = json!({
            "content": null,
            "tool_calls": [
                {"id": "a", "type": "function", "function": {"name": "x", "arguments": "{\"k\":1}"}},
                {"id": "b", "type": "function", "function": {"name": "y", "arguments": {"k": 2}}}
            ]
        });
        let calls = decode_tool_calls(&message).unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].arguments, r#"{"k":1}"#);
        assert_eq!(calls[1].arguments, r#"{"k":2}"#);
    }

    #[test]
    fn test_decode_missing_tool_calls_is_empty() {
        let calls = decode_tool_calls(&json!({"content": "hi"})).unwrap();
        assert!(calls.is_empty());
    }
}
