//! Anthropic Messages API provider.

use super::{ContentBlock, LlmProvider, LlmRequest, LlmResponse, StopReason};
use crate::error::{Result, SyllabusError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

const API_VERSION: &str = "2023-06-01";

/// Provider backed by the Anthropic Messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    stop_reason: Option<StopReason>,
    content: Vec<ContentBlock>,
}

impl AnthropicProvider {
    /// Create a provider with an explicit API key.
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyllabusError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Create a provider reading `ANTHROPIC_API_KEY` from the environment.
    pub fn from_env(base_url: &str, timeout: Duration) -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| SyllabusError::Config("ANTHROPIC_API_KEY is not set".to_string()))?;
        Self::new(base_url, api_key, timeout)
    }

    /// Build the JSON body for a messages call.
    pub fn build_payload(request: &LlmRequest) -> Result<Value> {
        let mut payload = json!({
            "model": request.model,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "system": request.system,
            "messages": request.messages,
        });

        if let Some(tools) = &request.tools {
            let tools: Vec<Value> = tools
                .iter()
                .map(|schema| {
                    json!({
                        "name": schema.name,
                        "description": schema.description,
                        "input_schema": schema.input_schema(),
                    })
                })
                .collect();
            payload["tools"] = Value::Array(tools);
        }

        if let Some(choice) = &request.tool_choice {
            payload["tool_choice"] = serde_json::to_value(choice)?;
        }

        Ok(payload)
    }

    /// Parse a messages response body.
    pub fn parse_response(body: Value) -> Result<LlmResponse> {
        let parsed: MessagesResponse = serde_json::from_value(body)
            .map_err(|e| SyllabusError::Provider(format!("Unexpected response shape: {}", e)))?;

        Ok(LlmResponse {
            stop_reason: parsed.stop_reason.unwrap_or(StopReason::EndTurn),
            content: parsed.content,
        })
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    #[instrument(skip(self, request), fields(model = %request.model, turns = request.messages.len()))]
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let payload = Self::build_payload(request)?;
        let url = format!("{}/messages", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| SyllabusError::Provider(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => SyllabusError::Provider(format!("Authentication failed: {}", text)),
                429 => SyllabusError::Provider("Rate limit exceeded".to_string()),
                _ => SyllabusError::Provider(format!("Request failed ({}): {}", status, text)),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SyllabusError::Provider(format!("Failed to read response: {}", e)))?;

        let parsed = Self::parse_response(body)?;
        debug!("Anthropic stop reason: {:?}", parsed.stop_reason);
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Message, ToolChoice};
    use crate::tools::{ParameterKind, ParameterSpec, ToolSchema};

    fn request(with_tools: bool) -> LlmRequest {
        let schema = ToolSchema::new("search_course_content", "Search course materials")
            .with_parameter(ParameterSpec::new("query", ParameterKind::String, "What to search for").required());

        LlmRequest {
            model: "claude-sonnet-4-20250514".to_string(),
            temperature: 0.0,
            max_tokens: 800,
            system: "policy".to_string(),
            messages: vec![Message::user("What is MCP?")],
            tools: with_tools.then(|| vec![schema]),
            tool_choice: with_tools.then_some(ToolChoice::Auto),
        }
    }

    #[test]
    fn test_payload_with_tools() {
        let payload = AnthropicProvider::build_payload(&request(true)).unwrap();

        assert_eq!(payload["model"], "claude-sonnet-4-20250514");
        assert_eq!(payload["max_tokens"], 800);
        assert_eq!(payload["system"], "policy");
        assert_eq!(payload["messages"][0]["role"], "user");
        assert_eq!(payload["messages"][0]["content"][0]["text"], "What is MCP?");
        assert_eq!(payload["tools"][0]["name"], "search_course_content");
        assert_eq!(payload["tools"][0]["input_schema"]["required"][0], "query");
        assert_eq!(payload["tool_choice"]["type"], "auto");
    }

    #[test]
    fn test_payload_without_tools_omits_tool_fields() {
        let payload = AnthropicProvider::build_payload(&request(false)).unwrap();
        assert!(payload.get("tools").is_none());
        assert!(payload.get("tool_choice").is_none());
    }

    #[test]
    fn test_parse_tool_use_response() {
        let body = json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "stop_reason": "tool_use",
            "content": [
                {"type": "text", "text": "Let me look that up."},
                {"type": "tool_use", "id": "toolu_abc123", "name": "search_course_content", "input": {"query": "MCP"}}
            ]
        });

        let response = AnthropicProvider::parse_response(body).unwrap();
        assert!(response.wants_tools());
        let message = response.into_message();
        let invocations = message.tool_invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].id, "toolu_abc123");
        assert_eq!(invocations[0].input["query"], "MCP");
    }

    #[test]
    fn test_parse_rejects_malformed_body() {
        let err = AnthropicProvider::parse_response(json!({"error": "nope"})).unwrap_err();
        assert!(matches!(err, SyllabusError::Provider(_)));
    }
}
