//! LLM provider abstraction.
//!
//! The conversation model follows the Anthropic Messages shape: every turn is
//! a list of content blocks, and tool invocations and tool results are blocks
//! correlated by id. Providers with a different wire format map onto it.

mod anthropic;
mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

use crate::config::{LlmProviderKind, LlmSettings};
use crate::error::Result;
use crate::tools::ToolSchema;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One segment of a conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text { text: String },

    /// The model asks for a tool to run.
    ToolUse {
        /// Correlation id assigned by the provider.
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Output of a tool, answering the `ToolUse` with the same id.
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error,
        }
    }
}

/// A tool invocation extracted from an assistant turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub input: serde_json::Value,
}

/// A conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    /// Create a user turn with a single text block.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Create an assistant turn from content blocks.
    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }

    /// Create the user turn carrying one round of tool results.
    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: results,
        }
    }

    /// Tool invocations in this turn, in order.
    pub fn tool_invocations(&self) -> Vec<ToolInvocation> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some(ToolInvocation {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Other,
}

/// How the model may pick tools.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    Auto,
}

/// A single provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system: String,
    pub messages: Vec<Message>,
    /// Tools offered for this call. `None` forces a text answer.
    pub tools: Option<Vec<ToolSchema>>,
    pub tool_choice: Option<ToolChoice>,
}

/// A provider response turn.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub stop_reason: StopReason,
    pub content: Vec<ContentBlock>,
}

impl LlmResponse {
    /// Build a terminal text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            stop_reason: StopReason::EndTurn,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Whether the model asked for tools.
    pub fn wants_tools(&self) -> bool {
        self.stop_reason == StopReason::ToolUse
    }

    /// First text segment of the turn.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Convert into the assistant turn to append to the conversation.
    pub fn into_message(self) -> Message {
        Message::assistant(self.content)
    }
}

/// Trait for LLM providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Run one completion. Failures are fatal to the calling query.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Build the provider selected in settings.
pub fn create_provider(settings: &LlmSettings) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match settings.provider {
        LlmProviderKind::Anthropic => Arc::new(AnthropicProvider::from_env(
            &settings.anthropic_base_url,
            std::time::Duration::from_secs(settings.timeout_seconds),
        )?),
        LlmProviderKind::OpenAI => Arc::new(OpenAiProvider::new(std::time::Duration::from_secs(
            settings.timeout_seconds,
        ))?),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_block_wire_format() {
        let block = ContentBlock::tool_use("toolu_1", "search_course_content", json!({"query": "MCP"}));
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({"type": "tool_use", "id": "toolu_1", "name": "search_course_content", "input": {"query": "MCP"}})
        );

        let ok = ContentBlock::tool_result("toolu_1", "done", false);
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"type": "tool_result", "tool_use_id": "toolu_1", "content": "done"})
        );

        let failed = ContentBlock::tool_result("toolu_1", "boom", true);
        assert_eq!(serde_json::to_value(&failed).unwrap()["is_error"], json!(true));
    }

    #[test]
    fn test_unknown_stop_reason_maps_to_other() {
        let reason: StopReason = serde_json::from_value(json!("pause_turn")).unwrap();
        assert_eq!(reason, StopReason::Other);
        assert_eq!(serde_json::to_value(ToolChoice::Auto).unwrap(), json!({"type": "auto"}));
    }

    #[test]
    fn test_response_helpers() {
        let response = LlmResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![
                ContentBlock::tool_use("a", "x", json!({})),
                ContentBlock::text("thinking out loud"),
            ],
        };
        assert!(response.wants_tools());
        assert_eq!(response.first_text(), Some("thinking out loud"));

        let message = response.into_message();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.tool_invocations().len(), 1);
        assert_eq!(message.tool_invocations()[0].id, "a");
    }
}
