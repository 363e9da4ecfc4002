//! OpenAI chat completions provider.
//!
//! Assistant tool-use turns become assistant messages with `tool_calls`, and
//! each tool result becomes its own `tool` message.

use super::{ContentBlock, LlmProvider, LlmRequest, LlmResponse, Message, Role, StopReason};
use crate::error::{Result, SyllabusError};
use crate::openai::create_client_with_timeout;
use crate::tools::ToolSchema;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs, ChatCompletionTool,
    ChatCompletionToolChoiceOption, ChatCompletionToolType, CreateChatCompletionRequestArgs,
    FinishReason, FunctionCall, FunctionObject,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Provider backed by OpenAI chat completions.
pub struct OpenAiProvider {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
}

impl OpenAiProvider {
    /// Create a provider using `OPENAI_API_KEY` from the environment.
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(timeout)?,
        })
    }

    /// Convert the system prompt and conversation into chat messages.
    pub fn to_chat_messages(system: &str, messages: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>> {
        let build_err = |e: async_openai::error::OpenAIError| SyllabusError::Provider(e.to_string());

        let mut out: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system.to_string())
                .build()
                .map_err(build_err)?
                .into(),
        ];

        for message in messages {
            let text = message
                .content
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n");

            match message.role {
                Role::User => {
                    for block in &message.content {
                        if let ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            ..
                        } = block
                        {
                            out.push(
                                ChatCompletionRequestToolMessageArgs::default()
                                    .tool_call_id(tool_use_id.as_str())
                                    .content(content.clone())
                                    .build()
                                    .map_err(build_err)?
                                    .into(),
                            );
                        }
                    }
                    if !text.is_empty() {
                        out.push(
                            ChatCompletionRequestUserMessageArgs::default()
                                .content(text)
                                .build()
                                .map_err(build_err)?
                                .into(),
                        );
                    }
                }
                Role::Assistant => {
                    let tool_calls: Vec<ChatCompletionMessageToolCall> = message
                        .tool_invocations()
                        .into_iter()
                        .map(|inv| ChatCompletionMessageToolCall {
                            id: inv.id,
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: inv.name,
                                arguments: inv.input.to_string(),
                            },
                        })
                        .collect();

                    let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                    if !text.is_empty() {
                        args.content(text);
                    }
                    if !tool_calls.is_empty() {
                        args.tool_calls(tool_calls);
                    }
                    out.push(args.build().map_err(build_err)?.into());
                }
            }
        }

        Ok(out)
    }

    /// Convert tool schemas into function tools.
    pub fn to_chat_tools(schemas: &[ToolSchema]) -> Vec<ChatCompletionTool> {
        schemas
            .iter()
            .map(|schema| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: schema.name.clone(),
                    description: Some(schema.description.clone()),
                    parameters: Some(schema.input_schema()),
                    strict: None,
                },
            })
            .collect()
    }

    /// Map one completion choice onto the provider-neutral response.
    pub fn from_choice(
        content: Option<String>,
        tool_calls: Option<Vec<ChatCompletionMessageToolCall>>,
        finish_reason: Option<FinishReason>,
    ) -> LlmResponse {
        let mut blocks = Vec::new();
        if let Some(text) = content.filter(|t| !t.is_empty()) {
            blocks.push(ContentBlock::text(text));
        }

        let tool_calls = tool_calls.unwrap_or_default();
        let has_tool_calls = !tool_calls.is_empty();
        for call in tool_calls {
            let input = serde_json::from_str(&call.function.arguments)
                .unwrap_or(serde_json::Value::String(call.function.arguments.clone()));
            blocks.push(ContentBlock::tool_use(call.id, call.function.name, input));
        }

        let stop_reason = match finish_reason {
            _ if has_tool_calls => StopReason::ToolUse,
            Some(FinishReason::ToolCalls) => StopReason::ToolUse,
            Some(FinishReason::Length) => StopReason::MaxTokens,
            Some(FinishReason::Stop) | None => StopReason::EndTurn,
            Some(_) => StopReason::Other,
        };

        LlmResponse {
            stop_reason,
            content: blocks,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %request.model, turns = request.messages.len()))]
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let messages = Self::to_chat_messages(&request.system, &request.messages)?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&request.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens);

        if let Some(tools) = &request.tools {
            args.tools(Self::to_chat_tools(tools));
        }
        if request.tool_choice.is_some() {
            args.tool_choice(ChatCompletionToolChoiceOption::Auto);
        }

        let chat_request = args
            .build()
            .map_err(|e| SyllabusError::Provider(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| SyllabusError::OpenAI(format!("Chat completion failed: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SyllabusError::Provider("No response from model".to_string()))?;

        debug!("OpenAI finish reason: {:?}", choice.finish_reason);
        Ok(Self::from_choice(
            choice.message.content,
            choice.message.tool_calls,
            choice.finish_reason,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_round_maps_to_tool_messages() {
        let conversation = vec![
            Message::user("What is MCP?"),
            Message::assistant(vec![
                ContentBlock::tool_use("call_1", "search_course_content", json!({"query": "MCP"})),
                ContentBlock::tool_use("call_2", "get_course_outline", json!({"course_name": "MCP"})),
            ]),
            Message::tool_results(vec![
                ContentBlock::tool_result("call_1", "results", false),
                ContentBlock::tool_result("call_2", "Error executing tool: boom", true),
            ]),
        ];

        let messages = OpenAiProvider::to_chat_messages("policy", &conversation).unwrap();
        assert_eq!(messages.len(), 5);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        match &messages[2] {
            ChatCompletionRequestMessage::Assistant(assistant) => {
                let calls = assistant.tool_calls.as_ref().unwrap();
                assert_eq!(calls.len(), 2);
                assert_eq!(calls[0].id, "call_1");
                assert_eq!(calls[1].function.name, "get_course_outline");
            }
            other => panic!("Expected assistant message, got {:?}", other),
        }
        match &messages[4] {
            ChatCompletionRequestMessage::Tool(tool) => assert_eq!(tool.tool_call_id, "call_2"),
            other => panic!("Expected tool message, got {:?}", other),
        }
    }

    #[test]
    fn test_choice_with_tool_calls_is_tool_use() {
        let call = ChatCompletionMessageToolCall {
            id: "call_9".to_string(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall {
                name: "search_course_content".to_string(),
                arguments: r#"{"query": "agents", "lesson_number": 2}"#.to_string(),
            },
        };

        let response = OpenAiProvider::from_choice(None, Some(vec![call]), Some(FinishReason::ToolCalls));
        assert!(response.wants_tools());
        let invocations = response.into_message().tool_invocations();
        assert_eq!(invocations[0].id, "call_9");
        assert_eq!(invocations[0].input["lesson_number"], 2);
    }

    #[test]
    fn test_choice_with_text_is_terminal() {
        let response =
            OpenAiProvider::from_choice(Some("Answer".to_string()), None, Some(FinishReason::Stop));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.first_text(), Some("Answer"));
    }

    #[test]
    fn test_tool_schemas_become_functions() {
        let tools = OpenAiProvider::to_chat_tools(&[ToolSchema::new("get_course_outline", "Outline")]);
        assert_eq!(tools[0].function.name, "get_course_outline");
        assert_eq!(tools[0].function.parameters.as_ref().unwrap()["type"], "object");
    }
}
