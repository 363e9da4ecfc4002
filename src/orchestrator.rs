//! Bounded sequential tool-calling loop.
//!
//! The orchestrator drives a provider through at most `max_rounds` rounds of
//! tool use. Every tool-use response starts a round: its invocations are
//! dispatched through the [`ToolRegistry`] and answered with one user turn of
//! results. Tools stay on offer while rounds remain; the call after the last
//! permitted round is made without tools, which forces a text answer.

use crate::config::LlmSettings;
use crate::error::Result;
use crate::llm::{
    ContentBlock, LlmProvider, LlmRequest, LlmResponse, Message, ToolChoice, ToolInvocation,
};
use crate::tools::{ToolRegistry, ToolSchema};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Answer used when the final response carries no text.
pub const FALLBACK_ANSWER: &str = "Unable to generate response.";

/// Prefix of the result text for a failed tool invocation.
pub const TOOL_ERROR_PREFIX: &str = "Error executing tool: ";

/// Result of one orchestrated run.
#[derive(Debug, Clone)]
pub struct OrchestratorOutcome {
    /// Final answer text.
    pub answer: String,
    /// Number of tool rounds executed.
    pub rounds: u32,
    /// Number of provider calls made.
    pub provider_calls: usize,
    /// Conversation as sent on the last provider call.
    pub conversation: Vec<Message>,
}

enum State {
    Initial,
    AwaitingTools {
        round: u32,
        invocations: Vec<ToolInvocation>,
    },
    Done(LlmResponse),
}

/// Runs a query through the provider with bounded tool use.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    max_rounds: u32,
}

impl Orchestrator {
    /// Create an orchestrator with default sampling and two tool rounds.
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: 800,
            max_rounds: 2,
        }
    }

    pub fn from_settings(provider: Arc<dyn LlmProvider>, settings: &LlmSettings) -> Self {
        Self::new(provider, settings.model.clone())
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens)
            .with_max_rounds(settings.max_tool_rounds)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the maximum number of tool rounds. Zero disables tools.
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Run the conversation to a final answer.
    ///
    /// Tool failures are reported back to the model as error results; only
    /// provider failures abort the run.
    #[instrument(skip_all, fields(provider = self.provider.name(), max_rounds = self.max_rounds))]
    pub async fn run(
        &self,
        system: &str,
        messages: Vec<Message>,
        registry: &ToolRegistry,
    ) -> Result<OrchestratorOutcome> {
        let schemas = registry.schemas();
        let mut conversation = messages;
        let mut provider_calls = 0;
        let mut rounds = 0;
        let mut state = State::Initial;

        loop {
            state = match state {
                State::Initial => {
                    let offer = self.max_rounds > 0;
                    let response = self
                        .call(system, &conversation, offer.then_some(&schemas), &mut provider_calls)
                        .await?;
                    self.advance(response, 0, &mut conversation)
                }
                State::AwaitingTools { round, invocations } => {
                    rounds = round;
                    debug!("Tool round {} with {} invocations", round, invocations.len());

                    let results = self.execute_round(&invocations, registry).await?;
                    conversation.push(Message::tool_results(results));

                    let offer = round < self.max_rounds;
                    let response = self
                        .call(system, &conversation, offer.then_some(&schemas), &mut provider_calls)
                        .await?;
                    self.advance(response, round, &mut conversation)
                }
                State::Done(response) => {
                    let answer = response
                        .first_text()
                        .map(String::from)
                        .unwrap_or_else(|| FALLBACK_ANSWER.to_string());

                    info!("Answered after {} rounds and {} provider calls", rounds, provider_calls);
                    return Ok(OrchestratorOutcome {
                        answer,
                        rounds,
                        provider_calls,
                        conversation,
                    });
                }
            };
        }
    }

    /// Decide the next state after a response, given the rounds completed so far.
    fn advance(&self, response: LlmResponse, completed: u32, conversation: &mut Vec<Message>) -> State {
        if !response.wants_tools() || completed >= self.max_rounds {
            return State::Done(response);
        }

        let message = response.clone().into_message();
        let invocations = message.tool_invocations();
        if invocations.is_empty() {
            warn!("Tool use requested without any tool invocations");
            return State::Done(response);
        }

        conversation.push(message);
        State::AwaitingTools {
            round: completed + 1,
            invocations,
        }
    }

    async fn call(
        &self,
        system: &str,
        conversation: &[Message],
        tools: Option<&Vec<ToolSchema>>,
        provider_calls: &mut usize,
    ) -> Result<LlmResponse> {
        let tools = tools.filter(|t| !t.is_empty()).cloned();
        let request = LlmRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            system: system.to_string(),
            messages: conversation.to_vec(),
            tool_choice: tools.as_ref().map(|_| ToolChoice::Auto),
            tools,
        };

        *provider_calls += 1;
        self.provider.complete(&request).await
    }

    /// Dispatch all invocations concurrently.
    ///
    /// Results and citations are both recorded in invocation order, whatever
    /// order the calls finish in.
    async fn execute_round(
        &self,
        invocations: &[ToolInvocation],
        registry: &ToolRegistry,
    ) -> Result<Vec<ContentBlock>> {
        let pending = invocations
            .iter()
            .map(|invocation| registry.dispatch(&invocation.name, &invocation.input));
        let outputs = join_all(pending).await;

        let mut results = Vec::with_capacity(outputs.len());
        for (invocation, output) in invocations.iter().zip(outputs) {
            match output {
                Ok(output) => {
                    registry.record_sources(output.sources)?;
                    results.push(ContentBlock::tool_result(&invocation.id, output.content, false));
                }
                Err(e) => {
                    warn!("Tool {} failed: {}", invocation.name, e);
                    results.push(ContentBlock::tool_result(
                        &invocation.id,
                        format!("{}{}", TOOL_ERROR_PREFIX, e),
                        true,
                    ));
                }
            }
        }

        Ok(results)
    }
}
