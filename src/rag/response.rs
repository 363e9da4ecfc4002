//! Question answering over the course catalog.

use super::ConversationAssembler;
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::llm::LlmProvider;
use crate::orchestrator::Orchestrator;
use crate::session::HistoryProvider;
use crate::store::{CourseStore, DEFAULT_SEARCH_LIMIT};
use crate::tools::{Source, ToolRegistry};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answers questions using the orchestrator and the course tools.
pub struct RagSystem {
    store: Arc<dyn CourseStore>,
    sessions: Arc<dyn HistoryProvider>,
    orchestrator: Orchestrator,
    assembler: ConversationAssembler,
    max_results: usize,
}

impl RagSystem {
    pub fn new(
        store: Arc<dyn CourseStore>,
        sessions: Arc<dyn HistoryProvider>,
        orchestrator: Orchestrator,
        prompts: Prompts,
    ) -> Self {
        let assembler = ConversationAssembler::new(prompts, orchestrator.max_rounds());
        Self {
            store,
            sessions,
            orchestrator,
            assembler,
            max_results: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Build from settings with the given collaborators.
    pub fn from_settings(
        settings: &Settings,
        store: Arc<dyn CourseStore>,
        sessions: Arc<dyn HistoryProvider>,
        provider: Arc<dyn LlmProvider>,
        prompts: Prompts,
    ) -> Self {
        let orchestrator = Orchestrator::from_settings(provider, &settings.llm);
        Self::new(store, sessions, orchestrator, prompts).with_max_results(settings.store.max_results)
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn sessions(&self) -> &Arc<dyn HistoryProvider> {
        &self.sessions
    }

    /// Answer a question, optionally in the context of a session.
    #[instrument(skip(self, text))]
    pub async fn query(&self, text: &str, session_id: Option<&str>) -> Result<RagResponse> {
        info!("Processing question: {}", text);

        let history = match session_id {
            Some(id) => self.sessions.history(id)?,
            None => None,
        };

        let system = self.assembler.system_prompt(history.as_deref());
        let messages = self.assembler.initial_messages(&self.assembler.frame_query(text));

        let registry = ToolRegistry::with_course_tools(self.store.clone(), self.max_results);
        let outcome = self.orchestrator.run(&system, messages, &registry).await;

        let sources = registry.collect_sources()?;
        registry.clear_sources()?;
        let outcome = outcome?;

        if let Some(id) = session_id {
            self.sessions.add_exchange(id, text, &outcome.answer)?;
        }

        debug!(
            "Answer ready after {} rounds with {} sources",
            outcome.rounds,
            sources.len()
        );

        Ok(RagResponse {
            answer: outcome.answer,
            sources,
        })
    }

    /// Number of courses and their titles.
    pub async fn course_analytics(&self) -> Result<CourseAnalytics> {
        let course_titles = self.store.course_titles().await?;
        Ok(CourseAnalytics {
            total_courses: course_titles.len(),
            course_titles,
        })
    }
}

/// An answer with the citations that informed it.
#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    pub answer: String,
    pub sources: Vec<Source>,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---");
            for source in &self.sources {
                output.push_str(&format!("\n{}", source.label));
                if let Some(link) = &source.link {
                    output.push_str(&format!("\n  {}", link));
                }
            }
        }

        output
    }
}

/// Catalog summary.
#[derive(Debug, Clone, Serialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}
