//! Semantic search over course content.

use super::{optional_str, optional_u32, required_str, Source, Tool, ToolOutput};
use super::{ParameterKind, ParameterSpec, ToolSchema};
use crate::error::{Result, SyllabusError};
use crate::store::{CourseStore, SearchHit, SearchQuery};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const SEARCH_TOOL_NAME: &str = "search_course_content";

/// Searches course chunks with optional course and lesson filters.
pub struct CourseSearchTool {
    store: Arc<dyn CourseStore>,
    max_results: usize,
}

impl CourseSearchTool {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self {
            store,
            max_results: crate::store::DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    fn no_results_message(course_name: Option<&str>, lesson_number: Option<u32>) -> String {
        let mut message = String::from("No relevant content found");
        if let Some(course) = course_name {
            message.push_str(&format!(" in course '{}'", course));
        }
        if let Some(lesson) = lesson_number {
            message.push_str(&format!(" in lesson {}", lesson));
        }
        message.push('.');
        message
    }

    /// Format hits into result blocks and their citations.
    async fn format_hits(&self, hits: &[SearchHit]) -> Result<(String, Vec<Source>)> {
        let mut blocks = Vec::with_capacity(hits.len());
        let mut sources = Vec::with_capacity(hits.len());

        for hit in hits {
            let (label, link) = match hit.lesson_number {
                Some(lesson) => (
                    format!("{} - Lesson {}", hit.course_title, lesson),
                    self.store.get_lesson_link(&hit.course_title, lesson).await?,
                ),
                None => (hit.course_title.clone(), None),
            };

            blocks.push(format!("[{}]\n{}", label, hit.content));
            sources.push(Source::new(label, link));
        }

        Ok((blocks.join("\n\n"), sources))
    }
}

#[async_trait]
impl Tool for CourseSearchTool {
    fn name(&self) -> &str {
        SEARCH_TOOL_NAME
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            SEARCH_TOOL_NAME,
            "Search course materials with smart course name matching and lesson filtering",
        )
        .with_parameter(
            ParameterSpec::new("query", ParameterKind::String, "What to search for in the course content")
                .required(),
        )
        .with_parameter(ParameterSpec::new(
            "course_name",
            ParameterKind::String,
            "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
        ))
        .with_parameter(ParameterSpec::new(
            "lesson_number",
            ParameterKind::Integer,
            "Specific lesson number to search within (e.g. 1, 2, 3)",
        ))
    }

    #[instrument(skip(self, args))]
    async fn execute(&self, args: &serde_json::Value) -> Result<ToolOutput> {
        let query = required_str(args, "query")?;
        let course_name = optional_str(args, "course_name");
        let lesson_number = optional_u32(args, "lesson_number")?;

        let search = SearchQuery::new(query)
            .with_course(course_name.clone())
            .with_lesson(lesson_number)
            .with_limit(self.max_results);

        let hits = match self.store.search(&search).await {
            Ok(hits) => hits,
            Err(SyllabusError::CourseResolution(message)) => return Ok(ToolOutput::text(message)),
            Err(e) => return Err(e),
        };

        if hits.is_empty() {
            return Ok(ToolOutput::text(Self::no_results_message(
                course_name.as_deref(),
                lesson_number,
            )));
        }

        let (text, sources) = self.format_hits(&hits).await?;
        debug!("Search returned {} hits", sources.len());
        Ok(ToolOutput::text(text).with_sources(sources))
    }
}
