//! Name-indexed tool registry with a per-registry citation pool.

use super::{CourseOutlineTool, CourseSearchTool, Source, SourcePool, Tool, ToolOutput, ToolSchema};
use crate::error::{Result, SyllabusError};
use crate::store::CourseStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of tools available to the model during one query.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    sources: SourcePool,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the course search and outline tools.
    pub fn with_course_tools(store: Arc<dyn CourseStore>, max_results: usize) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CourseSearchTool::new(store.clone()).with_max_results(max_results)));
        registry.register(Arc::new(CourseOutlineTool::new(store)));
        registry
    }

    /// Register a tool under its name, replacing any earlier tool of that name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_some() {
            debug!("Replaced tool: {}", name);
        }
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Schemas of all registered tools, sorted by name.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Run the named tool. Its citations are returned, not recorded.
    pub async fn dispatch(&self, name: &str, args: &serde_json::Value) -> Result<ToolOutput> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| SyllabusError::ToolNotFound(name.to_string()))?;
        tool.execute(args).await
    }

    /// Append one tool call's citations to the pool.
    pub fn record_sources(&self, sources: Vec<Source>) -> Result<()> {
        if sources.is_empty() {
            return Ok(());
        }
        self.sources.extend(sources)
    }

    /// Citations recorded since the last clear.
    pub fn collect_sources(&self) -> Result<Vec<Source>> {
        self.sources.snapshot()
    }

    pub fn clear_sources(&self) -> Result<()> {
        self.sources.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seeded_memory_store, EchoTool, FailingTool};
    use serde_json::json;

    #[tokio::test]
    async fn test_last_registration_wins() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::new("echo", "first")));
        registry.register(Arc::new(EchoTool::new("echo", "second")));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.dispatch("echo", &json!({})).await.unwrap().content, "second");
    }

    #[tokio::test]
    async fn test_unknown_tool_and_tool_errors() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FailingTool::new("broken")));

        match registry.dispatch("make_coffee", &json!({})).await {
            Err(SyllabusError::ToolNotFound(name)) => assert_eq!(name, "make_coffee"),
            other => panic!("Expected ToolNotFound, got {:?}", other),
        }
        assert!(registry.dispatch("broken", &json!({})).await.is_err());
    }

    #[tokio::test]
    async fn test_schemas_sorted_by_name() {
        let registry = ToolRegistry::with_course_tools(Arc::new(seeded_memory_store().await), 5);

        let names: Vec<String> = registry.schemas().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["get_course_outline", "search_course_content"]);
    }

    #[tokio::test]
    async fn test_collect_before_clear() {
        let registry = ToolRegistry::with_course_tools(Arc::new(seeded_memory_store().await), 5);

        let output = registry
            .dispatch("search_course_content", &json!({"query": "MCP"}))
            .await
            .unwrap();
        registry.record_sources(output.sources).unwrap();

        let collected = registry.collect_sources().unwrap();
        assert!(!collected.is_empty());
        registry.clear_sources().unwrap();
        assert!(registry.collect_sources().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_before_collect_loses_sources() {
        let registry = ToolRegistry::with_course_tools(Arc::new(seeded_memory_store().await), 5);

        let output = registry
            .dispatch("search_course_content", &json!({"query": "MCP"}))
            .await
            .unwrap();
        registry.record_sources(output.sources).unwrap();

        registry.clear_sources().unwrap();
        assert!(registry.collect_sources().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outline_does_not_record_sources() {
        let registry = ToolRegistry::with_course_tools(Arc::new(seeded_memory_store().await), 5);

        let output = registry
            .dispatch("get_course_outline", &json!({"course_name": "MCP"}))
            .await
            .unwrap();
        registry.record_sources(output.sources).unwrap();

        assert!(registry.collect_sources().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_leaves_pool_untouched() {
        let registry = ToolRegistry::with_course_tools(Arc::new(seeded_memory_store().await), 5);

        let output = registry
            .dispatch("search_course_content", &json!({"query": "MCP"}))
            .await
            .unwrap();

        assert!(!output.sources.is_empty());
        assert!(registry.collect_sources().unwrap().is_empty());
    }
}
