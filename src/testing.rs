//! Shared fakes and fixtures for unit tests.

use crate::embedding::Embedder;
use crate::error::{Result, SyllabusError};
use crate::llm::{ContentBlock, LlmProvider, LlmRequest, LlmResponse, StopReason};
use crate::store::{Course, CourseChunk, CourseStore, Lesson, MemoryCourseStore, SearchHit, SearchQuery};
use crate::tools::{Tool, ToolOutput, ToolSchema};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SAMPLE_TITLE: &str = "MCP: Build Rich-Context AI Apps with Anthropic";

/// Bag-of-words embedder: each lowercase alphanumeric word adds one to a hashed bucket.
pub struct KeywordEmbedder {
    dimensions: usize,
}

impl Default for KeywordEmbedder {
    fn default() -> Self {
        Self { dimensions: 512 }
    }
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hash: u32 = 0x811c9dc5;
            for byte in word.bytes() {
                hash ^= byte as u32;
                hash = hash.wrapping_mul(0x01000193);
            }
            vector[hash as usize % self.dimensions] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

pub fn sample_course() -> Course {
    let lesson = |n: u32, title: &str| Lesson {
        lesson_number: n,
        title: title.to_string(),
        lesson_link: Some(format!("https://example.com/lesson{}", n)),
    };

    Course {
        title: SAMPLE_TITLE.to_string(),
        course_link: Some("https://www.deeplearning.ai/short-courses/mcp/".to_string()),
        instructor: Some("Alex Reibman".to_string()),
        lessons: vec![
            lesson(0, "Introduction"),
            lesson(1, "Why MCP"),
            lesson(2, "MCP Architecture"),
            lesson(3, "MCP Primitives"),
        ],
    }
}

pub fn sample_chunks() -> Vec<CourseChunk> {
    vec![
        CourseChunk::new(
            SAMPLE_TITLE,
            Some(1),
            0,
            "MCP is Model Context Protocol, a standard for connecting AI assistants to data sources.",
        ),
        CourseChunk::new(
            SAMPLE_TITLE,
            Some(2),
            1,
            "MCP uses a client-server architecture: hosts run clients that talk to servers over the protocol.",
        ),
        CourseChunk::new(
            SAMPLE_TITLE,
            Some(3),
            2,
            "MCP supports tools, prompts, and resources as first-class primitives.",
        ),
    ]
}

/// Memory store holding the sample course and its chunks.
pub async fn seeded_memory_store() -> MemoryCourseStore {
    let store = MemoryCourseStore::new(Arc::new(KeywordEmbedder::new()));
    store.add_course(&sample_course()).await.unwrap();
    store.add_chunks(&sample_chunks()).await.unwrap();
    store
}

/// Store returning canned hits and recording every search.
pub struct StubStore {
    hits: Vec<SearchHit>,
    courses: Vec<Course>,
    fail: bool,
    queries: Mutex<Vec<SearchQuery>>,
}

impl StubStore {
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            hits,
            courses: Vec::new(),
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_hits(Vec::new())
        }
    }

    pub fn with_course(mut self, course: Course) -> Self {
        self.courses.push(course);
        self
    }

    pub fn queries(&self) -> Vec<SearchQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl CourseStore for StubStore {
    async fn add_course(&self, _course: &Course) -> Result<()> {
        Ok(())
    }

    async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<usize> {
        Ok(chunks.len())
    }

    async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .courses
            .iter()
            .find(|c| c.title.to_lowercase().contains(&name.to_lowercase()))
            .map(|c| c.title.clone()))
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(SyllabusError::VectorStore("connection refused".to_string()));
        }
        Ok(self.hits.clone())
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        Ok(self.courses.iter().find(|c| c.title == title).cloned())
    }

    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        Ok(self
            .courses
            .iter()
            .find(|c| c.title == course_title)
            .and_then(|c| c.lesson(lesson_number))
            .and_then(|l| l.lesson_link.clone()))
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        Ok(self.courses.iter().map(|c| c.title.clone()).collect())
    }

    async fn delete_course(&self, _title: &str) -> Result<usize> {
        Ok(0)
    }

    async fn chunk_count(&self) -> Result<usize> {
        Ok(self.hits.len())
    }
}

/// Store that delays searches per lesson filter before delegating.
pub struct DelayedStore {
    inner: Arc<dyn CourseStore>,
    delays: HashMap<u32, Duration>,
}

impl DelayedStore {
    pub fn new(inner: Arc<dyn CourseStore>) -> Self {
        Self {
            inner,
            delays: HashMap::new(),
        }
    }

    pub fn with_lesson_delay(mut self, lesson_number: u32, millis: u64) -> Self {
        self.delays.insert(lesson_number, Duration::from_millis(millis));
        self
    }
}

#[async_trait]
impl CourseStore for DelayedStore {
    async fn add_course(&self, course: &Course) -> Result<()> {
        self.inner.add_course(course).await
    }

    async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<usize> {
        self.inner.add_chunks(chunks).await
    }

    async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        self.inner.resolve_course_name(name).await
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        if let Some(delay) = query.lesson_number.and_then(|n| self.delays.get(&n)) {
            tokio::time::sleep(*delay).await;
        }
        self.inner.search(query).await
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        self.inner.get_course(title).await
    }

    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32) -> Result<Option<String>> {
        self.inner.get_lesson_link(course_title, lesson_number).await
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        self.inner.course_titles().await
    }

    async fn delete_course(&self, title: &str) -> Result<usize> {
        self.inner.delete_course(title).await
    }

    async fn chunk_count(&self) -> Result<usize> {
        self.inner.chunk_count().await
    }
}

/// Provider replaying scripted responses and recording each request.
///
/// Once the script runs out every call fails with a provider error.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<LlmResponse>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SyllabusError::Provider("Rate limit exceeded".to_string()))
    }
}

/// A tool-use response with the given `(id, name, input)` invocations.
pub fn tool_use_response(invocations: &[(&str, &str, serde_json::Value)]) -> LlmResponse {
    LlmResponse {
        stop_reason: StopReason::ToolUse,
        content: invocations
            .iter()
            .map(|(id, name, input)| ContentBlock::tool_use(*id, *name, input.clone()))
            .collect(),
    }
}

/// Tool that always returns a fixed output.
pub struct EchoTool {
    name: String,
    output: String,
}

impl EchoTool {
    pub fn new(name: &str, output: &str) -> Self {
        Self {
            name: name.to_string(),
            output: output.to_string(),
        }
    }
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(self.name.clone(), "Returns a fixed output")
    }

    async fn execute(&self, _args: &serde_json::Value) -> Result<ToolOutput> {
        Ok(ToolOutput::text(self.output.clone()))
    }
}

/// Tool that always fails.
pub struct FailingTool {
    name: String,
}

impl FailingTool {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(self.name.clone(), "Always fails")
    }

    async fn execute(&self, _args: &serde_json::Value) -> Result<ToolOutput> {
        Err(SyllabusError::VectorStore("index unavailable".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_keyword_embedder_default_matches_new() {
        let embedder = KeywordEmbedder::default();
        assert_eq!(embedder.dimensions(), KeywordEmbedder::new().dimensions());

        let a = embedder.embed("Client server").await.unwrap();
        let b = embedder.embed("client-server").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.iter().sum::<f32>(), 2.0);
    }
}
