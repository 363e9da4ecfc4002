//! Retrieval tools the model can call while answering.
//!
//! Each tool exposes a [`ToolSchema`] to the provider and runs against the
//! course store. A tool hands back its [`Source`] citations with its output;
//! the caller records them in the owning [`ToolRegistry`]'s [`SourcePool`].

mod outline;
mod registry;
mod schema;
mod search;

pub use outline::CourseOutlineTool;
pub use registry::ToolRegistry;
pub use schema::{ParameterKind, ParameterSpec, ToolSchema};
pub use search::CourseSearchTool;

use crate::error::{Result, SyllabusError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// A tool the orchestrator can dispatch by name.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name, as the model refers to it.
    fn name(&self) -> &str;

    /// Schema presented to the model.
    fn schema(&self) -> ToolSchema;

    /// Run the tool with the model-supplied arguments.
    async fn execute(&self, args: &serde_json::Value) -> Result<ToolOutput>;
}

/// Text returned to the model, with any citations behind it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub content: String,
    pub sources: Vec<Source>,
}

impl ToolOutput {
    /// Output with no citations.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sources: Vec::new(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }
}

/// A citation for content that informed an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    /// Display label, e.g. `Course Title - Lesson 2`.
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Source {
    pub fn new(label: impl Into<String>, link: Option<String>) -> Self {
        Self {
            label: label.into(),
            link,
        }
    }
}

/// Citations accumulated during one query.
#[derive(Debug, Clone, Default)]
pub struct SourcePool {
    inner: Arc<Mutex<Vec<Source>>>,
}

impl SourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a whole batch of citations at once.
    pub fn extend(&self, sources: Vec<Source>) -> Result<()> {
        self.lock()?.extend(sources);
        Ok(())
    }

    /// Copy of the current citations.
    pub fn snapshot(&self) -> Result<Vec<Source>> {
        Ok(self.lock()?.clone())
    }

    pub fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Source>>> {
        self.inner
            .lock()
            .map_err(|_| SyllabusError::Rag("source pool lock poisoned".to_string()))
    }
}

/// Read a required string argument.
pub(crate) fn required_str<'a>(args: &'a serde_json::Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| SyllabusError::InvalidInput(format!("missing string argument '{}'", key)))
}

/// Read an optional non-empty string argument.
pub(crate) fn optional_str(args: &serde_json::Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Read an optional lesson number. Models sometimes send numbers as strings.
pub(crate) fn optional_u32(args: &serde_json::Value, key: &str) -> Result<Option<u32>> {
    match args.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| SyllabusError::InvalidInput(format!("'{}' must be a positive integer", key))),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| SyllabusError::InvalidInput(format!("'{}' must be a positive integer", key))),
        Some(_) => Err(SyllabusError::InvalidInput(format!(
            "'{}' must be a positive integer",
            key
        ))),
    }
}
