//! Pre-flight checks before commands that call remote APIs.
//!
//! Validates that the required API keys are present before starting an
//! operation that would otherwise fail midway.

use crate::config::{LlmProviderKind, Settings};
use crate::error::{Result, SyllabusError};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion embeds every chunk.
    Ingest,
    /// Search embeds the query.
    Search,
    /// Answering needs embeddings and the configured LLM provider.
    Ask,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_api_key("OPENAI_API_KEY", "sk-...")?;

    if let Operation::Ask = operation {
        if settings.llm.provider == LlmProviderKind::Anthropic {
            check_api_key("ANTHROPIC_API_KEY", "sk-ant-...")?;
        }
    }
    Ok(())
}

fn check_api_key(var: &str, example: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(SyllabusError::Config(format!(
            "{} is empty. Set it with: export {}='{}'",
            var, var, example
        ))),
        Err(_) => Err(SyllabusError::Config(format!(
            "{} not set. Set it with: export {}='{}'",
            var, var, example
        ))),
    }
}
