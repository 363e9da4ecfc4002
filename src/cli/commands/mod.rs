//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod courses;
mod ingest;
mod search;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use courses::{run_courses, run_outline};
pub use ingest::run_ingest;
pub use search::run_search;

use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, SyllabusError};
use crate::llm::create_provider;
use crate::rag::RagSystem;
use crate::session::SessionManager;
use crate::store::{CourseStore, MemoryCourseStore, SqliteCourseStore};
use std::sync::Arc;

/// Open the course store configured in settings.
pub(crate) fn open_store(settings: &Settings) -> Result<Arc<dyn CourseStore>> {
    let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);

    match settings.store.provider.as_str() {
        "sqlite" => Ok(Arc::new(SqliteCourseStore::new(&settings.sqlite_path(), embedder)?)),
        "memory" => Ok(Arc::new(MemoryCourseStore::new(embedder))),
        other => Err(SyllabusError::Config(format!("Unknown store provider: {}", other))),
    }
}

/// Build the question-answering system from settings.
pub(crate) fn build_rag(settings: &Settings) -> Result<RagSystem> {
    let store = open_store(settings)?;
    let provider = create_provider(&settings.llm)?;
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let sessions = Arc::new(SessionManager::new(settings.session.max_history));

    Ok(RagSystem::from_settings(settings, store, sessions, provider, prompts))
}
