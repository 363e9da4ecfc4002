//! Syllabus - Course Materials Assistant
//!
//! A CLI tool and library for answering questions about course materials.
//! The model decides when to search course content or look up a course
//! outline, over a bounded number of sequential tool rounds, and answers
//! with citations.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `embedding` - Embedding generation
//! - `store` - Course catalog and content chunks with semantic search
//! - `ingest` - Loading pre-chunked course files into the store
//! - `tools` - Retrieval tools and the per-query tool registry
//! - `llm` - Provider-neutral conversation model and LLM providers
//! - `orchestrator` - Bounded sequential tool-calling loop
//! - `session` - Conversation history per session
//! - `rag` - Question answering entry point
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use syllabus::config::{Prompts, Settings};
//! use syllabus::embedding::OpenAIEmbedder;
//! use syllabus::llm::create_provider;
//! use syllabus::rag::RagSystem;
//! use syllabus::session::SessionManager;
//! use syllabus::store::SqliteCourseStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let embedder = Arc::new(OpenAIEmbedder::new()?);
//!     let store = Arc::new(SqliteCourseStore::new(&settings.sqlite_path(), embedder)?);
//!     let provider = create_provider(&settings.llm)?;
//!     let sessions = Arc::new(SessionManager::new(settings.session.max_history));
//!
//!     let rag = RagSystem::from_settings(&settings, store, sessions, provider, Prompts::default());
//!     let response = rag.query("What is covered in lesson 2 of the MCP course?", None).await?;
//!     println!("{}", response.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod session;
pub mod store;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, SyllabusError};
