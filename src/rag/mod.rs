//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! The model retrieves course content itself through tools; this module
//! assembles the conversation and wires sessions, store and orchestrator.

pub mod context;
mod response;

pub use context::ConversationAssembler;
pub use response::{CourseAnalytics, RagResponse, RagSystem};
