//! Configuration module for Syllabus.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AssistantPrompts, Prompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, LlmProviderKind, LlmSettings, PromptSettings,
    SessionSettings, Settings, StoreSettings,
};
