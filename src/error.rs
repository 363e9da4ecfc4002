//! Error types for Syllabus.

use thiserror::Error;

/// Library-level error type for Syllabus operations.
#[derive(Error, Debug)]
pub enum SyllabusError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// A course name could not be resolved to a known course.
    ///
    /// Retrieval tools relay the message to the model as plain result text.
    #[error("{0}")]
    CourseResolution(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Ingestion error: {0}")]
    Ingest(String),

    #[error("RAG error: {0}")]
    Rag(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("LLM provider error: {0}")]
    Provider(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),
}

/// Result type alias for Syllabus operations.
pub type Result<T> = std::result::Result<T, SyllabusError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_resolution_message_is_verbatim() {
        let err = SyllabusError::CourseResolution("No course found matching 'Rust'".to_string());
        assert_eq!(err.to_string(), "No course found matching 'Rust'");
    }

    #[test]
    fn test_tool_not_found_display() {
        let err = SyllabusError::ToolNotFound("make_coffee".to_string());
        assert_eq!(err.to_string(), "Tool not found: make_coffee");
    }
}
