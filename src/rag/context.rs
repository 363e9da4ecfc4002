//! Conversation assembly for course questions.

use crate::config::Prompts;
use crate::llm::Message;
use std::collections::HashMap;

/// Heading that introduces prior exchanges in the system instructions.
pub const HISTORY_HEADING: &str = "Previous conversation:";

/// Builds the system instructions and opening turn for a query.
#[derive(Debug, Clone)]
pub struct ConversationAssembler {
    prompts: Prompts,
    max_tool_rounds: u32,
}

impl ConversationAssembler {
    pub fn new(prompts: Prompts, max_tool_rounds: u32) -> Self {
        Self {
            prompts,
            max_tool_rounds,
        }
    }

    /// System instructions, with prior exchanges appended when present.
    pub fn system_prompt(&self, history: Option<&str>) -> String {
        let mut vars = HashMap::new();
        vars.insert("max_tool_rounds".to_string(), self.max_tool_rounds.to_string());
        let policy = self.prompts.render_with_custom(&self.prompts.assistant.system, &vars);

        match history.filter(|h| !h.trim().is_empty()) {
            Some(history) => format!("{}\n\n{}\n{}", policy, HISTORY_HEADING, history),
            None => policy,
        }
    }

    /// The opening conversation: one user turn carrying the query.
    pub fn initial_messages(&self, query: &str) -> Vec<Message> {
        vec![Message::user(query)]
    }

    /// Apply the configured question framing.
    pub fn frame_query(&self, query: &str) -> String {
        self.prompts.frame_query(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ContentBlock, Role};

    #[test]
    fn test_system_prompt_without_history() {
        let assembler = ConversationAssembler::new(Prompts::default(), 2);
        let system = assembler.system_prompt(None);

        assert!(system.contains("up to 2 sequential tool calls"));
        assert!(system.contains("search_course_content"));
        assert!(system.contains("get_course_outline"));
        assert!(!system.contains(HISTORY_HEADING));
        assert!(!system.contains("{{"));
    }

    #[test]
    fn test_history_goes_under_heading() {
        let assembler = ConversationAssembler::new(Prompts::default(), 3);
        let history = "User: What is MCP?\nAssistant: A protocol.";

        let system = assembler.system_prompt(Some(history));

        assert!(system.contains("up to 3 sequential tool calls"));
        assert!(system.ends_with(&format!("\n\nPrevious conversation:\n{}", history)));
        assert_eq!(assembler.system_prompt(Some("  ")), assembler.system_prompt(None));
    }

    #[test]
    fn test_initial_messages() {
        let assembler = ConversationAssembler::new(Prompts::default(), 2);
        let framed = assembler.frame_query("What is MCP?");
        assert_eq!(framed, "Answer this question about course materials: What is MCP?");

        let messages = assembler.initial_messages(&framed);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, vec![ContentBlock::text(framed)]);
    }
}
