//! Prompt templates for Syllabus.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub assistant: AssistantPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the course assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantPrompts {
    /// Behavioral policy sent as system instructions.
    ///
    /// `{{max_tool_rounds}}` is substituted when the conversation is assembled.
    pub system: String,
    /// Framing applied to the raw user question. Uses `{{query}}`.
    pub query: String,
}

impl Default for AssistantPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an AI assistant specialized in course materials and educational content with access to tools for course information.

Available Tools:
1. search_course_content: Search for specific course content and detailed educational materials
2. get_course_outline: Retrieve a course outline with the course title, course link, and every lesson with its number and title

Tool Usage Guidelines:
- Use search_course_content for questions about specific course content or detailed educational materials
- Use get_course_outline for questions about course structure, lesson lists, course overviews, or tables of contents
- You may make up to {{max_tool_rounds}} sequential tool calls when earlier results show more information is needed
- Make a follow-up call when an initial search returns partial information, when several courses or lessons must be checked, or when the first result calls for different search parameters
- Synthesize all tool results into accurate, fact-based responses
- If tools yield no results, state this clearly without offering alternatives

Response Protocol:
- General knowledge questions: answer from existing knowledge without using tools
- Course content questions: use search_course_content, then answer
- Course outline questions: use get_course_outline, then give the course title, course link, and the formatted lesson list
- No meta-commentary: give the answer only, without describing the tools or searches you used

All responses must be:
1. Brief, concise and focused
2. Educational, keeping instructional value
3. Clear, using accessible language
4. Example-supported when examples aid understanding
Provide only the direct answer to what was asked."#
                .to_string(),

            query: "Answer this question about course materials: {{query}}".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let assistant_path = custom_path.join("assistant.toml");
            if assistant_path.exists() {
                let content = std::fs::read_to_string(&assistant_path)?;
                prompts.assistant = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Frame a raw user question for the assistant.
    pub fn frame_query(&self, query: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), query.to_string());
        self.render_with_custom(&self.assistant.query, &vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.assistant.system.contains("search_course_content"));
        assert!(prompts.assistant.system.contains("get_course_outline"));
        assert!(prompts.assistant.system.contains("{{max_tool_rounds}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_frame_query() {
        let prompts = Prompts::default();
        assert_eq!(
            prompts.frame_query("Test query"),
            "Answer this question about course materials: Test query"
        );
    }

    #[test]
    fn test_custom_assistant_prompts_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("assistant.toml"),
            "system = \"Be terse about {{topic}}.\"\nquery = \"Q: {{query}}\"\n",
        )
        .unwrap();

        let mut vars = HashMap::new();
        vars.insert("topic".to_string(), "Rust".to_string());
        let prompts = Prompts::load(dir.path().to_str(), Some(&vars)).unwrap();

        assert_eq!(prompts.frame_query("why?"), "Q: why?");
        assert_eq!(
            prompts.render_with_custom(&prompts.assistant.system, &HashMap::new()),
            "Be terse about Rust."
        );
    }
}
