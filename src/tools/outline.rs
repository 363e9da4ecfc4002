//! Course outline lookup.

use super::{required_str, ParameterKind, ParameterSpec, Tool, ToolOutput, ToolSchema};
use crate::error::Result;
use crate::store::{unresolved_course_message, Course, CourseStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::instrument;

pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

/// Returns a course's title, link, instructor and lesson list.
pub struct CourseOutlineTool {
    store: Arc<dyn CourseStore>,
}

impl CourseOutlineTool {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }

    /// Render a course outline as plain text.
    pub fn format_outline(course: &Course) -> String {
        let mut lines = vec![format!("Course Title: {}", course.title)];
        if let Some(link) = &course.course_link {
            lines.push(format!("Course Link: {}", link));
        }
        if let Some(instructor) = &course.instructor {
            lines.push(format!("Instructor: {}", instructor));
        }

        lines.push(String::new());
        lines.push(format!("Lessons ({} total):", course.lessons.len()));
        lines.extend(
            course
                .lessons
                .iter()
                .map(|l| format!("Lesson {}: {}", l.lesson_number, l.title)),
        );

        lines.join("\n")
    }
}

#[async_trait]
impl Tool for CourseOutlineTool {
    fn name(&self) -> &str {
        OUTLINE_TOOL_NAME
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(
            OUTLINE_TOOL_NAME,
            "Get a course outline: title, link, instructor and the complete lesson list",
        )
        .with_parameter(
            ParameterSpec::new(
                "course_name",
                ParameterKind::String,
                "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
            )
            .required(),
        )
    }

    #[instrument(skip(self, args))]
    async fn execute(&self, args: &serde_json::Value) -> Result<ToolOutput> {
        let course_name = required_str(args, "course_name")?;

        let course = match self.store.resolve_course_name(course_name).await? {
            Some(title) => self.store.get_course(&title).await?,
            None => None,
        };

        Ok(ToolOutput::text(match course {
            Some(course) => Self::format_outline(&course),
            None => unresolved_course_message(course_name),
        }))
    }
}
