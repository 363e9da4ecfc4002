//! Catalog commands: course list and outlines.

use super::open_store;
use crate::cli::Output;
use crate::config::Settings;
use crate::store::unresolved_course_message;
use crate::tools::CourseOutlineTool;
use anyhow::Result;

/// Run the courses command.
pub async fn run_courses(settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;
    let titles = store.course_titles().await?;

    if titles.is_empty() {
        Output::info("No courses indexed yet. Use 'syllabus ingest <path>' to add courses.");
        return Ok(());
    }

    Output::header(&format!("Courses ({})", titles.len()));
    println!();
    for title in &titles {
        if let Some(course) = store.get_course(title).await? {
            Output::course_info(&course.title, course.lessons.len(), course.instructor.as_deref());
        }
    }

    println!();
    Output::kv("Total chunks", &store.chunk_count().await?.to_string());
    Ok(())
}

/// Run the outline command.
pub async fn run_outline(course: &str, settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;

    let resolved = match store.resolve_course_name(course).await? {
        Some(title) => store.get_course(&title).await?,
        None => None,
    };

    match resolved {
        Some(course) => println!("{}", CourseOutlineTool::format_outline(&course)),
        None => Output::warning(&unresolved_course_message(course)),
    }
    Ok(())
}
