//! Search command implementation.

use super::open_store;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::SyllabusError;
use crate::store::SearchQuery;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    course: Option<String>,
    lesson: Option<u32>,
    limit: usize,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let store = open_store(&settings)?;
    let search = SearchQuery::new(query)
        .with_course(course)
        .with_lesson(lesson)
        .with_limit(limit);

    let spinner = Output::spinner("Searching...");
    let results = store.search(&search).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) if hits.is_empty() => {
            Output::warning("No results found matching your query.");
        }
        Ok(hits) => {
            Output::success(&format!("Found {} results", hits.len()));
            for hit in &hits {
                let label = match hit.lesson_number {
                    Some(n) => format!("{} - Lesson {}", hit.course_title, n),
                    None => hit.course_title.clone(),
                };
                Output::search_result(&label, hit.distance, &hit.content);
            }
        }
        Err(SyllabusError::CourseResolution(msg)) => {
            Output::warning(&msg);
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
