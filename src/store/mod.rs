//! Semantic course store for Syllabus.
//!
//! Provides a trait-based interface over the course catalog and the embedded
//! content chunks the retrieval tools search.

mod memory;
mod sqlite;

pub use memory::MemoryCourseStore;
pub use sqlite::SqliteCourseStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum title similarity for a fuzzy course name to resolve.
pub const MIN_RESOLUTION_SCORE: f32 = 0.2;

/// Number of hits a search returns unless told otherwise.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// A course in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Canonical course title. Unique within a store.
    pub title: String,
    /// Link to the course landing page.
    #[serde(default)]
    pub course_link: Option<String>,
    /// Course instructor.
    #[serde(default)]
    pub instructor: Option<String>,
    /// Lessons, ordered by lesson number.
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Look up a lesson by number.
    pub fn lesson(&self, lesson_number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.lesson_number == lesson_number)
    }
}

/// A single lesson of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub lesson_number: u32,
    pub title: String,
    #[serde(default)]
    pub lesson_link: Option<String>,
}

/// A piece of course content ready to be embedded and indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseChunk {
    /// Unique chunk ID.
    pub id: Uuid,
    /// Title of the course this chunk belongs to.
    pub course_title: String,
    /// Lesson the chunk comes from, if any.
    pub lesson_number: Option<u32>,
    /// Position of this chunk within the course.
    pub chunk_index: u32,
    /// Text content.
    pub content: String,
    /// When this chunk was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl CourseChunk {
    /// Create a new chunk.
    pub fn new(
        course_title: impl Into<String>,
        lesson_number: Option<u32>,
        chunk_index: u32,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_title: course_title.into(),
            lesson_number,
            chunk_index,
            content: content.into(),
            indexed_at: Utc::now(),
        }
    }
}

/// A content search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    /// Free-text query.
    pub query: String,
    /// Fuzzy course name; resolved against the catalog before filtering.
    pub course_name: Option<String>,
    /// Restrict results to one lesson number.
    pub lesson_number: Option<u32>,
    /// Maximum number of hits.
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            course_name: None,
            lesson_number: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_course(mut self, course_name: Option<String>) -> Self {
        self.course_name = course_name;
        self
    }

    pub fn with_lesson(mut self, lesson_number: Option<u32>) -> Self {
        self.lesson_number = lesson_number;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// A matched chunk with its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub content: String,
    pub course_title: String,
    pub lesson_number: Option<u32>,
    /// Cosine distance to the query (lower is closer).
    pub distance: f32,
}

/// Trait for course store implementations.
///
/// `search` fails with [`SyllabusError::CourseResolution`] when a course name
/// filter cannot be resolved; every other error is a backend fault.
///
/// [`SyllabusError::CourseResolution`]: crate::error::SyllabusError::CourseResolution
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Add or replace a course in the catalog.
    async fn add_course(&self, course: &Course) -> Result<()>;

    /// Embed and index content chunks.
    async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<usize>;

    /// Resolve a fuzzy course name to a canonical course title.
    async fn resolve_course_name(&self, name: &str) -> Result<Option<String>>;

    /// Search content chunks.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>>;

    /// Get a course by its canonical title.
    async fn get_course(&self, title: &str) -> Result<Option<Course>>;

    /// Get the link of a lesson, if the lesson exists and has one.
    async fn get_lesson_link(&self, course_title: &str, lesson_number: u32)
        -> Result<Option<String>>;

    /// List all course titles, in catalog order.
    async fn course_titles(&self) -> Result<Vec<String>>;

    /// Remove a course and its chunks. Returns the number of chunks removed.
    async fn delete_course(&self, title: &str) -> Result<usize>;

    /// Get total chunk count.
    async fn chunk_count(&self) -> Result<usize>;

    /// Get the number of courses in the catalog.
    async fn course_count(&self) -> Result<usize> {
        Ok(self.course_titles().await?.len())
    }
}

/// Message used when a course name does not resolve.
pub fn unresolved_course_message(name: &str) -> String {
    format!("No course found matching '{}'", name)
}

/// Pick the catalog title best matching `name`.
///
/// Case-insensitive equality wins, then the shortest title containing `name`,
/// then the closest title embedding above [`MIN_RESOLUTION_SCORE`].
pub fn best_course_match<'a, I>(name: &str, name_embedding: &[f32], catalog: I) -> Option<String>
where
    I: IntoIterator<Item = (&'a str, &'a [f32])>,
{
    let needle = name.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let catalog: Vec<(&str, &[f32])> = catalog.into_iter().collect();

    if let Some((title, _)) = catalog.iter().find(|(t, _)| t.to_lowercase() == needle) {
        return Some(title.to_string());
    }

    if let Some((title, _)) = catalog
        .iter()
        .filter(|(t, _)| t.to_lowercase().contains(&needle))
        .min_by_key(|(t, _)| t.len())
    {
        return Some(title.to_string());
    }

    catalog
        .iter()
        .map(|(t, e)| (*t, cosine_similarity(name_embedding, e)))
        .filter(|(_, score)| *score >= MIN_RESOLUTION_SCORE)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(t, _)| t.to_string())
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Rank candidate chunks by distance to the query embedding and keep the closest `limit`.
pub(crate) fn rank_hits(mut hits: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(limit);
    hits
}
