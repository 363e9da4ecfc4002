//! In-memory course store implementation.
//!
//! Useful for testing and small catalogs.

use super::{
    best_course_match, cosine_similarity, rank_hits, unresolved_course_message, Course,
    CourseChunk, CourseStore, SearchHit, SearchQuery,
};
use crate::embedding::Embedder;
use crate::error::{Result, SyllabusError};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tracing::debug;

struct CatalogEntry {
    course: Course,
    embedding: Vec<f32>,
}

struct StoredChunk {
    chunk: CourseChunk,
    embedding: Vec<f32>,
}

#[derive(Default)]
struct State {
    catalog: Vec<CatalogEntry>,
    chunks: Vec<StoredChunk>,
}

/// In-memory course store.
pub struct MemoryCourseStore {
    embedder: Arc<dyn Embedder>,
    state: RwLock<State>,
}

impl MemoryCourseStore {
    /// Create a new in-memory course store.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            state: RwLock::new(State::default()),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| SyllabusError::VectorStore("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| SyllabusError::VectorStore("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CourseStore for MemoryCourseStore {
    async fn add_course(&self, course: &Course) -> Result<()> {
        let embedding = self.embedder.embed(&course.title).await?;

        let mut state = self.write()?;
        let entry = CatalogEntry {
            course: course.clone(),
            embedding,
        };
        match state.catalog.iter_mut().find(|e| e.course.title == course.title) {
            Some(existing) => *existing = entry,
            None => state.catalog.push(entry),
        }
        Ok(())
    }

    async fn add_chunks(&self, chunks: &[CourseChunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(SyllabusError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut state = self.write()?;
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            state.chunks.retain(|s| s.chunk.id != chunk.id);
            state.chunks.push(StoredChunk {
                chunk: chunk.clone(),
                embedding,
            });
        }
        Ok(chunks.len())
    }

    async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        let embedding = self.embedder.embed(name).await?;
        let state = self.read()?;
        Ok(best_course_match(
            name,
            &embedding,
            state
                .catalog
                .iter()
                .map(|e| (e.course.title.as_str(), e.embedding.as_slice())),
        ))
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let course_title = match &query.course_name {
            Some(name) => Some(
                self.resolve_course_name(name)
                    .await?
                    .ok_or_else(|| SyllabusError::CourseResolution(unresolved_course_message(name)))?,
            ),
            None => None,
        };

        let query_embedding = self.embedder.embed(&query.query).await?;
        let state = self.read()?;

        let hits: Vec<SearchHit> = state
            .chunks
            .iter()
            .filter(|s| course_title.as_ref().map_or(true, |t| &s.chunk.course_title == t))
            .filter(|s| query.lesson_number.map_or(true, |n| s.chunk.lesson_number == Some(n)))
            .map(|s| SearchHit {
                content: s.chunk.content.clone(),
                course_title: s.chunk.course_title.clone(),
                lesson_number: s.chunk.lesson_number,
                distance: 1.0 - cosine_similarity(&query_embedding, &s.embedding),
            })
            .collect();

        debug!("{} candidate chunks for query", hits.len());
        Ok(rank_hits(hits, query.limit))
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        let state = self.read()?;
        Ok(state
            .catalog
            .iter()
            .find(|e| e.course.title == title)
            .map(|e| e.course.clone()))
    }

    async fn get_lesson_link(
        &self,
        course_title: &str,
        lesson_number: u32,
    ) -> Result<Option<String>> {
        let state = self.read()?;
        Ok(state
            .catalog
            .iter()
            .find(|e| e.course.title == course_title)
            .and_then(|e| e.course.lesson(lesson_number))
            .and_then(|l| l.lesson_link.clone()))
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let state = self.read()?;
        Ok(state.catalog.iter().map(|e| e.course.title.clone()).collect())
    }

    async fn delete_course(&self, title: &str) -> Result<usize> {
        let mut state = self.write()?;
        state.catalog.retain(|e| e.course.title != title);
        let before = state.chunks.len();
        state.chunks.retain(|s| s.chunk.course_title != title);
        Ok(before - state.chunks.len())
    }

    async fn chunk_count(&self) -> Result<usize> {
        Ok(self.read()?.chunks.len())
    }
}
