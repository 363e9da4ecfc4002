//! SQLite-based course store implementation.
//!
//! Uses SQLite for the catalog and chunks, with cosine similarity computed in
//! Rust over the candidate rows.

use super::{
    best_course_match, cosine_similarity, rank_hits, unresolved_course_message, Course,
    CourseChunk, CourseStore, Lesson, SearchHit, SearchQuery,
};
use crate::embedding::Embedder;
use crate::error::{Result, SyllabusError};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS courses (
        title TEXT PRIMARY KEY,
        course_link TEXT,
        instructor TEXT,
        lessons_json TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        course_title TEXT NOT NULL,
        lesson_number INTEGER,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title, lesson_number);
"#;

/// SQLite-based course store.
pub struct SqliteCourseStore {
    embedder: Arc<dyn Embedder>,
    conn: Mutex<Connection>,
}

impl SqliteCourseStore {
    /// Open (or create) a SQLite course store.
    #[instrument(skip_all)]
    pub fn new(path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite course store at {:?}", path);

        Ok(Self {
            embedder,
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite course store (useful for testing).
    pub fn in_memory(embedder: Arc<dyn Embedder>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            embedder,
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| SyllabusError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn catalog_embeddings(conn: &Connection) -> Result<Vec<(String, Vec<f32>)>> {
        let mut stmt = conn.prepare("SELECT title, embedding FROM courses ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            let title: String = row.get(0)?;
            let bytes: Vec<u8> = row.get(1)?;
            Ok((title, Self::bytes_to_embedding(&bytes)))
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

#[async_trait]
impl CourseStore for SqliteCourseStore {
    #[instrument(skip(self, course), fields(title = %course.title))]
    async fn add_course(&self, course: &Course) -> Result<()> {
        let embedding = self.embedder.embed(&course.title).await?;
        let lessons_json = serde_json::to_string(&course.lessons)?;

        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO courses (title, course_link, instructor, lessons_json, embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(title) DO UPDATE SET
                course_link = excluded.course_link,
                instructor = excluded.instructor,
                lessons_json = excluded.lessons_json,
                embedding = excluded.embedding,
                indexed_at = excluded.indexed_at
            "#,
            params![
                course.title,
                course.course_link,
                course.instructor,
                lessons_json,
                Self::embedding_to_bytes(&embedding),
                Utc::now().to_rfc3339(),
            ],
        )?;

        debug!("Upserted course with {} lessons", course.lessons.len());
        Ok(())
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
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

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for (chunk, embedding) in chunks.iter().zip(&embeddings) {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                (id, course_title, lesson_number, chunk_index, content, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    chunk.id.to_string(),
                    chunk.course_title,
                    chunk.lesson_number,
                    chunk.chunk_index,
                    chunk.content,
                    Self::embedding_to_bytes(embedding),
                    chunk.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch indexed {} chunks", chunks.len());
        Ok(chunks.len())
    }

    async fn resolve_course_name(&self, name: &str) -> Result<Option<String>> {
        let embedding = self.embedder.embed(name).await?;

        let conn = self.lock()?;
        let catalog = Self::catalog_embeddings(&conn)?;
        Ok(best_course_match(
            name,
            &embedding,
            catalog.iter().map(|(t, e)| (t.as_str(), e.as_slice())),
        ))
    }

    #[instrument(skip(self, query), fields(text = %query.query))]
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

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT course_title, lesson_number, content, embedding
            FROM chunks
            WHERE (?1 IS NULL OR course_title = ?1)
              AND (?2 IS NULL OR lesson_number = ?2)
            "#,
        )?;

        let rows = stmt.query_map(params![course_title, query.lesson_number], |row| {
            let embedding_bytes: Vec<u8> = row.get(3)?;
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<u32>>(1)?,
                row.get::<_, String>(2)?,
                Self::bytes_to_embedding(&embedding_bytes),
            ))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (course_title, lesson_number, content, embedding) = row?;
            hits.push(SearchHit {
                content,
                course_title,
                lesson_number,
                distance: 1.0 - cosine_similarity(&query_embedding, &embedding),
            });
        }

        debug!("Found {} candidate chunks", hits.len());
        Ok(rank_hits(hits, query.limit))
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        let conn = self.lock()?;
        let row = conn.query_row(
            "SELECT title, course_link, instructor, lessons_json FROM courses WHERE title = ?1",
            params![title],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        );

        match row {
            Ok((title, course_link, instructor, lessons_json)) => {
                let lessons: Vec<Lesson> = serde_json::from_str(&lessons_json)?;
                Ok(Some(Course {
                    title,
                    course_link,
                    instructor,
                    lessons,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_lesson_link(
        &self,
        course_title: &str,
        lesson_number: u32,
    ) -> Result<Option<String>> {
        let course = self.get_course(course_title).await?;
        Ok(course
            .as_ref()
            .and_then(|c| c.lesson(lesson_number))
            .and_then(|l| l.lesson_link.clone()))
    }

    async fn course_titles(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT title FROM courses ORDER BY rowid")?;
        let titles = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(titles.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    #[instrument(skip(self))]
    async fn delete_course(&self, title: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM chunks WHERE course_title = ?1", params![title])?;
        conn.execute("DELETE FROM courses WHERE title = ?1", params![title])?;

        info!("Deleted {} chunks for course {}", deleted, title);
        Ok(deleted)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
