//! Course ingestion from pre-chunked JSON files.
//!
//! A course file carries the catalog entry and its content already split into
//! chunks:
//!
//! ```json
//! {
//!   "title": "Prompt Compression",
//!   "course_link": "https://example.com/course",
//!   "instructor": "Jane Doe",
//!   "chunks": ["Course-level overview..."],
//!   "lessons": [
//!     {"lesson_number": 1, "title": "Intro", "lesson_link": "https://example.com/1",
//!      "chunks": ["First chunk...", "Second chunk..."]}
//!   ]
//! }
//! ```

use crate::error::{Result, SyllabusError};
use crate::store::{Course, CourseChunk, CourseStore, Lesson};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A course file as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseFile {
    pub title: String,
    #[serde(default)]
    pub course_link: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    /// Chunks not tied to a lesson.
    #[serde(default)]
    pub chunks: Vec<String>,
    #[serde(default)]
    pub lessons: Vec<LessonFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonFile {
    pub lesson_number: u32,
    pub title: String,
    #[serde(default)]
    pub lesson_link: Option<String>,
    #[serde(default)]
    pub chunks: Vec<String>,
}

impl CourseFile {
    /// Read and validate a course file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: CourseFile = serde_json::from_str(&content)
            .map_err(|e| SyllabusError::Ingest(format!("{}: {}", path.display(), e)))?;

        if file.title.trim().is_empty() {
            return Err(SyllabusError::Ingest(format!("{}: course title is empty", path.display())));
        }
        Ok(file)
    }

    /// Split into the catalog entry and numbered content chunks.
    pub fn into_parts(self) -> (Course, Vec<CourseChunk>) {
        let mut chunks = Vec::new();
        let mut index = 0u32;

        let mut push = |lesson: Option<u32>, content: String| {
            if !content.trim().is_empty() {
                chunks.push(CourseChunk::new(self.title.clone(), lesson, index, content));
                index += 1;
            }
        };

        for content in self.chunks {
            push(None, content);
        }
        let mut lessons = Vec::with_capacity(self.lessons.len());
        for lesson in self.lessons {
            for content in lesson.chunks {
                push(Some(lesson.lesson_number), content);
            }
            lessons.push(Lesson {
                lesson_number: lesson.lesson_number,
                title: lesson.title,
                lesson_link: lesson.lesson_link,
            });
        }

        let course = Course {
            title: self.title,
            course_link: self.course_link,
            instructor: self.instructor,
            lessons,
        };
        (course, chunks)
    }
}

/// Outcome of ingesting one course file.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub course_title: String,
    pub chunks_indexed: usize,
    /// The course was already indexed and left untouched.
    pub skipped: bool,
}

/// Loads course files into a store.
pub struct Ingestor {
    store: Arc<dyn CourseStore>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }

    /// Ingest one course file. Existing courses are skipped unless `force` is set.
    #[instrument(skip(self))]
    pub async fn ingest_file(&self, path: &Path, force: bool) -> Result<IngestReport> {
        let (course, chunks) = CourseFile::load(path)?.into_parts();

        if self.store.get_course(&course.title).await?.is_some() {
            if !force {
                info!("Course already indexed: {}", course.title);
                return Ok(IngestReport {
                    course_title: course.title,
                    chunks_indexed: 0,
                    skipped: true,
                });
            }
            let removed = self.store.delete_course(&course.title).await?;
            debug!("Removed {} existing chunks for {}", removed, course.title);
        }

        self.store.add_course(&course).await?;
        let chunks_indexed = self.store.add_chunks(&chunks).await?;
        info!("Indexed {} chunks for {}", chunks_indexed, course.title);

        Ok(IngestReport {
            course_title: course.title,
            chunks_indexed,
            skipped: false,
        })
    }

    /// Ingest a file, or every `.json` file in a directory in name order.
    pub async fn ingest_path(&self, path: &Path, force: bool) -> Result<Vec<IngestReport>> {
        if path.is_file() {
            return Ok(vec![self.ingest_file(path, force).await?]);
        }
        if !path.is_dir() {
            return Err(SyllabusError::Ingest(format!("{} does not exist", path.display())));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        if files.is_empty() {
            warn!("No course files found in {}", path.display());
        }

        let mut reports = Vec::with_capacity(files.len());
        for file in files {
            reports.push(self.ingest_file(&file, force).await?);
        }
        Ok(reports)
    }
}
