//! # Persistence Collaborators
//!
//! The editor core never talks to a backend directly. It loads and saves
//! lessons through a [`LessonStore`] and asks a [`LessonNavigator`] for the
//! course outline when switching lessons.
//!
//! Two stores ship with the crate:
//! - [`MemoryStore`]: in-process maps, for tests and demos
//! - [`FileStore`]: one JSON file per lesson on disk
//!
//! ```text
//! <root>/
//!   lessons/<lesson-id>.json   { "blocks": [{ "id", "type", "data" }, ...] }
//!   courses/<course-id>.json   { "courseId", "title", "modules": [...] }
//! ```

use crate::block::Block;
use crate::document::DocumentSnapshot;
use crate::ids::{CourseId, LessonId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Lesson not found: {0}")]
    NotFound(LessonId),

    #[error("Course not found: {0}")]
    CourseNotFound(CourseId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Save rejected: {0}")]
    Rejected(String),
}

/// Persisted shape of a lesson
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub blocks: Vec<Block>,
}

impl From<&DocumentSnapshot> for StoredDocument {
    fn from(snapshot: &DocumentSnapshot) -> Self {
        Self {
            blocks: snapshot.blocks.clone(),
        }
    }
}

/// Load/save boundary for lesson content
#[async_trait]
pub trait LessonStore: Send + Sync {
    /// Load a lesson; `NotFound` when nothing was ever saved
    async fn load_document(&self, lesson_id: &LessonId) -> Result<StoredDocument, PersistenceError>;

    async fn save_document(
        &self,
        lesson_id: &LessonId,
        document: &StoredDocument,
    ) -> Result<(), PersistenceError>;
}

/// Supplies the lesson list used to switch documents
#[async_trait]
pub trait LessonNavigator: Send + Sync {
    async fn course_outline(&self, course_id: &CourseId) -> Result<CourseOutline, PersistenceError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummary {
    pub id: LessonId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleOutline {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<LessonSummary>,
}

/// Modules of a course with their ordered lessons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseOutline {
    pub course_id: CourseId,
    pub title: String,
    #[serde(default)]
    pub modules: Vec<ModuleOutline>,
}

impl CourseOutline {
    /// Lessons in reading order, across module boundaries
    pub fn lessons(&self) -> impl Iterator<Item = &LessonSummary> {
        self.modules.iter().flat_map(|m| m.lessons.iter())
    }

    pub fn next_lesson(&self, current: &LessonId) -> Option<&LessonSummary> {
        let mut lessons = self.lessons();
        lessons.find(|l| &l.id == current)?;
        lessons.next()
    }

    pub fn previous_lesson(&self, current: &LessonId) -> Option<&LessonSummary> {
        let mut previous = None;
        for lesson in self.lessons() {
            if &lesson.id == current {
                return previous;
            }
            previous = Some(lesson);
        }
        None
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    lessons: RwLock<HashMap<LessonId, StoredDocument>>,
    courses: RwLock<HashMap<CourseId, CourseOutline>>,
    saves: AtomicUsize,
    failure: Mutex<Option<String>>,
    latency: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every save by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn insert_course(&self, outline: CourseOutline) {
        self.courses
            .write()
            .await
            .insert(outline.course_id.clone(), outline);
    }

    pub async fn lesson(&self, lesson_id: &LessonId) -> Option<StoredDocument> {
        self.lessons.read().await.get(lesson_id).cloned()
    }

    /// Reject every following save with `reason`, or accept again with `None`
    pub fn set_failure(&self, reason: Option<String>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = reason;
        }
    }

    /// Number of save attempts so far, failed ones included
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn current_failure(&self) -> Option<String> {
        self.failure.lock().ok().and_then(|failure| failure.clone())
    }
}

#[async_trait]
impl LessonStore for MemoryStore {
    async fn load_document(
        &self,
        lesson_id: &LessonId,
    ) -> Result<StoredDocument, PersistenceError> {
        self.lesson(lesson_id)
            .await
            .ok_or_else(|| PersistenceError::NotFound(lesson_id.clone()))
    }

    async fn save_document(
        &self,
        lesson_id: &LessonId,
        document: &StoredDocument,
    ) -> Result<(), PersistenceError> {
        self.saves.fetch_add(1, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(reason) = self.current_failure() {
            return Err(PersistenceError::Rejected(reason));
        }

        self.lessons
            .write()
            .await
            .insert(lesson_id.clone(), document.clone());
        Ok(())
    }
}

#[async_trait]
impl LessonNavigator for MemoryStore {
    async fn course_outline(
        &self,
        course_id: &CourseId,
    ) -> Result<CourseOutline, PersistenceError> {
        self.courses
            .read()
            .await
            .get(course_id)
            .cloned()
            .ok_or_else(|| PersistenceError::CourseNotFound(course_id.clone()))
    }
}

// ============================================================================
// FileStore
// ============================================================================

/// JSON files under a root directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lesson_path(&self, lesson_id: &LessonId) -> Result<PathBuf, PersistenceError> {
        Ok(self
            .root
            .join("lessons")
            .join(format!("{}.json", safe_file_stem(lesson_id.as_str())?)))
    }

    pub fn course_path(&self, course_id: &CourseId) -> Result<PathBuf, PersistenceError> {
        Ok(self
            .root
            .join("courses")
            .join(format!("{}.json", safe_file_stem(course_id.as_str())?)))
    }

    /// Lesson ids with a file on disk, sorted
    pub async fn list_lessons(&self) -> Result<Vec<LessonId>, PersistenceError> {
        let dir = self.root.join("lessons");
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                ids.push(LessonId::new(stem));
            }
        }

        ids.sort();
        Ok(ids)
    }

    pub async fn save_course(&self, outline: &CourseOutline) -> Result<(), PersistenceError> {
        let path = self.course_path(&outline.course_id)?;
        write_atomic(&path, &serde_json::to_vec_pretty(outline)?).await
    }
}

#[async_trait]
impl LessonStore for FileStore {
    async fn load_document(
        &self,
        lesson_id: &LessonId,
    ) -> Result<StoredDocument, PersistenceError> {
        let path = self.lesson_path(lesson_id)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PersistenceError::NotFound(lesson_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save_document(
        &self,
        lesson_id: &LessonId,
        document: &StoredDocument,
    ) -> Result<(), PersistenceError> {
        let path = self.lesson_path(lesson_id)?;
        write_atomic(&path, &serde_json::to_vec_pretty(document)?).await
    }
}

#[async_trait]
impl LessonNavigator for FileStore {
    async fn course_outline(
        &self,
        course_id: &CourseId,
    ) -> Result<CourseOutline, PersistenceError> {
        let path = self.course_path(course_id)?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PersistenceError::CourseNotFound(course_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn safe_file_stem(id: &str) -> Result<&str, PersistenceError> {
    let valid = !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(id)
    } else {
        Err(PersistenceError::Rejected(format!(
            "id {:?} cannot be used as a file name",
            id
        )))
    }
}

/// Write through a temp file so readers never see a half-written lesson
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockData, BlockType};
    use crate::ids::BlockId;

    fn outline() -> CourseOutline {
        let lesson = |id: &str| LessonSummary {
            id: LessonId::new(id),
            title: id.to_uppercase(),
        };

        CourseOutline {
            course_id: CourseId::new("rust-101"),
            title: "Rust 101".to_string(),
            modules: vec![
                ModuleOutline {
                    id: "m1".to_string(),
                    title: "Basics".to_string(),
                    lessons: vec![lesson("intro"), lesson("ownership")],
                },
                ModuleOutline {
                    id: "m2".to_string(),
                    title: "Traits".to_string(),
                    lessons: vec![lesson("traits")],
                },
            ],
        }
    }

    fn stored() -> StoredDocument {
        StoredDocument {
            blocks: vec![Block::new(
                BlockId::new("b-1"),
                BlockData::default_for(BlockType::Heading),
            )],
        }
    }

    #[test]
    fn test_navigation_crosses_modules() {
        let outline = outline();

        let next = outline.next_lesson(&LessonId::new("ownership")).unwrap();
        assert_eq!(next.id, LessonId::new("traits"));

        let previous = outline.previous_lesson(&LessonId::new("traits")).unwrap();
        assert_eq!(previous.id, LessonId::new("ownership"));

        assert!(outline.next_lesson(&LessonId::new("traits")).is_none());
        assert!(outline.previous_lesson(&LessonId::new("intro")).is_none());
        assert!(outline.next_lesson(&LessonId::new("unknown")).is_none());
    }

    #[test]
    fn test_unsafe_ids_are_rejected() {
        let store = FileStore::new("/tmp/lessons");
        assert!(store.lesson_path(&LessonId::new("../etc/passwd")).is_err());
        assert!(store.lesson_path(&LessonId::new("")).is_err());
        assert!(store.lesson_path(&LessonId::new("lesson_1-a")).is_ok());
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let lesson = LessonId::new("intro");

        assert!(matches!(
            store.load_document(&lesson).await,
            Err(PersistenceError::NotFound(_))
        ));

        store.save_document(&lesson, &stored()).await.unwrap();
        assert_eq!(store.load_document(&lesson).await.unwrap(), stored());
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_failure_injection() {
        let store = MemoryStore::new();
        let lesson = LessonId::new("intro");

        store.set_failure(Some("backend down".to_string()));
        let result = store.save_document(&lesson, &stored()).await;
        assert!(matches!(
            result,
            Err(PersistenceError::Rejected(reason)) if reason == "backend down"
        ));
        assert!(store.lesson(&lesson).await.is_none());
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let lesson = LessonId::new("intro");

        store.save_document(&lesson, &stored()).await.unwrap();
        assert_eq!(store.load_document(&lesson).await.unwrap(), stored());
        assert_eq!(store.list_lessons().await.unwrap(), vec![lesson]);

        let raw = std::fs::read_to_string(dir.path().join("lessons/intro.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["blocks"][0]["type"], "heading");
    }

    #[tokio::test]
    async fn test_file_store_missing_lesson() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        assert!(matches!(
            store.load_document(&LessonId::new("nope")).await,
            Err(PersistenceError::NotFound(_))
        ));
        assert!(store.list_lessons().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_store_course_outline() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save_course(&outline()).await.unwrap();
        let loaded = store.course_outline(&CourseId::new("rust-101")).await.unwrap();
        assert_eq!(loaded, outline());
    }
}
