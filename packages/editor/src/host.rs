//! # Lesson Host
//!
//! Owns the single active [`EditSession`] and its autosave coordinator, and
//! switches between lessons without losing edits.
//!
//! ```text
//! open_lesson(B)
//!   ├─ close A: flush autosave (or discard, if the caller said so)
//!   │    └─ flush failed → error, A stays open
//!   ├─ load B: stored blocks, or an empty document on NotFound
//!   └─ spawn autosave for B, attach it to B's session
//! ```

use crate::autosave::{self, AutosaveHandle, CloseMode, CloseOutcome, SaveOutcome};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::errors::EditorError;
use crate::ids::{CourseId, LessonId};
use crate::persistence::{LessonNavigator, LessonStore, PersistenceError};
use crate::registry::BlockRegistry;
use crate::session::EditSession;
use std::sync::Arc;

/// What to do with unsaved changes of the lesson being closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnsavedPolicy {
    /// Save them first; abort the switch if that fails
    #[default]
    Flush,
    /// Drop them (logged as a warning)
    Discard,
}

impl From<UnsavedPolicy> for CloseMode {
    fn from(policy: UnsavedPolicy) -> Self {
        match policy {
            UnsavedPolicy::Flush => CloseMode::Flush,
            UnsavedPolicy::Discard => CloseMode::DiscardUnsaved,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

struct ActiveLesson {
    session: EditSession,
    autosave: AutosaveHandle,
}

/// Hosts one editable lesson at a time
pub struct LessonHost {
    store: Arc<dyn LessonStore>,
    navigator: Option<Arc<dyn LessonNavigator>>,
    registry: Arc<BlockRegistry>,
    config: EditorConfig,
    active: Option<ActiveLesson>,
}

impl LessonHost {
    pub fn new(
        store: Arc<dyn LessonStore>,
        registry: Arc<BlockRegistry>,
        config: EditorConfig,
    ) -> Self {
        Self {
            store,
            navigator: None,
            registry,
            config,
            active: None,
        }
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn LessonNavigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn active_lesson(&self) -> Option<&LessonId> {
        self.active
            .as_ref()
            .map(|active| active.session.document().lesson_id())
    }

    /// Read-only view of the active session.
    ///
    /// Its `is_dirty` only knows about saves seen through [`Self::session_mut`]
    /// or [`Self::save_now`]; use [`Self::is_dirty`] for the live answer.
    pub fn session(&self) -> Option<&EditSession> {
        self.active.as_ref().map(|active| &active.session)
    }

    /// Whether the active lesson has edits newer than the last successful save
    pub fn is_dirty(&self) -> bool {
        self.active.as_ref().is_some_and(|active| {
            let saved = active
                .session
                .saved_version()
                .max(active.autosave.status().saved_version);
            active.session.document().version > saved
        })
    }

    pub fn session_mut(&mut self) -> Option<&mut EditSession> {
        let active = self.active.as_mut()?;
        active
            .session
            .mark_saved(active.autosave.status().saved_version);
        Some(&mut active.session)
    }

    pub fn autosave(&self) -> Option<&AutosaveHandle> {
        self.active.as_ref().map(|active| &active.autosave)
    }

    /// Open a lesson for editing, closing the current one under `policy`
    pub async fn open_lesson(
        &mut self,
        lesson_id: LessonId,
        policy: UnsavedPolicy,
    ) -> Result<&mut EditSession, EditorError> {
        if self.active_lesson() != Some(&lesson_id) {
            self.close_lesson(policy).await?;

            let document = self.load(&lesson_id).await?;
            let autosave = autosave::spawn(
                self.store.clone(),
                lesson_id.clone(),
                self.config.autosave_debounce(),
                document.version,
            );

            let mut session =
                EditSession::with_config(document, self.registry.clone(), &self.config);
            session.observe(Box::new(autosave.clone()));

            tracing::info!(lesson = %lesson_id, blocks = session.document().len(), "Lesson opened");
            self.active = Some(ActiveLesson { session, autosave });
        }

        self.session_mut().ok_or(EditorError::NoActiveLesson)
    }

    /// Close the active lesson. `Ok(None)` when nothing was open.
    ///
    /// A failed flush keeps the lesson open and returns the error.
    pub async fn close_lesson(
        &mut self,
        policy: UnsavedPolicy,
    ) -> Result<Option<CloseOutcome>, EditorError> {
        let Some(active) = &self.active else {
            return Ok(None);
        };

        let outcome = active.autosave.close(policy.into()).await?;
        if let Some(active) = self.active.take() {
            tracing::info!(
                lesson = %active.session.document().lesson_id(),
                ?outcome,
                "Lesson closed"
            );
        }
        Ok(Some(outcome))
    }

    /// Explicit save of the active lesson
    pub async fn save_now(&mut self) -> Result<SaveOutcome, EditorError> {
        let active = self.active.as_mut().ok_or(EditorError::NoActiveLesson)?;

        let outcome = active.autosave.save_now().await?;
        if let SaveOutcome::Saved { version } = outcome {
            active.session.mark_saved(version);
        }
        Ok(outcome)
    }

    /// Move to the next or previous lesson of a course.
    ///
    /// `Ok(None)` at either end of the course, or when no lesson is open.
    pub async fn open_adjacent(
        &mut self,
        course_id: &CourseId,
        direction: Direction,
        policy: UnsavedPolicy,
    ) -> Result<Option<&mut EditSession>, EditorError> {
        let navigator = self.navigator.clone().ok_or(EditorError::NoNavigator)?;
        let Some(current) = self.active_lesson().cloned() else {
            return Ok(None);
        };

        let outline = navigator.course_outline(course_id).await?;
        let target = match direction {
            Direction::Next => outline.next_lesson(&current),
            Direction::Previous => outline.previous_lesson(&current),
        };

        match target.map(|lesson| lesson.id.clone()) {
            Some(lesson_id) => self.open_lesson(lesson_id, policy).await.map(Some),
            None => Ok(None),
        }
    }

    async fn load(&self, lesson_id: &LessonId) -> Result<Document, EditorError> {
        match self.store.load_document(lesson_id).await {
            Ok(stored) => Ok(Document::hydrate(lesson_id.clone(), stored.blocks)?),
            Err(PersistenceError::NotFound(_)) => {
                tracing::debug!(lesson = %lesson_id, "No stored content, starting empty");
                Ok(Document::new(lesson_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
