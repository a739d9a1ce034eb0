//! # Edit Session
//!
//! Single entry point through which the UI edits one lesson.
//!
//! An EditSession owns the document, the edit/preview mode, the undo
//! history and the dirty flag. Every committed change (mutations, undo and
//! redo) is pushed to attached observers as a [`DocumentSnapshot`], which is
//! how the autosave coordinator hears about edits.
//!
//! ```text
//!            ┌──────────── preview ────────────┐
//!            │                                 ▼
//!   ┌────────────────┐                ┌────────────────┐
//!   │      Edit      │                │    Preview     │
//!   │ mutate / undo  │                │  select only   │
//!   └────────────────┘                └────────────────┘
//!            ▲                                 │
//!            └────────────── edit ─────────────┘
//! ```

use crate::block::BlockType;
use crate::config::EditorConfig;
use crate::document::{Document, DocumentSnapshot};
use crate::errors::EditorError;
use crate::ids::BlockId;
use crate::mutations::{MutationResult, Operation};
use crate::registry::BlockRegistry;
use crate::undo_stack::UndoStack;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Editing mode; no block mutation is allowed in preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Edit,
    Preview,
}

/// Receives a snapshot after every committed change
pub trait ChangeObserver: Send + Sync {
    fn document_changed(&self, snapshot: &DocumentSnapshot);
}

/// Editing state for one open lesson
pub struct EditSession {
    document: Document,
    registry: Arc<BlockRegistry>,
    mode: EditMode,
    history: UndoStack,

    /// Newest version known to be persisted
    saved_version: u64,

    observers: Vec<Box<dyn ChangeObserver>>,
}

impl EditSession {
    /// Create a session over a freshly loaded document (treated as saved)
    pub fn new(document: Document, registry: Arc<BlockRegistry>) -> Self {
        Self::with_config(document, registry, &EditorConfig::default())
    }

    pub fn with_config(
        document: Document,
        registry: Arc<BlockRegistry>,
        config: &EditorConfig,
    ) -> Self {
        let saved_version = document.version;
        Self {
            document,
            registry,
            mode: EditMode::Edit,
            history: UndoStack::with_max_levels(config.history_limit),
            saved_version,
            observers: Vec::new(),
        }
    }

    /// Attach an observer for committed changes
    pub fn observe(&mut self, observer: Box<dyn ChangeObserver>) {
        self.observers.push(observer);
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Apply an editing intent.
    ///
    /// A failed intent leaves the document and history untouched. Intents that
    /// resolve to nothing (deleting an absent block) succeed without a new
    /// history entry.
    pub fn mutate(&mut self, op: Operation) -> Result<MutationResult, EditorError> {
        self.ensure_editable()?;

        let Some(mutation) = op.resolve(&mut self.document, &self.registry)? else {
            return Ok(MutationResult {
                version: self.document.version,
                block_id: None,
            });
        };

        self.history.apply(&mutation, &mut self.document)?;
        self.notify();

        Ok(MutationResult {
            version: self.document.version,
            block_id: Some(mutation.block_id().clone()),
        })
    }

    pub fn add_block(
        &mut self,
        block_type: BlockType,
        at_index: Option<usize>,
    ) -> Result<MutationResult, EditorError> {
        self.mutate(Operation::AddBlock { block_type, at_index })
    }

    pub fn update_block_data(
        &mut self,
        block_id: &BlockId,
        data: Map<String, Value>,
    ) -> Result<MutationResult, EditorError> {
        self.mutate(Operation::UpdateBlockData {
            block_id: block_id.clone(),
            data,
        })
    }

    pub fn delete_block(&mut self, block_id: &BlockId) -> Result<MutationResult, EditorError> {
        self.mutate(Operation::DeleteBlock {
            block_id: block_id.clone(),
        })
    }

    pub fn duplicate_block(&mut self, block_id: &BlockId) -> Result<MutationResult, EditorError> {
        self.mutate(Operation::DuplicateBlock {
            block_id: block_id.clone(),
        })
    }

    pub fn reorder_block(
        &mut self,
        block_id: &BlockId,
        to_index: usize,
    ) -> Result<MutationResult, EditorError> {
        self.mutate(Operation::ReorderBlock {
            block_id: block_id.clone(),
            to_index,
        })
    }

    // Selection and mode

    /// Select a block, or deselect with `None`. Allowed in either mode.
    pub fn select_block(&mut self, block_id: Option<BlockId>) {
        self.document.select_block(block_id);
    }

    pub fn selected_block_id(&self) -> Option<&BlockId> {
        self.document.selected_block_id()
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Switch modes; selection and history are kept
    pub fn set_edit_mode(&mut self, mode: EditMode) {
        if self.mode != mode {
            tracing::debug!(lesson = %self.document.lesson_id(), ?mode, "Edit mode changed");
            self.mode = mode;
        }
    }

    // History

    /// Undo the last step. `Ok(false)` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        self.ensure_editable()?;

        let undone = self.history.undo(&mut self.document)?;
        if undone {
            self.notify();
        }
        Ok(undone)
    }

    /// Redo the last undone step. `Ok(false)` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        self.ensure_editable()?;

        let redone = self.history.redo(&mut self.document)?;
        if redone {
            self.notify();
        }
        Ok(redone)
    }

    /// Group the following intents into one undo step
    pub fn begin_batch(&mut self, description: impl Into<String>) {
        self.history.begin_batch(Some(description.into()));
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_levels()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_levels()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    // Dirty tracking

    pub fn is_dirty(&self) -> bool {
        self.document.version > self.saved_version
    }

    /// Record that `version` was persisted. Newer edits keep the session dirty.
    pub fn mark_saved(&mut self, version: u64) {
        self.saved_version = self.saved_version.max(version);
    }

    pub fn saved_version(&self) -> u64 {
        self.saved_version
    }

    fn ensure_editable(&self) -> Result<(), EditorError> {
        match self.mode {
            EditMode::Edit => Ok(()),
            EditMode::Preview => Err(EditorError::ReadOnlyMode),
        }
    }

    fn notify(&self) {
        if self.observers.is_empty() {
            return;
        }

        let snapshot = self.document.snapshot();
        for observer in &self.observers {
            observer.document_changed(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::LessonId;
    use crate::mutations::MutationError;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Arc<Mutex<Vec<u64>>>);

    impl ChangeObserver for Recorder {
        fn document_changed(&self, snapshot: &DocumentSnapshot) {
            self.0.lock().unwrap().push(snapshot.version);
        }
    }

    fn session() -> EditSession {
        EditSession::new(
            Document::new(LessonId::new("intro")),
            Arc::new(BlockRegistry::standard()),
        )
    }

    #[test]
    fn test_new_session_is_clean() {
        let session = session();
        assert_eq!(session.mode(), EditMode::Edit);
        assert!(!session.is_dirty());
        assert!(!session.can_undo());
    }

    #[test]
    fn test_mutate_marks_dirty_and_records_history() {
        let mut session = session();

        let result = session.add_block(BlockType::Text, None).unwrap();
        assert!(result.applied());
        assert_eq!(result.version, 1);
        assert!(session.is_dirty());
        assert_eq!(session.undo_depth(), 1);
    }

    #[test]
    fn test_preview_rejects_mutations() {
        let mut session = session();
        session.add_block(BlockType::Text, None).unwrap();
        session.set_edit_mode(EditMode::Preview);

        assert!(matches!(
            session.add_block(BlockType::Text, None),
            Err(EditorError::ReadOnlyMode)
        ));
        assert!(matches!(session.undo(), Err(EditorError::ReadOnlyMode)));
        assert_eq!(session.document().len(), 1);
    }

    #[test]
    fn test_mode_switch_keeps_selection_and_history() {
        let mut session = session();
        let id = session.add_block(BlockType::Text, None).unwrap().block_id.unwrap();
        session.select_block(Some(id.clone()));

        session.set_edit_mode(EditMode::Preview);
        session.set_edit_mode(EditMode::Edit);

        assert_eq!(session.selected_block_id(), Some(&id));
        assert_eq!(session.undo_depth(), 1);
    }

    #[test]
    fn test_failed_update_leaves_history_alone() {
        let mut session = session();
        session.add_block(BlockType::Text, None).unwrap();

        let result = session.update_block_data(&BlockId::new("ghost"), Map::new());
        assert!(matches!(
            result,
            Err(EditorError::Mutation(MutationError::BlockNotFound(_)))
        ));
        assert_eq!(session.undo_depth(), 1);
    }

    #[test]
    fn test_idempotent_delete_pushes_no_history() {
        let mut session = session();
        let result = session.delete_block(&BlockId::new("ghost")).unwrap();

        assert!(!result.applied());
        assert_eq!(session.undo_depth(), 0);
        assert!(!session.is_dirty());
    }

    #[test]
    fn test_undo_clears_stale_selection() {
        let mut session = session();
        let id = session.add_block(BlockType::Quiz, None).unwrap().block_id.unwrap();
        session.select_block(Some(id));

        assert!(session.undo().unwrap());
        assert_eq!(session.selected_block_id(), None);
        assert!(!session.undo().unwrap());
    }

    #[test]
    fn test_batch_is_one_undo_step() {
        let mut session = session();

        session.begin_batch("Insert section");
        let id = session.add_block(BlockType::Heading, None).unwrap().block_id.unwrap();
        session
            .update_block_data(&id, json!({ "text": "Part 2" }).as_object().unwrap().clone())
            .unwrap();
        session.add_block(BlockType::PageBreak, Some(0)).unwrap();
        session.end_batch();

        assert_eq!(session.undo_depth(), 1);
        assert_eq!(session.undo_description(), Some("Insert section"));

        session.undo().unwrap();
        assert!(session.document().is_empty());
    }

    #[test]
    fn test_mark_saved_respects_newer_versions() {
        let mut session = session();
        session.add_block(BlockType::Text, None).unwrap();
        session.add_block(BlockType::Text, None).unwrap();

        session.mark_saved(1);
        assert!(session.is_dirty());

        session.mark_saved(2);
        assert!(!session.is_dirty());

        session.mark_saved(1);
        assert_eq!(session.saved_version(), 2);
    }

    #[test]
    fn test_observers_see_every_commit() {
        let versions = Arc::new(Mutex::new(Vec::new()));
        let mut session = session();
        session.observe(Box::new(Recorder(versions.clone())));

        session.add_block(BlockType::Text, None).unwrap();
        session.undo().unwrap();
        session.redo().unwrap();
        session.delete_block(&BlockId::new("ghost")).unwrap();

        assert_eq!(*versions.lock().unwrap(), vec![1, 2, 3]);
    }
}
