//! # Lesson Document
//!
//! The authoritative ordered block sequence for one lesson.
//!
//! A Document is created when a lesson is opened for editing, either empty
//! or hydrated from persisted blocks, and is dropped when the session ends.
//!
//! ## Lifecycle
//!
//! ```text
//! Load → Hydrate → Operation → Mutation → Commit → Snapshot → Save
//!   ↓       ↓          ↓          ↓         ↓         ↓        ↓
//! Store  blocks     intent    resolved   version   observers  Store
//! ```
//!
//! Array position is the only notion of order. Selection is a weak
//! reference and is reconciled on every commit, so it never dangles.

use crate::block::{Block, BlockData, BlockType};
use crate::id_generator::IdGenerator;
use crate::ids::{BlockId, LessonId};
use crate::mutations::{Mutation, MutationError, Operation};
use crate::pages::{self, Page};
use crate::registry::BlockRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Editable lesson document
#[derive(Debug, Clone)]
pub struct Document {
    lesson_id: LessonId,

    /// Current version number (increments on each applied mutation)
    pub version: u64,

    blocks: Vec<Block>,

    /// Weak reference, cleared when the block goes away
    selected_block_id: Option<BlockId>,

    ids: IdGenerator,
}

/// Immutable copy of a document at one version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub lesson_id: LessonId,
    pub version: u64,
    pub blocks: Vec<Block>,
}

impl Document {
    /// Create an empty document
    pub fn new(lesson_id: LessonId) -> Self {
        let ids = IdGenerator::new(&lesson_id);
        Self {
            lesson_id,
            version: 0,
            blocks: Vec::new(),
            selected_block_id: None,
            ids,
        }
    }

    /// Create a document from persisted blocks
    pub fn hydrate(lesson_id: LessonId, blocks: Vec<Block>) -> Result<Self, MutationError> {
        let mut seen = HashSet::with_capacity(blocks.len());
        for block in &blocks {
            if !seen.insert(&block.id) {
                return Err(MutationError::DuplicateBlockId(block.id.clone()));
            }
        }

        let mut doc = Self::new(lesson_id);
        doc.ids.resume_after(blocks.iter().map(|b| &b.id));
        doc.blocks = blocks;
        Ok(doc)
    }

    pub fn lesson_id(&self) -> &LessonId {
        &self.lesson_id
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, block_id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == block_id)
    }

    /// Array position of a block
    pub fn position(&self, block_id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.id == block_id)
    }

    pub fn contains(&self, block_id: &BlockId) -> bool {
        self.position(block_id).is_some()
    }

    // Selection

    pub fn selected_block_id(&self) -> Option<&BlockId> {
        self.selected_block_id.as_ref()
    }

    pub fn selected_block(&self) -> Option<&Block> {
        self.selected_block_id.as_ref().and_then(|id| self.block(id))
    }

    /// Set or clear the selection.
    ///
    /// An id that does not resolve clears the selection and returns `false`.
    pub fn select_block(&mut self, block_id: Option<BlockId>) -> bool {
        match block_id {
            Some(id) if self.contains(&id) => {
                self.selected_block_id = Some(id);
                true
            }
            Some(id) => {
                tracing::debug!(block = %id, "Selection of absent block cleared");
                self.selected_block_id = None;
                false
            }
            None => {
                self.selected_block_id = None;
                true
            }
        }
    }

    // Derived views

    pub fn compute_pages(&self) -> Vec<Page<'_>> {
        pages::compute_pages(&self.blocks)
    }

    pub fn page_of(&self, block_id: &BlockId) -> Option<usize> {
        pages::page_of(&self.blocks, block_id)
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            lesson_id: self.lesson_id.clone(),
            version: self.version,
            blocks: self.blocks.clone(),
        }
    }

    // Block operations

    /// Append or insert a block with registry defaults
    pub fn add_block(
        &mut self,
        registry: &BlockRegistry,
        block_type: BlockType,
        at_index: Option<usize>,
    ) -> Result<BlockId, MutationError> {
        self.run(registry, Operation::AddBlock { block_type, at_index })?
            .ok_or_else(|| MutationError::UnknownBlockType(block_type.as_str().to_string()))
    }

    /// Shallow-merge fields into a block's data
    pub fn update_block_data(
        &mut self,
        registry: &BlockRegistry,
        block_id: &BlockId,
        data: &Map<String, Value>,
    ) -> Result<(), MutationError> {
        self.run(
            registry,
            Operation::UpdateBlockData {
                block_id: block_id.clone(),
                data: data.clone(),
            },
        )
        .map(|_| ())
    }

    /// Remove a block. Returns `false` if it was already gone.
    pub fn delete_block(&mut self, registry: &BlockRegistry, block_id: &BlockId) -> bool {
        let op = Operation::DeleteBlock {
            block_id: block_id.clone(),
        };
        matches!(self.run(registry, op), Ok(Some(_)))
    }

    /// Copy a block directly after itself under a new id
    pub fn duplicate_block(
        &mut self,
        registry: &BlockRegistry,
        block_id: &BlockId,
    ) -> Result<BlockId, MutationError> {
        let op = Operation::DuplicateBlock {
            block_id: block_id.clone(),
        };
        self.run(registry, op)?
            .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))
    }

    /// Move a block; `to_index` is clamped into bounds
    pub fn reorder_block(
        &mut self,
        registry: &BlockRegistry,
        block_id: &BlockId,
        to_index: usize,
    ) -> Result<(), MutationError> {
        let op = Operation::ReorderBlock {
            block_id: block_id.clone(),
            to_index,
        };
        self.run(registry, op).map(|_| ())
    }

    /// Apply a resolved mutation, returning the new version
    pub fn apply(&mut self, mutation: &Mutation) -> Result<u64, MutationError> {
        mutation.apply(self)?;
        Ok(self.version)
    }

    fn run(
        &mut self,
        registry: &BlockRegistry,
        op: Operation,
    ) -> Result<Option<BlockId>, MutationError> {
        match op.resolve(self, registry)? {
            Some(mutation) => {
                mutation.apply(self)?;
                Ok(Some(mutation.block_id().clone()))
            }
            None => Ok(None),
        }
    }

    // Primitives used by `Mutation::apply` (validated beforehand)

    pub(crate) fn generate_id(&mut self) -> BlockId {
        let blocks = &self.blocks;
        self.ids.new_id(|id| blocks.iter().any(|b| &b.id == id))
    }

    pub(crate) fn insert_block(&mut self, index: usize, block: Block) {
        self.blocks.insert(index, block);
    }

    pub(crate) fn replace_block_data(&mut self, block_id: &BlockId, data: BlockData) {
        if let Some(block) = self.blocks.iter_mut().find(|b| &b.id == block_id) {
            block.data = data;
        }
    }

    pub(crate) fn remove_block(&mut self, block_id: &BlockId) -> Option<Block> {
        let index = self.position(block_id)?;
        Some(self.blocks.remove(index))
    }

    pub(crate) fn move_block(&mut self, block_id: &BlockId, index: usize) {
        if let Some(block) = self.remove_block(block_id) {
            let index = index.min(self.blocks.len());
            self.blocks.insert(index, block);
        }
    }

    /// Bump the version and drop a selection that no longer resolves
    pub(crate) fn commit(&mut self) {
        self.version += 1;

        if let Some(selected) = &self.selected_block_id {
            if !self.contains(selected) {
                tracing::debug!(block = %selected, "Selected block removed, clearing selection");
                self.selected_block_id = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> BlockRegistry {
        BlockRegistry::standard()
    }

    fn types(doc: &Document) -> Vec<BlockType> {
        doc.blocks().iter().filter_map(|b| b.block_type()).collect()
    }

    #[test]
    fn test_create_empty_document() {
        let doc = Document::new(LessonId::new("intro"));

        assert_eq!(doc.version, 0);
        assert!(doc.is_empty());
        assert!(doc.compute_pages().is_empty());
        assert_eq!(doc.selected_block_id(), None);
    }

    #[test]
    fn test_add_block_uses_registry_defaults() {
        let registry = registry();
        let mut doc = Document::new(LessonId::new("intro"));

        let id = doc.add_block(&registry, BlockType::Heading, None).unwrap();
        let block = doc.block(&id).unwrap();

        assert_eq!(block.data, BlockData::default_for(BlockType::Heading));
        assert_eq!(doc.version, 1);
    }

    #[test]
    fn test_add_block_rejects_unregistered_type() {
        let registry = BlockRegistry::new();
        let mut doc = Document::new(LessonId::new("intro"));

        let result = doc.add_block(&registry, BlockType::Quiz, None);
        assert_eq!(result, Err(MutationError::UnknownBlockType("quiz".to_string())));
        assert_eq!(doc.version, 0);
    }

    #[test]
    fn test_add_block_out_of_range_index_appends() {
        let registry = registry();
        let mut doc = Document::new(LessonId::new("intro"));

        doc.add_block(&registry, BlockType::Text, None).unwrap();
        doc.add_block(&registry, BlockType::Divider, Some(42)).unwrap();

        assert_eq!(types(&doc), vec![BlockType::Text, BlockType::Divider]);
    }

    #[test]
    fn test_update_preserves_unspecified_keys() {
        let registry = registry();
        let mut doc = Document::new(LessonId::new("intro"));
        let id = doc.add_block(&registry, BlockType::Heading, None).unwrap();

        let partial = json!({ "text": "Welcome" });
        doc.update_block_data(&registry, &id, partial.as_object().unwrap())
            .unwrap();

        let fields = doc.block(&id).unwrap().data.fields();
        assert_eq!(fields["text"], json!("Welcome"));
        assert_eq!(fields["level"], json!(2));
    }

    #[test]
    fn test_update_missing_block_fails() {
        let registry = registry();
        let mut doc = Document::new(LessonId::new("intro"));
        let missing = BlockId::new("missing");

        let result = doc.update_block_data(&registry, &missing, &Map::new());
        assert_eq!(result, Err(MutationError::BlockNotFound(missing)));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let registry = registry();
        let mut doc = Document::new(LessonId::new("intro"));
        let id = doc.add_block(&registry, BlockType::Text, None).unwrap();

        assert!(doc.delete_block(&registry, &id));
        let version = doc.version;

        assert!(!doc.delete_block(&registry, &id));
        assert_eq!(doc.version, version);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_delete_clears_selection() {
        let registry = registry();
        let mut doc = Document::new(LessonId::new("intro"));
        let id = doc.add_block(&registry, BlockType::Text, None).unwrap();

        assert!(doc.select_block(Some(id.clone())));
        doc.delete_block(&registry, &id);

        assert_eq!(doc.selected_block_id(), None);
    }

    #[test]
    fn test_select_absent_block_clears_selection() {
        let registry = registry();
        let mut doc = Document::new(LessonId::new("intro"));
        let id = doc.add_block(&registry, BlockType::Text, None).unwrap();
        doc.select_block(Some(id));

        assert!(!doc.select_block(Some(BlockId::new("ghost"))));
        assert_eq!(doc.selected_block(), None);
    }

    #[test]
    fn test_duplicate_inserts_after_original() {
        let registry = registry();
        let mut doc = Document::new(LessonId::new("intro"));
        let first = doc.add_block(&registry, BlockType::Code, None).unwrap();
        doc.add_block(&registry, BlockType::Text, None).unwrap();

        let copy = doc.duplicate_block(&registry, &first).unwrap();

        assert_ne!(copy, first);
        assert_eq!(doc.position(&copy), Some(1));
        assert_eq!(doc.block(&copy).unwrap().data, doc.block(&first).unwrap().data);
    }

    #[test]
    fn test_reorder_clamps() {
        let registry = registry();
        let mut doc = Document::new(LessonId::new("intro"));
        let a = doc.add_block(&registry, BlockType::Text, None).unwrap();
        doc.add_block(&registry, BlockType::Image, None).unwrap();
        doc.add_block(&registry, BlockType::Video, None).unwrap();

        doc.reorder_block(&registry, &a, 100).unwrap();
        assert_eq!(doc.position(&a), Some(2));

        doc.reorder_block(&registry, &a, 0).unwrap();
        assert_eq!(doc.position(&a), Some(0));
    }

    #[test]
    fn test_reorder_onto_itself_is_noop() {
        let registry = registry();
        let mut doc = Document::new(LessonId::new("intro"));
        let a = doc.add_block(&registry, BlockType::Text, None).unwrap();
        let version = doc.version;

        doc.reorder_block(&registry, &a, 0).unwrap();
        assert_eq!(doc.version, version);
    }

    #[test]
    fn test_hydrate_rejects_duplicate_ids() {
        let block = Block::new(BlockId::new("b"), BlockData::default_for(BlockType::Text));
        let result = Document::hydrate(LessonId::new("intro"), vec![block.clone(), block]);

        assert_eq!(result.err(), Some(MutationError::DuplicateBlockId(BlockId::new("b"))));
    }

    #[test]
    fn test_generated_ids_skip_hydrated_ones() {
        let registry = registry();
        let lesson = LessonId::new("intro");
        let seed = IdGenerator::new(&lesson).seed().to_string();
        let existing = Block::new(
            BlockId::new(format!("{}-1", seed)),
            BlockData::default_for(BlockType::Text),
        );

        let mut doc = Document::hydrate(lesson, vec![existing]).unwrap();
        let id = doc.add_block(&registry, BlockType::Text, None).unwrap();

        assert_eq!(id.as_str(), format!("{}-2", seed));
    }

    #[test]
    fn test_deleted_hydrated_id_is_not_reissued() {
        let registry = registry();
        let lesson = LessonId::new("intro");
        let seed = IdGenerator::new(&lesson).seed().to_string();
        let deleted = BlockId::new(format!("{}-1", seed));
        let existing = Block::new(deleted.clone(), BlockData::default_for(BlockType::Text));

        let mut doc = Document::hydrate(lesson, vec![existing]).unwrap();
        assert!(doc.delete_block(&registry, &deleted));

        let id = doc.add_block(&registry, BlockType::Text, None).unwrap();
        assert_ne!(id, deleted);
        assert_eq!(id.as_str(), format!("{}-2", seed));
    }

    #[test]
    fn test_snapshot_carries_version() {
        let registry = registry();
        let mut doc = Document::new(LessonId::new("intro"));
        doc.add_block(&registry, BlockType::Spacer, None).unwrap();

        let snapshot = doc.snapshot();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.blocks, doc.blocks());
    }
}
