//! # Block Mutations
//!
//! Two layers of operations on a lesson document.
//!
//! ## Operations (intents)
//!
//! What the UI asks for: "add a heading", "merge these fields into block X".
//! An [`Operation`] is resolved against the current document, which fixes
//! every open choice (new ids, merged payloads, clamped indexes).
//!
//! ## Mutations
//!
//! The resolved, replayable form. A [`Mutation`] carries everything needed
//! to apply it again, and can produce its inverse against the document it is
//! about to change. The undo stack only ever stores mutations.
//!
//! ## Semantics
//!
//! - Add: inserts registry defaults, index clamped to the end
//! - Update: shallow merge, unknown fields rejected
//! - Delete: idempotent, an absent block resolves to nothing
//! - Duplicate: copy placed directly after the original, new id
//! - Blocks of an unrecognized type can only be moved or deleted
//! - Reorder: target index clamped into bounds

use crate::block::{Block, BlockData, BlockType};
use crate::document::Document;
use crate::ids::BlockId;
use crate::registry::BlockRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Unknown block type: {0}")]
    UnknownBlockType(String),

    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("Invalid {block_type} data: {reason}")]
    InvalidBlockData { block_type: BlockType, reason: String },

    #[error("Duplicate block id: {0}")]
    DuplicateBlockId(BlockId),

    #[error("Index {index} out of bounds for {len} blocks")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Editing intent issued by the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Operation {
    AddBlock {
        block_type: BlockType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_index: Option<usize>,
    },

    UpdateBlockData {
        block_id: BlockId,
        data: Map<String, Value>,
    },

    DeleteBlock {
        block_id: BlockId,
    },

    DuplicateBlock {
        block_id: BlockId,
    },

    ReorderBlock {
        block_id: BlockId,
        to_index: usize,
    },
}

impl Operation {
    /// Resolve into a concrete mutation.
    ///
    /// `Ok(None)` means the operation has nothing to do (deleting an absent
    /// block, moving a block onto its own position).
    pub fn resolve(
        &self,
        doc: &mut Document,
        registry: &BlockRegistry,
    ) -> Result<Option<Mutation>, MutationError> {
        match self {
            Operation::AddBlock { block_type, at_index } => {
                let data = registry.default_data(*block_type)?;
                let index = at_index.map_or(doc.len(), |i| i.min(doc.len()));
                let block = Block::new(doc.generate_id(), data);
                Ok(Some(Mutation::InsertBlock { index, block }))
            }

            Operation::UpdateBlockData { block_id, data } => {
                let block = doc
                    .block(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;
                let merged = block.data.merged(data)?;

                Ok(Some(Mutation::ReplaceBlockData {
                    block_id: block_id.clone(),
                    data: merged,
                }))
            }

            Operation::DeleteBlock { block_id } => {
                if doc.contains(block_id) {
                    Ok(Some(Mutation::RemoveBlock {
                        block_id: block_id.clone(),
                    }))
                } else {
                    tracing::debug!(%block_id, "Delete of absent block ignored");
                    Ok(None)
                }
            }

            Operation::DuplicateBlock { block_id } => {
                let position = doc
                    .position(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;
                let source = doc.blocks()[position].clone();

                let registered = source.block_type().is_some_and(|t| registry.contains(t));
                if !registered {
                    return Err(MutationError::UnknownBlockType(source.type_name().to_string()));
                }

                let block = Block::new(doc.generate_id(), source.data).with_extra(source.extra);
                Ok(Some(Mutation::InsertBlock {
                    index: position + 1,
                    block,
                }))
            }

            Operation::ReorderBlock { block_id, to_index } => {
                let position = doc
                    .position(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;
                let index = (*to_index).min(doc.len() - 1);

                if index == position {
                    return Ok(None);
                }

                Ok(Some(Mutation::MoveBlock {
                    block_id: block_id.clone(),
                    index,
                }))
            }
        }
    }

    /// Get a debug name for this operation
    pub fn name(&self) -> &'static str {
        match self {
            Operation::AddBlock { .. } => "addBlock",
            Operation::UpdateBlockData { .. } => "updateBlockData",
            Operation::DeleteBlock { .. } => "deleteBlock",
            Operation::DuplicateBlock { .. } => "duplicateBlock",
            Operation::ReorderBlock { .. } => "reorderBlock",
        }
    }
}

/// Resolved, replayable change to a document
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Insert a fully formed block at index
    InsertBlock { index: usize, block: Block },

    /// Replace a block's payload (type must not change)
    ReplaceBlockData { block_id: BlockId, data: BlockData },

    /// Remove a block
    RemoveBlock { block_id: BlockId },

    /// Move a block so it ends up at index
    MoveBlock { block_id: BlockId, index: usize },
}

impl Mutation {
    /// Block this mutation is about
    pub fn block_id(&self) -> &BlockId {
        match self {
            Mutation::InsertBlock { block, .. } => &block.id,
            Mutation::ReplaceBlockData { block_id, .. }
            | Mutation::RemoveBlock { block_id }
            | Mutation::MoveBlock { block_id, .. } => block_id,
        }
    }

    /// Validate without applying
    pub fn validate(&self, doc: &Document) -> Result<(), MutationError> {
        match self {
            Mutation::InsertBlock { index, block } => {
                if doc.contains(&block.id) {
                    return Err(MutationError::DuplicateBlockId(block.id.clone()));
                }
                if *index > doc.len() {
                    return Err(MutationError::IndexOutOfBounds {
                        index: *index,
                        len: doc.len(),
                    });
                }
                Ok(())
            }

            Mutation::ReplaceBlockData { block_id, data } => {
                let block = doc
                    .block(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;

                let Some(block_type) = block.block_type() else {
                    return Err(MutationError::UnknownBlockType(block.type_name().to_string()));
                };
                if data.block_type() != Some(block_type) {
                    return Err(MutationError::InvalidBlockData {
                        block_type,
                        reason: format!("cannot change type to {}", data.type_name()),
                    });
                }
                Ok(())
            }

            Mutation::RemoveBlock { block_id } => {
                doc.position(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;
                Ok(())
            }

            Mutation::MoveBlock { block_id, index } => {
                doc.position(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;

                if *index >= doc.len() {
                    return Err(MutationError::IndexOutOfBounds {
                        index: *index,
                        len: doc.len(),
                    });
                }
                Ok(())
            }
        }
    }

    /// Apply mutation to the document with validation
    pub fn apply(&self, doc: &mut Document) -> Result<(), MutationError> {
        self.validate(doc)?;

        match self {
            Mutation::InsertBlock { index, block } => doc.insert_block(*index, block.clone()),
            Mutation::ReplaceBlockData { block_id, data } => {
                doc.replace_block_data(block_id, data.clone())
            }
            Mutation::RemoveBlock { block_id } => {
                doc.remove_block(block_id);
            }
            Mutation::MoveBlock { block_id, index } => doc.move_block(block_id, *index),
        }

        doc.commit();
        tracing::debug!(
            lesson = %doc.lesson_id(),
            version = doc.version,
            block = %self.block_id(),
            mutation = self.name(),
            "Applied mutation"
        );

        Ok(())
    }

    /// Create the inverse mutation, against the document before `self` is applied
    pub fn to_inverse(&self, doc: &Document) -> Result<Mutation, MutationError> {
        self.validate(doc)?;

        let inverse = match self {
            Mutation::InsertBlock { block, .. } => Mutation::RemoveBlock {
                block_id: block.id.clone(),
            },

            Mutation::ReplaceBlockData { block_id, .. } => {
                let block = doc
                    .block(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;
                Mutation::ReplaceBlockData {
                    block_id: block_id.clone(),
                    data: block.data.clone(),
                }
            }

            Mutation::RemoveBlock { block_id } => {
                let index = doc
                    .position(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;
                Mutation::InsertBlock {
                    index,
                    block: doc.blocks()[index].clone(),
                }
            }

            Mutation::MoveBlock { block_id, .. } => {
                let index = doc
                    .position(block_id)
                    .ok_or_else(|| MutationError::BlockNotFound(block_id.clone()))?;
                Mutation::MoveBlock {
                    block_id: block_id.clone(),
                    index,
                }
            }
        };

        Ok(inverse)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertBlock { .. } => "InsertBlock",
            Mutation::ReplaceBlockData { .. } => "ReplaceBlockData",
            Mutation::RemoveBlock { .. } => "RemoveBlock",
            Mutation::MoveBlock { .. } => "MoveBlock",
        }
    }
}

/// Result of a mutation issued through an edit session
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    /// Document version after the call
    pub version: u64,

    /// Block created or changed; `None` when the operation was a no-op
    pub block_id: Option<BlockId>,
}

impl MutationResult {
    pub fn applied(&self) -> bool {
        self.block_id.is_some()
    }
}
