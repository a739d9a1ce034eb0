//! # Undo/Redo Stack
//!
//! Tracks mutation history and enables undo/redo operations.
//!
//! ## Design
//!
//! - Each mutation records its inverse before being applied
//! - Undo applies the inverse and moves the mutation to the redo stack
//! - Redo reapplies the original mutation, ids and data included
//! - New mutations clear the redo stack
//! - Supports batched operations (group multiple mutations as one undo step)
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut stack = UndoStack::new();
//! let mut doc = Document::new(LessonId::new("intro"));
//!
//! let mutation = Mutation::InsertBlock { index: 0, block };
//! stack.apply(&mutation, &mut doc)?;
//!
//! stack.undo(&mut doc)?;
//! stack.redo(&mut doc)?;
//! ```

use crate::document::Document;
use crate::mutations::{Mutation, MutationError};

/// A group of mutations that should be undone/redone together
#[derive(Debug, Clone)]
pub struct MutationBatch {
    /// The mutations in this batch (in application order)
    pub mutations: Vec<Mutation>,

    /// The inverse mutations (in reverse order for undo)
    pub inverses: Vec<Mutation>,

    /// Optional description of this batch
    pub description: Option<String>,
}

impl MutationBatch {
    /// Create a single-mutation batch
    pub fn single(mutation: Mutation, inverse: Mutation) -> Self {
        Self {
            mutations: vec![mutation],
            inverses: vec![inverse],
            description: None,
        }
    }

    fn empty(description: Option<String>) -> Self {
        Self {
            mutations: Vec::new(),
            inverses: Vec::new(),
            description,
        }
    }
}

/// Undo/redo stack for lesson editing
#[derive(Debug)]
pub struct UndoStack {
    /// Stack of applied mutations (most recent last)
    undo_stack: Vec<MutationBatch>,

    /// Stack of undone mutations (most recent last)
    redo_stack: Vec<MutationBatch>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    /// Currently building a batch
    current_batch: Option<MutationBatch>,
}

impl UndoStack {
    /// Create a new undo stack with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(100)
    }

    /// Create an undo stack with custom max levels
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            current_batch: None,
        }
    }

    /// Apply a mutation and record it for undo.
    ///
    /// Nothing is recorded when the mutation fails.
    pub fn apply(&mut self, mutation: &Mutation, doc: &mut Document) -> Result<(), MutationError> {
        let inverse = mutation.to_inverse(doc)?;
        mutation.apply(doc)?;

        self.redo_stack.clear();

        if let Some(batch) = &mut self.current_batch {
            batch.mutations.push(mutation.clone());
            batch.inverses.insert(0, inverse);
        } else {
            self.push_batch(MutationBatch::single(mutation.clone(), inverse));
        }

        Ok(())
    }

    /// Start a batch of mutations (will be undone/redone together)
    pub fn begin_batch(&mut self, description: Option<String>) {
        self.end_batch();
        self.current_batch = Some(MutationBatch::empty(description));
    }

    /// End the current batch and push to undo stack
    pub fn end_batch(&mut self) {
        if let Some(batch) = self.current_batch.take() {
            if !batch.mutations.is_empty() {
                self.push_batch(batch);
            }
        }
    }

    pub fn is_batching(&self) -> bool {
        self.current_batch.is_some()
    }

    fn push_batch(&mut self, batch: MutationBatch) {
        self.undo_stack.push(batch);

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the most recent mutation/batch. An open batch is closed first.
    pub fn undo(&mut self, doc: &mut Document) -> Result<bool, MutationError> {
        self.end_batch();

        let Some(batch) = self.undo_stack.pop() else {
            return Ok(false);
        };

        if let Err(e) = apply_all(&batch.inverses, doc) {
            self.undo_stack.push(batch);
            return Err(e);
        }

        self.redo_stack.push(batch);
        Ok(true)
    }

    /// Redo the most recently undone mutation/batch
    pub fn redo(&mut self, doc: &mut Document) -> Result<bool, MutationError> {
        self.end_batch();

        let Some(batch) = self.redo_stack.pop() else {
            return Ok(false);
        };

        if let Err(e) = apply_all(&batch.mutations, doc) {
            self.redo_stack.push(batch);
            return Err(e);
        }

        self.undo_stack.push(batch);
        Ok(true)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
            || self
                .current_batch
                .as_ref()
                .is_some_and(|batch| !batch.mutations.is_empty())
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get the number of undo levels available
    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get the number of redo levels available
    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Get description of the next undo operation
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }

    /// Get description of the next redo operation
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack
            .last()
            .and_then(|batch| batch.description.as_deref())
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_all(mutations: &[Mutation], doc: &mut Document) -> Result<(), MutationError> {
    for mutation in mutations {
        mutation.apply(doc)?;
    }
    Ok(())
}
