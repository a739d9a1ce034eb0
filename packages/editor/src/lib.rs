//! # Lessonkit Editor
//!
//! Core editing engine for lesson content.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ registry: block type → definition           │
//! │  - defaults, categories, settings schema    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ document: ordered blocks for one lesson     │
//! │  - operations resolved into mutations       │
//! │  - pages derived from page_break sentinels  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ session: selection, edit/preview, history   │
//! │  - undo/redo through inverse mutations      │
//! │  - dirty flag, change observers             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ autosave: debounced saves to a LessonStore  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Array position is order**: no stored index can drift from it
//! 2. **Pages are derived**: computed on demand, never stored
//! 3. **Failed intents leave no trace**: no history entry, no version bump
//! 4. **No silent data loss**: switching lessons flushes or loudly discards
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lessonkit_editor::{BlockType, EditorConfig, LessonHost, LessonId, UnsavedPolicy};
//!
//! let mut host = LessonHost::new(store, Arc::new(BlockRegistry::standard()), EditorConfig::default());
//!
//! let session = host.open_lesson(LessonId::new("intro"), UnsavedPolicy::Flush).await?;
//! let heading = session.add_block(BlockType::Heading, None)?;
//! session.add_block(BlockType::PageBreak, None)?;
//!
//! for page in session.document().compute_pages() {
//!     println!("page {}: {} blocks", page.number, page.blocks.len());
//! }
//!
//! session.undo()?;
//! host.save_now().await?;
//! ```

mod autosave;
mod block;
mod config;
mod document;
mod errors;
mod host;
mod id_generator;
mod ids;
mod mutations;
mod pages;
mod persistence;
mod registry;
mod session;
mod undo_stack;

pub use autosave::{
    spawn as spawn_autosave, AutosaveError, AutosaveHandle, CloseMode, CloseOutcome, SaveOutcome,
    SaveStatus,
};
pub use block::{
    Alignment, Block, BlockData, BlockType, CodeData, DividerData, EmbedData, HeadingData,
    ImageData, LinkData, ListData, ListStyle, PageBreakData, PdfData, PresentationData, QuizData,
    QuizOption, ScormData, SpacerData, TableData, TextData, VideoData,
};
pub use config::EditorConfig;
pub use document::{Document, DocumentSnapshot};
pub use errors::EditorError;
pub use host::{Direction, LessonHost, UnsavedPolicy};
pub use id_generator::{get_lesson_seed, IdGenerator};
pub use ids::{BlockId, CourseId, LessonId};
pub use mutations::{Mutation, MutationError, MutationResult, Operation};
pub use pages::{compute_pages, page_of, Page, DEFAULT_PAGE_BACKGROUND};
pub use persistence::{
    CourseOutline, FileStore, LessonNavigator, LessonStore, LessonSummary, MemoryStore,
    ModuleOutline, PersistenceError, StoredDocument,
};
pub use registry::{
    BlockCategory, BlockDefinition, BlockRegistry, CategoryFilter, SettingField, SettingKind,
    UnknownCategory, UNKNOWN,
};
pub use session::{ChangeObserver, EditMode, EditSession};
pub use undo_stack::{MutationBatch, UndoStack};
