pub mod blocks;
pub mod edit;
pub mod init;
pub mod lessons;
pub mod pages;

pub use blocks::{blocks, BlocksArgs};
pub use edit::{edit, EditArgs};
pub use init::{init, InitArgs};
pub use lessons::{lessons, LessonsArgs};
pub use pages::{pages, PagesArgs};

use crate::config::Config;
use anyhow::Result;
use lessonkit_editor::{BlockRegistry, Document, FileStore, LessonId, LessonStore, PersistenceError};

/// Store rooted at the configured data directory
pub(crate) fn open_store(config: &Config, cwd: &str) -> FileStore {
    FileStore::new(config.get_data_dir(cwd))
}

/// Load a lesson for read-only inspection; `None` when it was never saved
pub(crate) async fn load_lesson(
    store: &FileStore,
    lesson_id: &LessonId,
) -> Result<Option<Document>> {
    match store.load_document(lesson_id).await {
        Ok(stored) => Ok(Some(Document::hydrate(lesson_id.clone(), stored.blocks)?)),
        Err(PersistenceError::NotFound(_)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn registry() -> BlockRegistry {
    BlockRegistry::standard()
}
