//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Session is in preview mode")]
    ReadOnlyMode,

    #[error("Persistence error: {0}")]
    Persistence(#[from] crate::persistence::PersistenceError),

    #[error("Autosave error: {0}")]
    Autosave(#[from] crate::autosave::AutosaveError),

    #[error("No lesson is open")]
    NoActiveLesson,

    #[error("No lesson navigator configured")]
    NoNavigator,
}
