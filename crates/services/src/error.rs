//! Shared error types for the services crate.

use thiserror::Error;

use storage::StorageError;
use storage::curriculum::CurriculumLoadError;
use tutor_core::model::{ChapterId, ViewKind};

/// Why a navigation request was ignored. State is unchanged whenever one of
/// these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NavigationError {
    #[error("unknown chapter: {0}")]
    UnknownChapter(String),
    #[error("chapter {0} is locked")]
    LockedChapter(ChapterId),
    #[error("action not available from the {} view", .0.as_str())]
    WrongView(ViewKind),
    #[error("answer {selected} is out of range ({options} options)")]
    AnswerOutOfRange { selected: usize, options: usize },
    #[error("no failed quiz to retry")]
    NothingToRetry,
    #[error("cursor points outside the curriculum")]
    OutOfRange,
    #[error("session has been shut down")]
    SessionClosed,
}

/// Which persistence call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOperation {
    Load,
    Save,
    Clear,
}

/// Non-fatal persistence failure kept on the progress store for the UI.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("progress {operation:?} failed: {message}")]
pub struct PersistenceFailure {
    pub operation: PersistOperation,
    pub message: String,
}

impl PersistenceFailure {
    pub(crate) fn new(operation: PersistOperation, err: &StorageError) -> Self {
        Self {
            operation,
            message: err.to_string(),
        }
    }
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("storage key cannot be empty")]
    EmptyStorageKey,
    #[error("invalid autosave interval: {raw}")]
    InvalidAutosaveInterval { raw: String },
}

/// Errors emitted while bootstrapping a tutor session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no data directory configured")]
    MissingDataDir,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Curriculum(#[from] CurriculumLoadError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
