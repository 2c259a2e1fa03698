#![forbid(unsafe_code)]

pub mod curriculum;
pub mod file;
pub mod mapping;
pub mod progress_repo;
pub mod repository;

pub use file::FileStore;
pub use progress_repo::{PROGRESS_KEY, ProgressRepository};
pub use repository::{InMemoryStore, KeyValueStore, StorageError};
