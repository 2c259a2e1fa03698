use std::sync::Arc;

use tutor_core::Clock;
use tutor_core::model::ProgressDocument;

use crate::mapping::{self, DecodeReport};
use crate::repository::{KeyValueStore, StorageError};

/// Default storage key for the progress document.
pub const PROGRESS_KEY: &str = "vcs-tutor.progress";

/// Reads and writes the progress document under one fixed key.
#[derive(Clone)]
pub struct ProgressRepository {
    store: Arc<dyn KeyValueStore>,
    key: String,
    clock: Clock,
}

impl ProgressRepository {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Clock) -> Self {
        Self {
            store,
            key: PROGRESS_KEY.to_owned(),
            clock,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Overwrite the stored document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the store write fails.
    pub fn save(&self, doc: &ProgressDocument) -> Result<(), StorageError> {
        let payload = mapping::encode(doc)?;
        self.store.set(&self.key, &payload)
    }

    /// Load the stored document, or the default one if nothing is stored.
    ///
    /// Malformed payloads are repaired field by field; repaired fields are
    /// logged and listed in the returned report.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only if the store itself cannot be read.
    pub fn load(&self) -> Result<(ProgressDocument, DecodeReport), StorageError> {
        let now = self.clock.now();
        let Some(raw) = self.store.get(&self.key)? else {
            tracing::debug!(key = %self.key, "no saved progress, starting fresh");
            return Ok((ProgressDocument::new(now), DecodeReport::default()));
        };

        let (doc, report) = mapping::decode(&raw, now);
        if report.unreadable {
            tracing::warn!(key = %self.key, "saved progress is unreadable, using defaults");
        } else if !report.invalid.is_empty() {
            tracing::warn!(
                key = %self.key,
                fields = ?report.invalid,
                "saved progress had invalid fields, defaulted them"
            );
        }
        if !report.missing.is_empty() {
            tracing::debug!(key = %self.key, fields = ?report.missing, "saved progress lacked fields");
        }
        Ok((doc, report))
    }

    /// Remove the stored document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be updated.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use tutor_core::model::{ChapterId, LastPosition};
    use tutor_core::time::{fixed_clock, fixed_now};

    #[test]
    fn load_without_saved_data_returns_default() {
        let repo = ProgressRepository::new(Arc::new(InMemoryStore::new()), fixed_clock());
        let (doc, report) = repo.load().unwrap();
        assert_eq!(doc, ProgressDocument::new(fixed_now()));
        assert!(report.is_clean());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = InMemoryStore::new();
        let repo = ProgressRepository::new(Arc::new(store.clone()), fixed_clock()).with_key("custom");
        let mut draft = ProgressDocument::new(fixed_now()).into_draft();
        draft.completed_chapters = [ChapterId::new("ch1")].into();
        draft.last_position = LastPosition::chapter_summary(ChapterId::new("ch1"));
        let doc = ProgressDocument::from_persisted(draft);

        repo.save(&doc).unwrap();
        assert!(store.get("custom").unwrap().is_some());
        assert_eq!(repo.load().unwrap().0, doc);

        repo.clear().unwrap();
        assert!(store.get("custom").unwrap().is_none());
        assert_eq!(repo.load().unwrap().0, ProgressDocument::new(fixed_now()));
    }

    #[test]
    fn corrupted_payload_loads_defaults() {
        let store = InMemoryStore::new();
        store.set(PROGRESS_KEY, "{not json").unwrap();
        let repo = ProgressRepository::new(Arc::new(store), fixed_clock());
        let (doc, report) = repo.load().unwrap();
        assert!(report.unreadable);
        assert_eq!(doc.global_score(), 0);
    }
}
