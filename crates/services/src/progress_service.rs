use std::sync::Arc;

use storage::ProgressRepository;
use storage::mapping::DecodeReport;
use tutor_core::Clock;
use tutor_core::model::{
    ChapterProgress, Curriculum, LastPosition, ProgressDocument, ProgressStats,
};
use tutor_core::scoring;

use crate::error::{PersistOperation, PersistenceFailure};

/// Sole owner of the learner's progress document.
///
/// Mutators apply a pure document transition; when the transition changes
/// something the document is stamped and saved right away. Unknown ids are
/// no-ops. The store is a ledger: callers decide when a chapter has earned
/// completion (see the navigator's quiz gate).
///
/// Persistence failures never undo in-memory progress. The most recent one is
/// kept in [`ProgressStore::last_error`] until a save succeeds or the UI
/// clears it.
pub struct ProgressStore {
    curriculum: Arc<Curriculum>,
    repo: ProgressRepository,
    clock: Clock,
    document: ProgressDocument,
    load_report: DecodeReport,
    last_error: Option<PersistenceFailure>,
}

impl ProgressStore {
    /// Load the saved document (or start fresh) and reconcile it with the
    /// curriculum.
    #[must_use]
    pub fn open(curriculum: Arc<Curriculum>, repo: ProgressRepository) -> Self {
        let clock = repo.clock();
        let (loaded, load_report, last_error) = match repo.load() {
            Ok((doc, report)) => (doc, report, None),
            Err(err) => {
                tracing::warn!(error = %err, "could not read saved progress, starting fresh");
                (
                    ProgressDocument::new(clock.now()),
                    DecodeReport::default(),
                    Some(PersistenceFailure::new(PersistOperation::Load, &err)),
                )
            }
        };
        let document = loaded.reconciled(&curriculum);

        Self {
            curriculum,
            repo,
            clock,
            document,
            load_report,
            last_error,
        }
    }

    #[must_use]
    pub fn curriculum(&self) -> &Curriculum {
        &self.curriculum
    }

    #[must_use]
    pub fn document(&self) -> &ProgressDocument {
        &self.document
    }

    /// Fields that were defaulted while loading.
    #[must_use]
    pub fn load_report(&self) -> &DecodeReport {
        &self.load_report
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&PersistenceFailure> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Returns `true` if the lesson was newly completed.
    pub fn complete_lesson(&mut self, chapter_id: &str, lesson_id: &str) -> bool {
        let next = self
            .document
            .with_lesson_completed(&self.curriculum, chapter_id, lesson_id);
        self.apply(next)
    }

    /// Returns `true` if the chapter was newly completed. The quiz pass mark is
    /// not checked here.
    pub fn complete_chapter(&mut self, chapter_id: &str) -> bool {
        let next = self
            .document
            .with_chapter_completed(&self.curriculum, chapter_id);
        self.apply(next)
    }

    /// Returns `true` if the quiz entry or its score changed.
    pub fn complete_quiz(&mut self, chapter_id: &str, score: Option<u8>) -> bool {
        let next = self
            .document
            .with_quiz_completed(&self.curriculum, chapter_id, score);
        self.apply(next)
    }

    /// Returns `true` if the position changed and is valid for the curriculum.
    pub fn set_last_position(&mut self, position: LastPosition) -> bool {
        let next = self
            .document
            .with_last_position(&self.curriculum, position);
        self.apply(next)
    }

    /// Wipe all progress in memory and in storage.
    pub fn reset_all(&mut self) {
        self.document = ProgressDocument::new(self.clock.now());
        match self.repo.clear() {
            Ok(()) => {
                self.last_error = None;
                tracing::info!("progress reset");
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not clear saved progress");
                self.last_error = Some(PersistenceFailure::new(PersistOperation::Clear, &err));
            }
        }
    }

    /// Write the current document. Returns `true` on success.
    pub fn save(&mut self) -> bool {
        match self.repo.save(&self.document) {
            Ok(()) => {
                self.last_error = None;
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "saving progress failed");
                self.last_error = Some(PersistenceFailure::new(PersistOperation::Save, &err));
                false
            }
        }
    }

    #[must_use]
    pub fn global_score(&self) -> u8 {
        self.document.global_score()
    }

    #[must_use]
    pub fn is_unlocked(&self, chapter_index: usize) -> bool {
        scoring::is_unlocked(
            &self.curriculum,
            self.document.completed_chapters(),
            chapter_index,
        )
    }

    #[must_use]
    pub fn stats(&self) -> ProgressStats {
        ProgressStats::compute(&self.document, &self.curriculum)
    }

    #[must_use]
    pub fn chapter_progress(&self) -> Vec<ChapterProgress> {
        ChapterProgress::compute_all(&self.document, &self.curriculum)
    }

    fn apply(&mut self, next: Option<ProgressDocument>) -> bool {
        let Some(next) = next else {
            return false;
        };
        self.document = next.touched(self.clock.now());
        self.save();
        true
    }
}
