use std::sync::Arc;

use chrono::{DateTime, Utc};
use storage::curriculum::curriculum_from_json;
use storage::{FileStore, KeyValueStore, ProgressRepository};
use tutor_core::Clock;
use tutor_core::model::{ChapterProgress, Curriculum, ProgressDocument, ProgressStats};

use crate::autosave::AutosaveTimer;
use crate::config::TutorConfig;
use crate::error::{NavigationError, PersistenceFailure, SessionError};
use crate::menu::{MenuItem, build_menu};
use crate::navigation::{Navigator, TutorView};
use crate::progress_service::ProgressStore;

/// Root object for one learner's tutorial run.
///
/// Owns the progress store, the navigator and the autosave timer. The host
/// forwards user intents to the methods below, calls [`TutorSession::tick`]
/// from its timer, and calls [`TutorSession::shutdown`] (or drops the
/// session) on exit.
///
/// Rejected intents come back as `NavigationError` and leave everything
/// unchanged; the UI is free to ignore them.
pub struct TutorSession {
    store: ProgressStore,
    nav: Navigator,
    autosave: AutosaveTimer,
    clock: Clock,
    closed: bool,
}

impl TutorSession {
    /// Load progress for `curriculum` from `kv` and resume where the learner
    /// left off.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if the configuration is invalid.
    pub fn open(
        curriculum: Arc<Curriculum>,
        kv: Arc<dyn KeyValueStore>,
        config: TutorConfig,
        clock: Clock,
    ) -> Result<Self, SessionError> {
        let config = config.validate()?;
        let repo = ProgressRepository::new(kv, clock).with_key(config.storage_key.as_str());
        let mut store = ProgressStore::open(curriculum, repo);
        let nav = Navigator::resume(&mut store);
        let autosave = AutosaveTimer::new(config.autosave_interval(), clock.now());

        tracing::info!(
            key = %config.storage_key,
            view = nav.view().as_str(),
            global_score = store.global_score(),
            "tutor session opened"
        );

        Ok(Self {
            store,
            nav,
            autosave,
            clock,
            closed: false,
        })
    }

    /// Parse a curriculum from JSON and open a session backed by files in
    /// `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if no data directory is configured, the
    /// storage key is not a valid file name, the directory cannot be
    /// created, or the curriculum is invalid.
    pub fn open_in_dir(
        curriculum_json: &str,
        config: TutorConfig,
        clock: Clock,
    ) -> Result<Self, SessionError> {
        let config = config.validate()?;
        let dir = config.data_dir.clone().ok_or(SessionError::MissingDataDir)?;
        FileStore::check_key(&config.storage_key)?;
        let curriculum = curriculum_from_json(curriculum_json)?;
        let kv = FileStore::open(dir)?;
        tracing::debug!(dir = %kv.dir().display(), "progress stored in files");
        Self::open(Arc::new(curriculum), Arc::new(kv), config, clock)
    }

    //
    // ─── READS ─────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn view(&self) -> TutorView<'_> {
        TutorView::resolve(&self.nav, &self.store)
    }

    #[must_use]
    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressStore {
        &self.store
    }

    #[must_use]
    pub fn document(&self) -> &ProgressDocument {
        self.store.document()
    }

    #[must_use]
    pub fn curriculum(&self) -> &Curriculum {
        self.store.curriculum()
    }

    #[must_use]
    pub fn stats(&self) -> ProgressStats {
        self.store.stats()
    }

    #[must_use]
    pub fn chapter_progress(&self) -> Vec<ChapterProgress> {
        self.store.chapter_progress()
    }

    #[must_use]
    pub fn menu(&self) -> Vec<MenuItem> {
        build_menu(&self.store)
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&PersistenceFailure> {
        self.store.last_error()
    }

    pub fn clear_error(&mut self) {
        self.store.clear_error();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    //
    // ─── INTENTS ───────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// See [`Navigator::start_chapter`].
    pub fn start_chapter(&mut self, chapter_id: &str) -> Result<(), NavigationError> {
        self.navigate("start_chapter", |nav, store| nav.start_chapter(store, chapter_id))
    }

    /// # Errors
    ///
    /// See [`Navigator::open_chapter`].
    pub fn open_chapter(&mut self, chapter_id: &str) -> Result<(), NavigationError> {
        self.navigate("open_chapter", |nav, store| nav.open_chapter(store, chapter_id))
    }

    /// # Errors
    ///
    /// See [`Navigator::show_chapter_intro`].
    pub fn show_chapter_intro(&mut self) -> Result<(), NavigationError> {
        self.navigate("show_chapter_intro", Navigator::show_chapter_intro)
    }

    /// # Errors
    ///
    /// `SessionClosed` after shutdown.
    pub fn go_home(&mut self) -> Result<(), NavigationError> {
        self.navigate("go_home", |nav, store| {
            nav.go_home(store);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// See [`Navigator::complete_current_lesson`].
    pub fn complete_current_lesson(&mut self) -> Result<(), NavigationError> {
        self.navigate("complete_current_lesson", Navigator::complete_current_lesson)
    }

    /// # Errors
    ///
    /// See [`Navigator::submit_quiz_answer`].
    pub fn submit_quiz_answer(&mut self, selected: usize) -> Result<(), NavigationError> {
        self.navigate("submit_quiz_answer", |nav, store| {
            nav.submit_quiz_answer(store, selected)
        })
    }

    /// # Errors
    ///
    /// See [`Navigator::retry_quiz`].
    pub fn retry_quiz(&mut self) -> Result<(), NavigationError> {
        self.navigate("retry_quiz", Navigator::retry_quiz)
    }

    /// # Errors
    ///
    /// See [`Navigator::review_lesson`].
    pub fn review_lesson(&mut self) -> Result<(), NavigationError> {
        self.navigate("review_lesson", Navigator::review_lesson)
    }

    /// # Errors
    ///
    /// See [`Navigator::continue_to_next_chapter`].
    pub fn continue_to_next_chapter(&mut self) -> Result<(), NavigationError> {
        self.navigate("continue_to_next_chapter", Navigator::continue_to_next_chapter)
    }

    /// # Errors
    ///
    /// `SessionClosed` after shutdown.
    pub fn go_to_last_position(&mut self) -> Result<(), NavigationError> {
        self.navigate("go_to_last_position", |nav, store| {
            nav.go_to_last_position(store);
            Ok(())
        })
    }

    /// Erase all progress, in memory and in storage, and return home.
    ///
    /// # Errors
    ///
    /// `SessionClosed` after shutdown.
    pub fn reset_progress(&mut self) -> Result<(), NavigationError> {
        self.navigate("reset_progress", |nav, store| {
            store.reset_all();
            nav.reset();
            Ok(())
        })
    }

    /// Act on a sidebar selection. `Auth` and `Dashboard` are rendered by the
    /// host and do not move the navigator.
    ///
    /// # Errors
    ///
    /// Same as the intent the item maps to.
    pub fn select_menu_item(&mut self, item: &MenuItem) -> Result<(), NavigationError> {
        match item {
            MenuItem::Home => self.go_home(),
            MenuItem::Auth | MenuItem::Dashboard => self.ensure_open(),
            MenuItem::Chapter { id, .. } => self.open_chapter(id.as_str()),
            MenuItem::Activity { chapter_id, .. } => self.open_chapter(chapter_id.as_str()),
        }
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────────
    //

    /// Autosave if the interval has elapsed on the session clock.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now();
        self.tick_at(now)
    }

    /// Autosave if the interval has elapsed at `now`. Returns `true` when a
    /// save was attempted.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> bool {
        if self.closed || !self.autosave.fire_if_due(now) {
            return false;
        }
        tracing::debug!("autosave");
        self.store.save();
        true
    }

    /// Stop the autosave timer and write the document one last time.
    /// Returns `true` if the final save succeeded. Later calls do nothing.
    pub fn shutdown(&mut self) -> bool {
        if self.closed {
            return true;
        }
        self.closed = true;
        self.autosave.cancel();
        let saved = self.store.save();
        tracing::info!(saved, "tutor session closed");
        saved
    }

    fn ensure_open(&self) -> Result<(), NavigationError> {
        if self.closed {
            Err(NavigationError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn navigate(
        &mut self,
        action: &'static str,
        step: impl FnOnce(&mut Navigator, &mut ProgressStore) -> Result<(), NavigationError>,
    ) -> Result<(), NavigationError> {
        let result = self
            .ensure_open()
            .and_then(|()| step(&mut self.nav, &mut self.store));
        if let Err(err) = &result {
            tracing::debug!(action, error = %err, "navigation request ignored");
        }
        result
    }
}

impl Drop for TutorSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
