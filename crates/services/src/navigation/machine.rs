use tutor_core::model::{Chapter, ChapterId, Curriculum, LastPosition, ViewKind};

use super::quiz::{QuizAttempt, QuizResult};
use crate::error::NavigationError;
use crate::progress_service::ProgressStore;

//
// ─── NAVIGATOR ─────────────────────────────────────────────────────────────────
//

/// View state machine for the tutorial.
///
/// ```text
/// chapter-intro -> lesson 0..L -> quiz 0..M -> (pass) chapter-summary -> next chapter-intro | certificate
///                                          \-> (fail) lesson 0
/// ```
///
/// Every method either applies a transition and records the destination as the
/// store's `lastPosition`, or returns a `NavigationError` and leaves both the
/// navigator and the store untouched. Cursors are always checked against the
/// curriculum before use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    view: ViewKind,
    chapter_index: usize,
    lesson_index: usize,
    quiz_index: usize,
    attempt: QuizAttempt,
    last_result: Option<QuizResult>,
}

impl Navigator {
    /// Rebuild the navigator from the store's `lastPosition`.
    ///
    /// In-tutorial positions that no longer resolve (unknown chapter or lesson,
    /// quiz index past the end, locked chapter) restart at chapter 0's intro;
    /// `home`, `certificate` and anything else land on the home screen.
    #[must_use]
    pub fn resume(store: &mut ProgressStore) -> Self {
        let mut nav = Self {
            view: ViewKind::Home,
            chapter_index: 0,
            lesson_index: 0,
            quiz_index: 0,
            attempt: QuizAttempt::new(),
            last_result: None,
        };
        nav.restore(store);
        nav
    }

    #[must_use]
    pub fn view(&self) -> ViewKind {
        self.view
    }

    #[must_use]
    pub fn chapter_index(&self) -> usize {
        self.chapter_index
    }

    #[must_use]
    pub fn lesson_index(&self) -> usize {
        self.lesson_index
    }

    #[must_use]
    pub fn quiz_index(&self) -> usize {
        self.quiz_index
    }

    /// Answers given so far in the current (or just finished) attempt.
    #[must_use]
    pub fn attempt(&self) -> &QuizAttempt {
        &self.attempt
    }

    /// Result of the most recently finished quiz, if it is still relevant.
    #[must_use]
    pub fn last_result(&self) -> Option<&QuizResult> {
        self.last_result.as_ref()
    }

    /// Jump back to wherever the store says the learner was.
    pub fn go_to_last_position(&mut self, store: &mut ProgressStore) {
        self.restore(store);
    }

    /// Begin an unlocked chapter at its first lesson.
    ///
    /// # Errors
    ///
    /// `UnknownChapter` or `LockedChapter`.
    pub fn start_chapter(
        &mut self,
        store: &mut ProgressStore,
        chapter_id: &str,
    ) -> Result<(), NavigationError> {
        let index = unlocked_index(store, chapter_id)?;
        self.clear_quiz_state();
        self.enter(store, ViewKind::Lesson, index, 0, 0);
        Ok(())
    }

    /// Show the overview of any unlocked chapter.
    ///
    /// # Errors
    ///
    /// `UnknownChapter` or `LockedChapter`.
    pub fn open_chapter(
        &mut self,
        store: &mut ProgressStore,
        chapter_id: &str,
    ) -> Result<(), NavigationError> {
        let index = unlocked_index(store, chapter_id)?;
        self.open_intro(store, index);
        Ok(())
    }

    /// Return to the current chapter's overview.
    ///
    /// # Errors
    ///
    /// `LockedChapter` if the current chapter is not open, `OutOfRange` if the
    /// cursor does not point at a chapter.
    pub fn show_chapter_intro(&mut self, store: &mut ProgressStore) -> Result<(), NavigationError> {
        let chapter = current_chapter(store.curriculum(), self.chapter_index)?;
        if !store.is_unlocked(self.chapter_index) {
            return Err(NavigationError::LockedChapter(chapter.id().clone()));
        }
        self.open_intro(store, self.chapter_index);
        Ok(())
    }

    /// Leave the tutorial for the landing screen. Any quiz in progress is
    /// abandoned.
    pub fn go_home(&mut self, store: &mut ProgressStore) {
        self.clear_quiz_state();
        self.enter(store, ViewKind::Home, self.chapter_index, 0, 0);
    }

    /// Mark the current lesson complete and move to the next lesson, or to
    /// the first quiz question after the last lesson.
    ///
    /// # Errors
    ///
    /// `WrongView` outside a lesson, `OutOfRange` for a stale cursor.
    pub fn complete_current_lesson(
        &mut self,
        store: &mut ProgressStore,
    ) -> Result<(), NavigationError> {
        self.expect_view(ViewKind::Lesson)?;
        let (chapter_id, lesson_id, lesson_count) = {
            let chapter = current_chapter(store.curriculum(), self.chapter_index)?;
            let lesson = chapter
                .lesson_at(self.lesson_index)
                .ok_or(NavigationError::OutOfRange)?;
            (chapter.id().clone(), lesson.id().clone(), chapter.lessons().len())
        };

        store.complete_lesson(chapter_id.as_str(), lesson_id.as_str());
        if self.lesson_index + 1 < lesson_count {
            self.enter(
                store,
                ViewKind::Lesson,
                self.chapter_index,
                self.lesson_index + 1,
                0,
            );
        } else {
            self.begin_quiz(store);
        }
        Ok(())
    }

    /// Answer the current question with option `selected`.
    ///
    /// After the last question the attempt is scored. A pass (>= 80%) records
    /// the chapter and quiz in the store and moves to the chapter summary; a
    /// fail records nothing and sends the learner back to lesson 0.
    ///
    /// # Errors
    ///
    /// `WrongView` outside a quiz, `AnswerOutOfRange` for an invalid option,
    /// `OutOfRange` for a stale cursor.
    pub fn submit_quiz_answer(
        &mut self,
        store: &mut ProgressStore,
        selected: usize,
    ) -> Result<(), NavigationError> {
        self.expect_view(ViewKind::Quiz)?;
        let (chapter_id, question, was_correct, total) = {
            let chapter = current_chapter(store.curriculum(), self.chapter_index)?;
            let question = chapter
                .question_at(self.quiz_index)
                .ok_or(NavigationError::OutOfRange)?;
            let options = question.options().len();
            if selected >= options {
                return Err(NavigationError::AnswerOutOfRange { selected, options });
            }
            (
                chapter.id().clone(),
                question.question().to_owned(),
                question.is_correct(selected),
                chapter.quiz().len(),
            )
        };

        self.attempt
            .record_answer(self.quiz_index, &question, was_correct);
        if self.quiz_index + 1 < total {
            self.enter(store, ViewKind::Quiz, self.chapter_index, 0, self.quiz_index + 1);
        } else {
            self.finish_quiz(store, chapter_id, total);
        }
        Ok(())
    }

    /// Start a fresh attempt at question 0 after a failed quiz.
    ///
    /// # Errors
    ///
    /// `NothingToRetry` unless the current chapter's latest result is a fail
    /// (or the learner resumed on the results screen of an unfinished chapter).
    pub fn retry_quiz(&mut self, store: &mut ProgressStore) -> Result<(), NavigationError> {
        let chapter = current_chapter(store.curriculum(), self.chapter_index)?;
        let retryable = match &self.last_result {
            Some(result) => !result.passed && &result.chapter_id == chapter.id(),
            None => {
                self.view == ViewKind::QuizResults
                    && !store.document().is_chapter_completed(chapter.id().as_str())
            }
        };
        if !retryable {
            return Err(NavigationError::NothingToRetry);
        }
        self.begin_quiz(store);
        Ok(())
    }

    /// Go back to lesson 0 of the quizzed chapter without touching progress.
    ///
    /// # Errors
    ///
    /// `WrongView` unless a quiz result for the current chapter is on hand.
    pub fn review_lesson(&mut self, store: &mut ProgressStore) -> Result<(), NavigationError> {
        let chapter = current_chapter(store.curriculum(), self.chapter_index)?;
        let has_result = self
            .last_result
            .as_ref()
            .is_some_and(|r| &r.chapter_id == chapter.id());
        if self.view != ViewKind::QuizResults && !has_result {
            return Err(NavigationError::WrongView(self.view));
        }
        self.enter(store, ViewKind::Lesson, self.chapter_index, 0, 0);
        Ok(())
    }

    /// Leave the chapter summary for the next chapter's intro, or for the
    /// certificate after the final chapter.
    ///
    /// # Errors
    ///
    /// `WrongView` outside the chapter summary, `LockedChapter` if the next
    /// chapter is still locked.
    pub fn continue_to_next_chapter(
        &mut self,
        store: &mut ProgressStore,
    ) -> Result<(), NavigationError> {
        self.expect_view(ViewKind::ChapterSummary)?;
        let next = self.chapter_index + 1;
        match store.curriculum().chapter_at(next) {
            None => {
                self.clear_quiz_state();
                self.enter(store, ViewKind::Certificate, self.chapter_index, 0, 0);
            }
            Some(chapter) => {
                if !store.is_unlocked(next) {
                    return Err(NavigationError::LockedChapter(chapter.id().clone()));
                }
                self.clear_quiz_state();
                self.enter(store, ViewKind::ChapterIntro, next, 0, 0);
            }
        }
        Ok(())
    }

    /// Forget all session state after the store has been reset.
    pub fn reset(&mut self) {
        self.view = ViewKind::Home;
        self.chapter_index = 0;
        self.lesson_index = 0;
        self.quiz_index = 0;
        self.clear_quiz_state();
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn expect_view(&self, view: ViewKind) -> Result<(), NavigationError> {
        if self.view == view {
            Ok(())
        } else {
            Err(NavigationError::WrongView(self.view))
        }
    }

    fn clear_quiz_state(&mut self) {
        self.attempt = QuizAttempt::new();
        self.last_result = None;
    }

    fn open_intro(&mut self, store: &mut ProgressStore, index: usize) {
        if index != self.chapter_index {
            self.last_result = None;
        }
        self.attempt = QuizAttempt::new();
        self.enter(store, ViewKind::ChapterIntro, index, 0, 0);
    }

    fn begin_quiz(&mut self, store: &mut ProgressStore) {
        self.clear_quiz_state();
        self.enter(store, ViewKind::Quiz, self.chapter_index, 0, 0);
    }

    fn finish_quiz(&mut self, store: &mut ProgressStore, chapter_id: ChapterId, total: usize) {
        let result = QuizResult::from_attempt(chapter_id, &self.attempt, total);
        self.view = ViewKind::QuizResults;
        tracing::info!(
            chapter = %result.chapter_id,
            score = result.score,
            passed = result.passed,
            "quiz finished"
        );

        if result.passed {
            store.complete_chapter(result.chapter_id.as_str());
            store.complete_quiz(result.chapter_id.as_str(), Some(result.score));
            self.enter(store, ViewKind::ChapterSummary, self.chapter_index, 0, 0);
        } else {
            self.enter(store, ViewKind::Lesson, self.chapter_index, 0, 0);
        }
        self.last_result = Some(result);
    }

    fn enter(
        &mut self,
        store: &mut ProgressStore,
        view: ViewKind,
        chapter_index: usize,
        lesson_index: usize,
        quiz_index: usize,
    ) {
        self.view = view;
        self.chapter_index = chapter_index;
        self.lesson_index = lesson_index;
        self.quiz_index = quiz_index;
        if let Some(position) = self.position(store.curriculum()) {
            store.set_last_position(position);
        }
    }

    /// The resume pointer for the current state, with only the fields the
    /// view needs.
    fn position(&self, curriculum: &Curriculum) -> Option<LastPosition> {
        let chapter = curriculum.chapter_at(self.chapter_index);
        let chapter_id = || chapter.map(|c| c.id().clone());
        match self.view {
            ViewKind::Home => Some(LastPosition::home()),
            ViewKind::Certificate => Some(LastPosition::certificate()),
            ViewKind::ChapterIntro => chapter_id().map(LastPosition::chapter_intro),
            ViewKind::Lesson => {
                let chapter = chapter?;
                let lesson = chapter.lesson_at(self.lesson_index)?;
                Some(LastPosition::lesson(chapter.id().clone(), lesson.id().clone()))
            }
            ViewKind::Quiz => chapter_id().map(|id| LastPosition::quiz(id, self.quiz_index)),
            ViewKind::QuizResults => chapter_id().map(LastPosition::quiz_results),
            ViewKind::ChapterSummary => chapter_id().map(LastPosition::chapter_summary),
        }
    }

    fn restore(&mut self, store: &mut ProgressStore) {
        let position = store.document().last_position().clone();
        self.clear_quiz_state();
        self.lesson_index = 0;
        self.quiz_index = 0;

        if !position.view.is_in_tutorial() {
            self.view = ViewKind::Home;
            let current = store.document().current_chapter();
            self.chapter_index = if current < store.curriculum().chapter_count() {
                current
            } else {
                0
            };
            return;
        }

        match locate(store, &position) {
            Some((chapter_index, lesson_index, quiz_index)) => {
                self.view = position.view;
                self.chapter_index = chapter_index;
                self.lesson_index = lesson_index;
                self.quiz_index = quiz_index;
            }
            None => {
                tracing::debug!(
                    view = position.view.as_str(),
                    "saved position does not resolve, restarting at the first chapter"
                );
                self.enter(store, ViewKind::ChapterIntro, 0, 0, 0);
            }
        }
    }
}

fn current_chapter(curriculum: &Curriculum, index: usize) -> Result<&Chapter, NavigationError> {
    curriculum
        .chapter_at(index)
        .ok_or(NavigationError::OutOfRange)
}

fn unlocked_index(store: &ProgressStore, chapter_id: &str) -> Result<usize, NavigationError> {
    let index = store
        .curriculum()
        .chapter_index(chapter_id)
        .ok_or_else(|| NavigationError::UnknownChapter(chapter_id.to_owned()))?;
    if !store.is_unlocked(index) {
        return Err(NavigationError::LockedChapter(ChapterId::new(chapter_id)));
    }
    Ok(index)
}

/// Resolve an in-tutorial position to `(chapter, lesson, quiz)` cursors.
fn locate(store: &ProgressStore, position: &LastPosition) -> Option<(usize, usize, usize)> {
    let curriculum = store.curriculum();
    let chapter_index = curriculum.chapter_index(position.chapter_id.as_ref()?.as_str())?;
    if !store.is_unlocked(chapter_index) {
        return None;
    }
    let chapter = curriculum.chapter_at(chapter_index)?;
    match position.view {
        ViewKind::Lesson => {
            let lesson_index = chapter.lesson_index(position.lesson_id.as_ref()?.as_str())?;
            Some((chapter_index, lesson_index, 0))
        }
        ViewKind::Quiz => {
            let quiz_index = position.quiz_index?;
            (quiz_index < chapter.quiz().len()).then_some((chapter_index, 0, quiz_index))
        }
        ViewKind::ChapterSummary => store
            .document()
            .is_chapter_completed(chapter.id().as_str())
            .then_some((chapter_index, 0, 0)),
        _ => Some((chapter_index, 0, 0)),
    }
}
