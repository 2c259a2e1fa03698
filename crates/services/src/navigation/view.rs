use tutor_core::model::{Chapter, Lesson, QuizQuestion, ViewKind};

use super::machine::Navigator;
use super::quiz::QuizResult;
use crate::progress_service::ProgressStore;

/// Everything a renderer needs for the current screen, borrowed from the
/// curriculum and the navigator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TutorView<'a> {
    Home,
    ChapterIntro {
        chapter: &'a Chapter,
        index: usize,
    },
    Lesson {
        chapter: &'a Chapter,
        lesson: &'a Lesson,
        index: usize,
        total: usize,
    },
    Quiz {
        chapter: &'a Chapter,
        question: &'a QuizQuestion,
        index: usize,
        total: usize,
        answered: usize,
    },
    QuizResults {
        chapter: &'a Chapter,
        result: Option<&'a QuizResult>,
    },
    ChapterSummary {
        chapter: &'a Chapter,
        score: Option<u8>,
        has_next: bool,
    },
    Certificate {
        global_score: u8,
    },
}

impl<'a> TutorView<'a> {
    /// Snapshot of the navigator's screen. Cursors that do not resolve show
    /// the home screen.
    #[must_use]
    pub fn resolve(nav: &'a Navigator, store: &'a ProgressStore) -> Self {
        let curriculum = store.curriculum();
        let Some(chapter) = curriculum.chapter_at(nav.chapter_index()) else {
            return match nav.view() {
                ViewKind::Certificate => Self::Certificate {
                    global_score: store.global_score(),
                },
                _ => Self::Home,
            };
        };

        match nav.view() {
            ViewKind::Home => Self::Home,
            ViewKind::Certificate => Self::Certificate {
                global_score: store.global_score(),
            },
            ViewKind::ChapterIntro => Self::ChapterIntro {
                chapter,
                index: nav.chapter_index(),
            },
            ViewKind::Lesson => match chapter.lesson_at(nav.lesson_index()) {
                Some(lesson) => Self::Lesson {
                    chapter,
                    lesson,
                    index: nav.lesson_index(),
                    total: chapter.lessons().len(),
                },
                None => Self::Home,
            },
            ViewKind::Quiz => match chapter.question_at(nav.quiz_index()) {
                Some(question) => Self::Quiz {
                    chapter,
                    question,
                    index: nav.quiz_index(),
                    total: chapter.quiz().len(),
                    answered: nav.attempt().answers().len(),
                },
                None => Self::Home,
            },
            ViewKind::QuizResults => Self::QuizResults {
                chapter,
                result: nav
                    .last_result()
                    .filter(|r| &r.chapter_id == chapter.id()),
            },
            ViewKind::ChapterSummary => Self::ChapterSummary {
                chapter,
                score: store.document().quiz_score(chapter.id().as_str()),
                has_next: nav.chapter_index() + 1 < curriculum.chapter_count(),
            },
        }
    }

    #[must_use]
    pub fn is_home(&self) -> bool {
        matches!(self, Self::Home)
    }
}
