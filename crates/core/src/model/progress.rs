use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::curriculum::Curriculum;
use crate::model::ids::{ChapterId, LessonId};
use crate::scoring::{self, PASS_THRESHOLD};

//
// ─── POSITION ──────────────────────────────────────────────────────────────────
//

/// Screen the learner was on, as persisted in `lastPosition.view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewKind {
    ChapterIntro,
    Lesson,
    Quiz,
    QuizResults,
    ChapterSummary,
    Home,
    Certificate,
}

impl ViewKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ViewKind::ChapterIntro => "chapter-intro",
            ViewKind::Lesson => "lesson",
            ViewKind::Quiz => "quiz",
            ViewKind::QuizResults => "quiz-results",
            ViewKind::ChapterSummary => "chapter-summary",
            ViewKind::Home => "home",
            ViewKind::Certificate => "certificate",
        }
    }

    /// True for the five views that live inside a chapter.
    #[must_use]
    pub fn is_in_tutorial(self) -> bool {
        !matches!(self, ViewKind::Home | ViewKind::Certificate)
    }
}

/// Resume pointer. Only the fields relevant to `view` are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastPosition {
    pub view: ViewKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<ChapterId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<LessonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz_index: Option<usize>,
}

impl LastPosition {
    fn bare(view: ViewKind, chapter_id: Option<ChapterId>) -> Self {
        Self {
            view,
            chapter_id,
            lesson_id: None,
            quiz_index: None,
        }
    }

    #[must_use]
    pub fn home() -> Self {
        Self::bare(ViewKind::Home, None)
    }

    #[must_use]
    pub fn certificate() -> Self {
        Self::bare(ViewKind::Certificate, None)
    }

    #[must_use]
    pub fn chapter_intro(chapter_id: ChapterId) -> Self {
        Self::bare(ViewKind::ChapterIntro, Some(chapter_id))
    }

    #[must_use]
    pub fn lesson(chapter_id: ChapterId, lesson_id: LessonId) -> Self {
        Self {
            lesson_id: Some(lesson_id),
            ..Self::bare(ViewKind::Lesson, Some(chapter_id))
        }
    }

    #[must_use]
    pub fn quiz(chapter_id: ChapterId, quiz_index: usize) -> Self {
        Self {
            quiz_index: Some(quiz_index),
            ..Self::bare(ViewKind::Quiz, Some(chapter_id))
        }
    }

    #[must_use]
    pub fn quiz_results(chapter_id: ChapterId) -> Self {
        Self::bare(ViewKind::QuizResults, Some(chapter_id))
    }

    #[must_use]
    pub fn chapter_summary(chapter_id: ChapterId) -> Self {
        Self::bare(ViewKind::ChapterSummary, Some(chapter_id))
    }

    /// Checks every reference against the curriculum.
    ///
    /// A referenced chapter must exist, a lesson must belong to it and a quiz
    /// index must be inside its quiz.
    #[must_use]
    pub fn is_valid_for(&self, curriculum: &Curriculum) -> bool {
        let Some(chapter_id) = &self.chapter_id else {
            return self.lesson_id.is_none() && self.quiz_index.is_none();
        };
        let Some(chapter) = curriculum.chapter_by_id(chapter_id.as_str()) else {
            return false;
        };
        let lesson_ok = self
            .lesson_id
            .as_ref()
            .is_none_or(|lesson| chapter.lesson_index(lesson.as_str()).is_some());
        let quiz_ok = self.quiz_index.is_none_or(|idx| idx < chapter.quiz().len());
        lesson_ok && quiz_ok
    }
}

impl Default for LastPosition {
    fn default() -> Self {
        Self::home()
    }
}

//
// ─── DOCUMENT ──────────────────────────────────────────────────────────────────
//

/// Raw field values used to rebuild a document from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressDraft {
    pub current_chapter: usize,
    pub current_lesson: usize,
    pub completed_lessons: BTreeSet<LessonId>,
    pub completed_chapters: BTreeSet<ChapterId>,
    pub completed_quizzes: BTreeSet<ChapterId>,
    pub quiz_scores: BTreeMap<ChapterId, u8>,
    pub last_position: LastPosition,
    pub global_score: u8,
    pub updated_at: DateTime<Utc>,
}

/// The learner's persisted progress.
///
/// Every transition is a pure function returning `Some(next)` when the
/// document changes and `None` when the request is a no-op (already applied or
/// referencing ids outside the curriculum). `global_score` is recomputed by the
/// transitions that touch completion or scores and is never set directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDocument {
    current_chapter: usize,
    current_lesson: usize,
    completed_lessons: BTreeSet<LessonId>,
    completed_chapters: BTreeSet<ChapterId>,
    completed_quizzes: BTreeSet<ChapterId>,
    quiz_scores: BTreeMap<ChapterId, u8>,
    last_position: LastPosition,
    global_score: u8,
    updated_at: DateTime<Utc>,
}

impl ProgressDocument {
    /// The empty document used on first run and after a reset.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            current_chapter: 0,
            current_lesson: 0,
            completed_lessons: BTreeSet::new(),
            completed_chapters: BTreeSet::new(),
            completed_quizzes: BTreeSet::new(),
            quiz_scores: BTreeMap::new(),
            last_position: LastPosition::home(),
            global_score: 0,
            updated_at: now,
        }
    }

    /// Rebuild a document from stored field values without further checks.
    ///
    /// Use [`ProgressDocument::reconciled`] to bring it in line with the
    /// curriculum.
    #[must_use]
    pub fn from_persisted(draft: ProgressDraft) -> Self {
        Self {
            current_chapter: draft.current_chapter,
            current_lesson: draft.current_lesson,
            completed_lessons: draft.completed_lessons,
            completed_chapters: draft.completed_chapters,
            completed_quizzes: draft.completed_quizzes,
            quiz_scores: draft
                .quiz_scores
                .into_iter()
                .map(|(id, score)| (id, score.min(100)))
                .collect(),
            last_position: draft.last_position,
            global_score: draft.global_score.min(100),
            updated_at: draft.updated_at,
        }
    }

    #[must_use]
    pub fn into_draft(self) -> ProgressDraft {
        ProgressDraft {
            current_chapter: self.current_chapter,
            current_lesson: self.current_lesson,
            completed_lessons: self.completed_lessons,
            completed_chapters: self.completed_chapters,
            completed_quizzes: self.completed_quizzes,
            quiz_scores: self.quiz_scores,
            last_position: self.last_position,
            global_score: self.global_score,
            updated_at: self.updated_at,
        }
    }

    #[must_use]
    pub fn current_chapter(&self) -> usize {
        self.current_chapter
    }

    #[must_use]
    pub fn current_lesson(&self) -> usize {
        self.current_lesson
    }

    #[must_use]
    pub fn completed_lessons(&self) -> &BTreeSet<LessonId> {
        &self.completed_lessons
    }

    #[must_use]
    pub fn completed_chapters(&self) -> &BTreeSet<ChapterId> {
        &self.completed_chapters
    }

    #[must_use]
    pub fn completed_quizzes(&self) -> &BTreeSet<ChapterId> {
        &self.completed_quizzes
    }

    #[must_use]
    pub fn quiz_scores(&self) -> &BTreeMap<ChapterId, u8> {
        &self.quiz_scores
    }

    #[must_use]
    pub fn quiz_score(&self, chapter_id: &str) -> Option<u8> {
        self.quiz_scores.get(chapter_id).copied()
    }

    #[must_use]
    pub fn last_position(&self) -> &LastPosition {
        &self.last_position
    }

    #[must_use]
    pub fn global_score(&self) -> u8 {
        self.global_score
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn is_lesson_completed(&self, lesson_id: &str) -> bool {
        self.completed_lessons.contains(lesson_id)
    }

    #[must_use]
    pub fn is_chapter_completed(&self, chapter_id: &str) -> bool {
        self.completed_chapters.contains(chapter_id)
    }

    /// Returns a copy stamped with the mutation time.
    #[must_use]
    pub fn touched(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = at;
        self
    }

    fn rescored(mut self, curriculum: &Curriculum) -> Self {
        self.global_score = scoring::global_score(&self, curriculum);
        self
    }

    /// Mark a lesson of `chapter_id` as completed.
    #[must_use]
    pub fn with_lesson_completed(
        &self,
        curriculum: &Curriculum,
        chapter_id: &str,
        lesson_id: &str,
    ) -> Option<Self> {
        let chapter = curriculum.chapter_by_id(chapter_id)?;
        let lesson = chapter.lessons().get(chapter.lesson_index(lesson_id)?)?;
        if self.completed_lessons.contains(lesson_id) {
            return None;
        }
        let mut next = self.clone();
        next.completed_lessons.insert(lesson.id().clone());
        Some(next.rescored(curriculum))
    }

    /// Record the chapter as completed. The pass threshold is not checked here.
    #[must_use]
    pub fn with_chapter_completed(&self, curriculum: &Curriculum, chapter_id: &str) -> Option<Self> {
        let chapter = curriculum.chapter_by_id(chapter_id)?;
        if self.completed_chapters.contains(chapter_id) {
            return None;
        }
        let mut next = self.clone();
        next.completed_chapters.insert(chapter.id().clone());
        Some(next.rescored(curriculum))
    }

    /// Record the chapter's quiz as taken; a given score replaces any earlier one.
    #[must_use]
    pub fn with_quiz_completed(
        &self,
        curriculum: &Curriculum,
        chapter_id: &str,
        score: Option<u8>,
    ) -> Option<Self> {
        let chapter = curriculum.chapter_by_id(chapter_id)?;
        let score = score.map(|s| s.min(100));
        let already_listed = self.completed_quizzes.contains(chapter_id);
        let same_score = score.is_none_or(|s| self.quiz_score(chapter_id) == Some(s));
        if already_listed && same_score {
            return None;
        }
        let mut next = self.clone();
        next.completed_quizzes.insert(chapter.id().clone());
        if let Some(score) = score {
            next.quiz_scores.insert(chapter.id().clone(), score);
        }
        Some(next.rescored(curriculum))
    }

    /// Replace the resume pointer and mirror it into the chapter/lesson cursors.
    ///
    /// Positions that reference anything outside the curriculum are ignored.
    #[must_use]
    pub fn with_last_position(&self, curriculum: &Curriculum, position: LastPosition) -> Option<Self> {
        if position == self.last_position || !position.is_valid_for(curriculum) {
            return None;
        }
        let mut next = self.clone();
        if let Some(chapter_id) = &position.chapter_id {
            let chapter_index = curriculum.chapter_index(chapter_id.as_str())?;
            if chapter_index != next.current_chapter {
                next.current_chapter = chapter_index;
                next.current_lesson = 0;
            }
            if let Some(lesson_id) = &position.lesson_id {
                next.current_lesson = curriculum
                    .lesson_index(chapter_id.as_str(), lesson_id.as_str())
                    .unwrap_or(0);
            }
        }
        next.last_position = position;
        Some(next)
    }

    /// Bring a loaded document in line with the live curriculum.
    ///
    /// Drops ids the curriculum no longer knows, un-completes chapters whose
    /// recorded score is under the pass mark, points an unusable resume pointer
    /// at the first chapter's intro (or home outside the tutorial), clamps the
    /// cursors and recomputes `global_score`.
    #[must_use]
    pub fn reconciled(&self, curriculum: &Curriculum) -> Self {
        let mut next = self.clone();
        next.completed_lessons
            .retain(|id| curriculum.contains_lesson(id.as_str()));
        next.completed_quizzes
            .retain(|id| curriculum.chapter_by_id(id.as_str()).is_some());
        next.quiz_scores
            .retain(|id, _| curriculum.chapter_by_id(id.as_str()).is_some());
        let scores = next.quiz_scores.clone();
        next.completed_chapters.retain(|id| {
            curriculum.chapter_by_id(id.as_str()).is_some()
                && scores.get(id).is_none_or(|s| *s >= PASS_THRESHOLD)
        });

        if !next.last_position.is_valid_for(curriculum) {
            next.last_position = match curriculum.chapters().first() {
                Some(first) if next.last_position.view.is_in_tutorial() => {
                    LastPosition::chapter_intro(first.id().clone())
                }
                _ => LastPosition::home(),
            };
        }
        if next.current_chapter >= curriculum.chapter_count() {
            next.current_chapter = 0;
            next.current_lesson = 0;
        }
        let lessons = curriculum
            .chapter_at(next.current_chapter)
            .map_or(0, |c| c.lessons().len());
        if next.current_lesson >= lessons {
            next.current_lesson = 0;
        }

        next.rescored(curriculum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::curriculum::{ChapterDraft, CurriculumDraft, LessonDraft, QuestionDraft};
    use crate::time::fixed_now;

    fn curriculum() -> Curriculum {
        let chapter = |id: &str| ChapterDraft {
            id: id.into(),
            title: id.to_uppercase(),
            lessons: vec![
                LessonDraft {
                    id: format!("{id}-l1"),
                    title: "one".into(),
                    ..LessonDraft::default()
                },
                LessonDraft {
                    id: format!("{id}-l2"),
                    title: "two".into(),
                    ..LessonDraft::default()
                },
            ],
            quiz: vec![
                QuestionDraft {
                    question: "q1".into(),
                    options: vec!["a".into(), "b".into()],
                    correct_answer: 0,
                    explanation: String::new(),
                },
                QuestionDraft {
                    question: "q2".into(),
                    options: vec!["a".into(), "b".into()],
                    correct_answer: 1,
                    explanation: String::new(),
                },
            ],
            ..ChapterDraft::default()
        };
        CurriculumDraft {
            chapters: vec![chapter("ch1"), chapter("ch2")],
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn completing_a_lesson_is_idempotent() {
        let c = curriculum();
        let doc = ProgressDocument::new(fixed_now());
        let once = doc.with_lesson_completed(&c, "ch1", "ch1-l1").unwrap();
        assert!(once.with_lesson_completed(&c, "ch1", "ch1-l1").is_none());
        assert_eq!(once.completed_lessons().len(), 1);
        assert!(once.is_lesson_completed("ch1-l1"));
        // 0.30 * 1/4 = 7.5 -> 8
        assert_eq!(once.global_score(), 8);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let c = curriculum();
        let doc = ProgressDocument::new(fixed_now());
        assert!(doc.with_lesson_completed(&c, "ch1", "ch2-l1").is_none());
        assert!(doc.with_lesson_completed(&c, "nope", "ch1-l1").is_none());
        assert!(doc.with_chapter_completed(&c, "nope").is_none());
        assert!(doc.with_quiz_completed(&c, "nope", Some(90)).is_none());
        assert!(
            doc.with_last_position(&c, LastPosition::quiz(ChapterId::new("ch1"), 5))
                .is_none()
        );
    }

    #[test]
    fn quiz_score_is_overwritten_by_latest_attempt() {
        let c = curriculum();
        let doc = ProgressDocument::new(fixed_now())
            .with_quiz_completed(&c, "ch1", Some(100))
            .unwrap()
            .with_quiz_completed(&c, "ch1", Some(80))
            .unwrap();
        assert_eq!(doc.quiz_score("ch1"), Some(80));
        assert!(doc.with_quiz_completed(&c, "ch1", Some(80)).is_none());
        assert!(doc.with_quiz_completed(&c, "ch1", None).is_none());
        assert_eq!(doc.completed_quizzes().len(), 1);
    }

    #[test]
    fn quiz_without_score_keeps_scores_empty() {
        let c = curriculum();
        let doc = ProgressDocument::new(fixed_now())
            .with_quiz_completed(&c, "ch2", None)
            .unwrap();
        assert!(doc.quiz_scores().is_empty());
        assert_eq!(doc.global_score(), 0);
    }

    #[test]
    fn last_position_updates_cursors() {
        let c = curriculum();
        let doc = ProgressDocument::new(fixed_now())
            .with_last_position(
                &c,
                LastPosition::lesson(ChapterId::new("ch2"), LessonId::new("ch2-l2")),
            )
            .unwrap();
        assert_eq!(doc.current_chapter(), 1);
        assert_eq!(doc.current_lesson(), 1);

        let doc = doc
            .with_last_position(&c, LastPosition::quiz(ChapterId::new("ch1"), 1))
            .unwrap();
        assert_eq!(doc.current_chapter(), 0);
        assert_eq!(doc.current_lesson(), 0);
        assert_eq!(doc.last_position().quiz_index, Some(1));
        assert_eq!(doc.global_score(), 0);
    }

    #[test]
    fn reconcile_drops_stale_references() {
        let c = curriculum();
        let mut draft = ProgressDocument::new(fixed_now()).into_draft();
        draft.completed_lessons = [LessonId::new("ch1-l1"), LessonId::new("gone")].into();
        draft.completed_chapters = [ChapterId::new("ch1"), ChapterId::new("ch2"), ChapterId::new("old")].into();
        draft.quiz_scores = [(ChapterId::new("ch2"), 50), (ChapterId::new("old"), 90)].into();
        draft.last_position = LastPosition::chapter_intro(ChapterId::new("old"));
        draft.current_chapter = 9;
        draft.global_score = 77;

        let doc = ProgressDocument::from_persisted(draft).reconciled(&c);
        assert_eq!(doc.completed_lessons().len(), 1);
        assert_eq!(
            doc.completed_chapters().iter().collect::<Vec<_>>(),
            vec![&ChapterId::new("ch1")]
        );
        assert_eq!(doc.quiz_scores().len(), 1);
        assert_eq!(
            doc.last_position(),
            &LastPosition::chapter_intro(ChapterId::new("ch1"))
        );
        assert_eq!(doc.current_chapter(), 0);
        assert_eq!(doc.global_score(), scoring::global_score(&doc, &c));
    }

    #[test]
    fn position_serializes_only_relevant_fields() {
        let json = serde_json::to_value(LastPosition::quiz(ChapterId::new("ch1"), 1)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"view": "quiz", "chapterId": "ch1", "quizIndex": 1})
        );
        let home = serde_json::to_value(LastPosition::home()).unwrap();
        assert_eq!(home, serde_json::json!({"view": "home"}));
    }

    #[test]
    fn view_kind_classification() {
        assert!(ViewKind::QuizResults.is_in_tutorial());
        assert!(!ViewKind::Certificate.is_in_tutorial());
        assert_eq!(ViewKind::ChapterSummary.as_str(), "chapter-summary");
    }
}
