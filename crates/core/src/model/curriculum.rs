use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::model::ids::{ChapterId, LessonId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CurriculumError {
    #[error("curriculum has no chapters")]
    NoChapters,

    #[error("chapter id cannot be empty (chapter #{index})")]
    EmptyChapterId { index: usize },

    #[error("duplicate chapter id: {0}")]
    DuplicateChapter(ChapterId),

    #[error("chapter {0} has no lessons")]
    NoLessons(ChapterId),

    #[error("chapter {0} has no quiz questions")]
    NoQuestions(ChapterId),

    #[error("lesson id cannot be empty in chapter {chapter} (lesson #{index})")]
    EmptyLessonId { chapter: ChapterId, index: usize },

    #[error("duplicate lesson id {lesson} in chapter {chapter}")]
    DuplicateLesson { chapter: ChapterId, lesson: LessonId },

    #[error("lesson id {lesson} is used by both {first} and {second}")]
    LessonInSeveralChapters {
        lesson: LessonId,
        first: ChapterId,
        second: ChapterId,
    },

    #[error("question #{index} of chapter {chapter} needs at least two options")]
    TooFewOptions { chapter: ChapterId, index: usize },

    #[error("question #{index} of chapter {chapter} has correct answer {answer} out of range")]
    CorrectAnswerOutOfRange {
        chapter: ChapterId,
        index: usize,
        answer: usize,
    },
}

//
// ─── DRAFTS ────────────────────────────────────────────────────────────────────
//

/// Unvalidated curriculum as authored in the static dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumDraft {
    pub chapters: Vec<ChapterDraft>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDraft {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub lessons: Vec<LessonDraft>,
    pub quiz: Vec<QuestionDraft>,
    #[serde(default)]
    pub objectives: Vec<String>,
    #[serde(default)]
    pub estimated_minutes: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub code_sample: Option<String>,
    #[serde(default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

impl CurriculumDraft {
    /// Validate the draft into an immutable curriculum.
    ///
    /// # Errors
    ///
    /// Returns `CurriculumError` when an id is empty or duplicated, a chapter has
    /// no lessons or questions, or a question's answer key is out of range.
    /// Lesson ids must be unique across the whole curriculum; progress stores
    /// completed lessons by bare id.
    pub fn validate(self) -> Result<Curriculum, CurriculumError> {
        if self.chapters.is_empty() {
            return Err(CurriculumError::NoChapters);
        }

        let mut seen = HashSet::new();
        let mut lesson_owners: HashMap<LessonId, ChapterId> = HashMap::new();
        let mut chapters = Vec::with_capacity(self.chapters.len());
        for (index, draft) in self.chapters.into_iter().enumerate() {
            let id = draft.id.trim();
            if id.is_empty() {
                return Err(CurriculumError::EmptyChapterId { index });
            }
            let id = ChapterId::new(id);
            if !seen.insert(id.clone()) {
                return Err(CurriculumError::DuplicateChapter(id));
            }
            let chapter = draft.validate_with_id(id)?;
            for lesson in &chapter.lessons {
                if let Some(first) = lesson_owners.insert(lesson.id.clone(), chapter.id.clone()) {
                    return Err(CurriculumError::LessonInSeveralChapters {
                        lesson: lesson.id.clone(),
                        first,
                        second: chapter.id.clone(),
                    });
                }
            }
            chapters.push(chapter);
        }

        Ok(Curriculum { chapters })
    }
}

impl ChapterDraft {
    fn validate_with_id(self, id: ChapterId) -> Result<Chapter, CurriculumError> {
        if self.lessons.is_empty() {
            return Err(CurriculumError::NoLessons(id));
        }
        if self.quiz.is_empty() {
            return Err(CurriculumError::NoQuestions(id));
        }

        let mut seen = HashSet::new();
        let mut lessons = Vec::with_capacity(self.lessons.len());
        for (index, lesson) in self.lessons.into_iter().enumerate() {
            let lesson_id = lesson.id.trim();
            if lesson_id.is_empty() {
                return Err(CurriculumError::EmptyLessonId {
                    chapter: id,
                    index,
                });
            }
            let lesson_id = LessonId::new(lesson_id);
            if !seen.insert(lesson_id.clone()) {
                return Err(CurriculumError::DuplicateLesson {
                    chapter: id,
                    lesson: lesson_id,
                });
            }
            lessons.push(Lesson {
                id: lesson_id,
                title: lesson.title,
                content: lesson.content,
                code_sample: normalize_optional(lesson.code_sample),
                image_ref: normalize_optional(lesson.image_ref),
                duration_minutes: lesson.duration_minutes,
            });
        }

        let mut quiz = Vec::with_capacity(self.quiz.len());
        for (index, question) in self.quiz.into_iter().enumerate() {
            if question.options.len() < 2 {
                return Err(CurriculumError::TooFewOptions { chapter: id, index });
            }
            if question.correct_answer >= question.options.len() {
                return Err(CurriculumError::CorrectAnswerOutOfRange {
                    chapter: id,
                    index,
                    answer: question.correct_answer,
                });
            }
            quiz.push(QuizQuestion {
                question: question.question,
                options: question.options,
                correct_answer: question.correct_answer,
                explanation: question.explanation,
            });
        }

        Ok(Chapter {
            id,
            title: self.title,
            description: self.description,
            lessons,
            quiz,
            objectives: self.objectives,
            estimated_minutes: self.estimated_minutes,
        })
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|val| !val.trim().is_empty())
}

//
// ─── CURRICULUM ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    title: String,
    content: String,
    code_sample: Option<String>,
    image_ref: Option<String>,
    duration_minutes: u32,
}

impl Lesson {
    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    #[must_use]
    pub fn code_sample(&self) -> Option<&str> {
        self.code_sample.as_deref()
    }

    #[must_use]
    pub fn image_ref(&self) -> Option<&str> {
        self.image_ref.as_deref()
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}

/// A multiple-choice question; `correct_answer` always indexes into `options`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: usize,
    explanation: String,
}

impl QuizQuestion {
    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.correct_answer
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    #[must_use]
    pub fn is_correct(&self, selected: usize) -> bool {
        selected == self.correct_answer
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    id: ChapterId,
    title: String,
    description: String,
    lessons: Vec<Lesson>,
    quiz: Vec<QuizQuestion>,
    objectives: Vec<String>,
    estimated_minutes: u32,
}

impl Chapter {
    #[must_use]
    pub fn id(&self) -> &ChapterId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn quiz(&self) -> &[QuizQuestion] {
        &self.quiz
    }

    #[must_use]
    pub fn objectives(&self) -> &[String] {
        &self.objectives
    }

    #[must_use]
    pub fn estimated_minutes(&self) -> u32 {
        self.estimated_minutes
    }

    #[must_use]
    pub fn lesson_at(&self, index: usize) -> Option<&Lesson> {
        self.lessons.get(index)
    }

    #[must_use]
    pub fn question_at(&self, index: usize) -> Option<&QuizQuestion> {
        self.quiz.get(index)
    }

    #[must_use]
    pub fn lesson_index(&self, lesson_id: &str) -> Option<usize> {
        self.lessons.iter().position(|l| l.id.as_str() == lesson_id)
    }
}

/// The static, validated course content. Never mutated after construction.
///
/// Lookups by id or index return `None` for anything outside the curriculum;
/// callers decide whether that is a no-op or a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Curriculum {
    chapters: Vec<Chapter>,
}

impl Curriculum {
    #[must_use]
    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    #[must_use]
    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    #[must_use]
    pub fn chapter_at(&self, index: usize) -> Option<&Chapter> {
        self.chapters.get(index)
    }

    #[must_use]
    pub fn chapter_by_id(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id.as_str() == id)
    }

    #[must_use]
    pub fn chapter_index(&self, id: &str) -> Option<usize> {
        self.chapters.iter().position(|c| c.id.as_str() == id)
    }

    #[must_use]
    pub fn lesson_count(&self, chapter_id: &str) -> Option<usize> {
        self.chapter_by_id(chapter_id).map(|c| c.lessons.len())
    }

    /// Sum of lessons across all chapters.
    #[must_use]
    pub fn total_lesson_count(&self) -> usize {
        self.chapters.iter().map(|c| c.lessons.len()).sum()
    }

    #[must_use]
    pub fn quiz_length(&self, chapter_id: &str) -> Option<usize> {
        self.chapter_by_id(chapter_id).map(|c| c.quiz.len())
    }

    #[must_use]
    pub fn lesson_index(&self, chapter_id: &str, lesson_id: &str) -> Option<usize> {
        self.chapter_by_id(chapter_id)
            .and_then(|c| c.lesson_index(lesson_id))
    }

    /// True if any chapter holds a lesson with this id.
    #[must_use]
    pub fn contains_lesson(&self, lesson_id: &str) -> bool {
        self.chapters
            .iter()
            .any(|c| c.lesson_index(lesson_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: usize) -> QuestionDraft {
        QuestionDraft {
            question: "What does `git init` do?".into(),
            options: vec!["Creates a repository".into(), "Deletes history".into()],
            correct_answer: correct,
            explanation: "It initialises an empty repository.".into(),
        }
    }

    fn lesson(id: &str) -> LessonDraft {
        LessonDraft {
            id: id.into(),
            title: format!("Lesson {id}"),
            content: "body".into(),
            code_sample: Some("git status".into()),
            image_ref: Some("   ".into()),
            duration_minutes: 5,
        }
    }

    fn chapter(id: &str) -> ChapterDraft {
        ChapterDraft {
            id: id.into(),
            title: format!("Chapter {id}"),
            description: String::new(),
            lessons: vec![lesson(&format!("{id}-l1")), lesson(&format!("{id}-l2"))],
            quiz: vec![question(0)],
            objectives: vec!["Understand repositories".into()],
            estimated_minutes: 15,
        }
    }

    #[test]
    fn validates_and_exposes_accessors() {
        let curriculum = CurriculumDraft {
            chapters: vec![chapter("ch1"), chapter("ch2")],
        }
        .validate()
        .unwrap();

        assert_eq!(curriculum.chapter_count(), 2);
        assert_eq!(curriculum.total_lesson_count(), 4);
        assert_eq!(curriculum.chapter_index("ch2"), Some(1));
        assert_eq!(curriculum.lesson_count("ch1"), Some(2));
        assert_eq!(curriculum.quiz_length("ch2"), Some(1));
        assert_eq!(curriculum.lesson_index("ch2", "ch2-l2"), Some(1));
        assert!(curriculum.chapter_by_id("missing").is_none());
        assert!(curriculum.lesson_count("missing").is_none());
        assert!(curriculum.chapter_at(2).is_none());

        let first = curriculum.chapter_at(0).unwrap();
        assert_eq!(first.lessons()[0].code_sample(), Some("git status"));
        assert_eq!(first.lessons()[0].image_ref(), None);
        assert!(first.quiz()[0].is_correct(0));
    }

    #[test]
    fn rejects_empty_curriculum() {
        let err = CurriculumDraft::default().validate().unwrap_err();
        assert_eq!(err, CurriculumError::NoChapters);
    }

    #[test]
    fn rejects_duplicate_chapter_ids() {
        let err = CurriculumDraft {
            chapters: vec![chapter("ch1"), chapter(" ch1 ")],
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, CurriculumError::DuplicateChapter(ChapterId::new("ch1")));
    }

    #[test]
    fn rejects_duplicate_lessons_within_chapter() {
        let mut draft = chapter("ch1");
        draft.lessons.push(lesson("ch1-l1"));
        let err = CurriculumDraft {
            chapters: vec![draft],
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            err,
            CurriculumError::DuplicateLesson {
                chapter: ChapterId::new("ch1"),
                lesson: LessonId::new("ch1-l1"),
            }
        );
    }

    #[test]
    fn rejects_lesson_ids_shared_between_chapters() {
        let mut first = chapter("ch1");
        first.lessons = vec![lesson("intro")];
        let mut second = chapter("ch2");
        second.lessons = vec![lesson("intro")];

        let err = CurriculumDraft {
            chapters: vec![first, second],
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            err,
            CurriculumError::LessonInSeveralChapters {
                lesson: LessonId::new("intro"),
                first: ChapterId::new("ch1"),
                second: ChapterId::new("ch2"),
            }
        );
    }

    #[test]
    fn rejects_chapters_without_lessons_or_questions() {
        let mut no_lessons = chapter("ch1");
        no_lessons.lessons.clear();
        let err = CurriculumDraft {
            chapters: vec![no_lessons],
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, CurriculumError::NoLessons(ChapterId::new("ch1")));

        let mut no_quiz = chapter("ch1");
        no_quiz.quiz.clear();
        let err = CurriculumDraft {
            chapters: vec![no_quiz],
        }
        .validate()
        .unwrap_err();
        assert_eq!(err, CurriculumError::NoQuestions(ChapterId::new("ch1")));
    }

    #[test]
    fn rejects_bad_questions() {
        let mut bad_key = chapter("ch1");
        bad_key.quiz = vec![question(2)];
        let err = CurriculumDraft {
            chapters: vec![bad_key],
        }
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            CurriculumError::CorrectAnswerOutOfRange { answer: 2, .. }
        ));

        let mut one_option = chapter("ch1");
        let mut q = question(0);
        q.options.truncate(1);
        one_option.quiz = vec![q];
        let err = CurriculumDraft {
            chapters: vec![one_option],
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, CurriculumError::TooFewOptions { index: 0, .. }));
    }
}
