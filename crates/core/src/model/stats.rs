use crate::model::curriculum::{Chapter, Curriculum};
use crate::model::ids::ChapterId;
use crate::model::progress::ProgressDocument;
use crate::scoring::{is_unlocked, percent};

/// Dashboard numbers derived from a document and the curriculum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStats {
    pub completed_lessons: usize,
    pub total_lessons: usize,
    pub completed_chapters: usize,
    pub total_chapters: usize,
    pub completed_quizzes: usize,
    pub lesson_percent: u8,
    pub chapter_percent: u8,
    pub average_quiz_score: Option<u8>,
    pub global_score: u8,
}

/// Per-chapter row for the dashboard and the chapter list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterProgress {
    pub chapter_id: ChapterId,
    pub index: usize,
    pub lessons_completed: usize,
    pub lessons_total: usize,
    pub percent: u8,
    pub quiz_score: Option<u8>,
    pub completed: bool,
    pub unlocked: bool,
}

impl ProgressStats {
    #[must_use]
    pub fn compute(doc: &ProgressDocument, curriculum: &Curriculum) -> Self {
        let chapters = curriculum.chapters();
        let completed_lessons = chapters
            .iter()
            .map(|c| lessons_done(doc, c))
            .sum::<usize>();
        let completed_chapters = chapters
            .iter()
            .filter(|c| doc.is_chapter_completed(c.id().as_str()))
            .count();
        let completed_quizzes = chapters
            .iter()
            .filter(|c| doc.completed_quizzes().contains(c.id()))
            .count();

        let scores: Vec<u8> = chapters
            .iter()
            .filter_map(|c| doc.quiz_score(c.id().as_str()))
            .collect();
        let average_quiz_score = if scores.is_empty() {
            None
        } else {
            let sum: usize = scores.iter().map(|s| usize::from(*s)).sum();
            Some(percent(sum, scores.len() * 100))
        };

        let total_lessons = curriculum.total_lesson_count();
        let total_chapters = curriculum.chapter_count();
        Self {
            completed_lessons,
            total_lessons,
            completed_chapters,
            total_chapters,
            completed_quizzes,
            lesson_percent: percent(completed_lessons, total_lessons),
            chapter_percent: percent(completed_chapters, total_chapters),
            average_quiz_score,
            global_score: doc.global_score(),
        }
    }
}

impl ChapterProgress {
    #[must_use]
    pub fn compute_all(doc: &ProgressDocument, curriculum: &Curriculum) -> Vec<Self> {
        curriculum
            .chapters()
            .iter()
            .enumerate()
            .map(|(index, chapter)| {
                let lessons_completed = lessons_done(doc, chapter);
                let lessons_total = chapter.lessons().len();
                Self {
                    chapter_id: chapter.id().clone(),
                    index,
                    lessons_completed,
                    lessons_total,
                    percent: percent(lessons_completed, lessons_total),
                    quiz_score: doc.quiz_score(chapter.id().as_str()),
                    completed: doc.is_chapter_completed(chapter.id().as_str()),
                    unlocked: is_unlocked(curriculum, doc.completed_chapters(), index),
                }
            })
            .collect()
    }
}

fn lessons_done(doc: &ProgressDocument, chapter: &Chapter) -> usize {
    chapter
        .lessons()
        .iter()
        .filter(|l| doc.is_lesson_completed(l.id().as_str()))
        .count()
}
