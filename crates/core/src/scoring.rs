//! Score formulas and the chapter unlock rule.
//!
//! All totals come from the curriculum so the numbers stay right when chapters
//! or lessons are added.

use std::collections::BTreeSet;

use crate::model::{ChapterId, Curriculum, ProgressDocument};

/// Minimum quiz percentage that completes a chapter.
pub const PASS_THRESHOLD: u8 = 80;

const LESSON_WEIGHT: f64 = 30.0;
const CHAPTER_WEIGHT: f64 = 30.0;
const QUIZ_WEIGHT: f64 = 40.0;

/// `round(100 * correct / total)`, rounding halves up. Zero questions score 0.
#[must_use]
pub fn quiz_score(correct: usize, total: usize) -> u8 {
    percent(correct, total)
}

#[must_use]
pub fn passes(score: u8) -> bool {
    score >= PASS_THRESHOLD
}

/// Integer percentage of `part` in `whole`, clamped to 0..=100.
#[must_use]
pub fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = part.min(whole) as u128;
    let whole = whole as u128;
    let rounded = (200 * part + whole) / (2 * whole);
    u8::try_from(rounded).unwrap_or(100)
}

/// Weighted composite of lessons (30%), chapters (30%) and quiz results (40%).
///
/// The quiz term is `(quizzes taken / chapters) * mean recorded score`. Ids
/// the curriculum does not know are not counted.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn global_score(doc: &ProgressDocument, curriculum: &Curriculum) -> u8 {
    let total_lessons = curriculum.total_lesson_count();
    let total_chapters = curriculum.chapter_count();
    if total_lessons == 0 || total_chapters == 0 {
        return 0;
    }

    let known_chapter = |id: &ChapterId| curriculum.chapter_by_id(id.as_str()).is_some();
    let lessons = doc
        .completed_lessons()
        .iter()
        .filter(|id| curriculum.contains_lesson(id.as_str()))
        .count();
    let chapters = doc.completed_chapters().iter().filter(|id| known_chapter(id)).count();
    let quizzes = doc.completed_quizzes().iter().filter(|id| known_chapter(id)).count();
    let scores: Vec<f64> = doc
        .quiz_scores()
        .iter()
        .filter(|(id, _)| known_chapter(id))
        .map(|(_, score)| f64::from(*score))
        .collect();

    let lesson_part = LESSON_WEIGHT * lessons as f64 / total_lessons as f64;
    let chapter_part = CHAPTER_WEIGHT * chapters as f64 / total_chapters as f64;
    let quiz_part = if scores.is_empty() {
        0.0
    } else {
        let sum: f64 = scores.iter().sum();
        QUIZ_WEIGHT * quizzes as f64 * sum / (total_chapters as f64 * scores.len() as f64 * 100.0)
    };

    (lesson_part + chapter_part + quiz_part).round().clamp(0.0, 100.0) as u8
}

/// Chapter 0 is always open; any other chapter opens once its predecessor is
/// completed. Indices past the end are locked.
#[must_use]
pub fn is_unlocked(
    curriculum: &Curriculum,
    completed_chapters: &BTreeSet<ChapterId>,
    index: usize,
) -> bool {
    if index >= curriculum.chapter_count() {
        return false;
    }
    if index == 0 {
        return true;
    }
    curriculum
        .chapter_at(index - 1)
        .is_some_and(|prev| completed_chapters.contains(prev.id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChapterDraft, CurriculumDraft, LessonDraft, QuestionDraft};
    use crate::time::fixed_now;

    fn curriculum(chapters: usize) -> Curriculum {
        let drafts = (1..=chapters)
            .map(|n| ChapterDraft {
                id: format!("ch{n}"),
                title: format!("Chapter {n}"),
                lessons: (1..=2)
                    .map(|l| LessonDraft {
                        id: format!("ch{n}-l{l}"),
                        title: format!("Lesson {l}"),
                        ..LessonDraft::default()
                    })
                    .collect(),
                quiz: vec![QuestionDraft {
                    question: "q".into(),
                    options: vec!["yes".into(), "no".into()],
                    correct_answer: 0,
                    explanation: String::new(),
                }],
                ..ChapterDraft::default()
            })
            .collect();
        CurriculumDraft { chapters: drafts }.validate().unwrap()
    }

    #[test]
    fn pass_boundary_is_eighty_percent() {
        assert_eq!(quiz_score(4, 5), 80);
        assert!(passes(quiz_score(4, 5)));
        assert_eq!(quiz_score(3, 5), 60);
        assert!(!passes(quiz_score(3, 5)));
        assert_eq!(quiz_score(79, 100), 79);
        assert!(!passes(79));
    }

    #[test]
    fn quiz_score_rounds_to_nearest() {
        assert_eq!(quiz_score(1, 3), 33);
        assert_eq!(quiz_score(2, 3), 67);
        assert_eq!(quiz_score(1, 8), 13);
        assert_eq!(quiz_score(0, 0), 0);
        assert_eq!(quiz_score(7, 5), 100);
    }

    #[test]
    fn global_score_weights_each_component() {
        let c = curriculum(2);
        let doc = ProgressDocument::new(fixed_now());
        assert_eq!(global_score(&doc, &c), 0);

        let doc = doc
            .with_lesson_completed(&c, "ch1", "ch1-l1")
            .and_then(|d| d.with_lesson_completed(&c, "ch1", "ch1-l2"))
            .and_then(|d| d.with_chapter_completed(&c, "ch1"))
            .and_then(|d| d.with_quiz_completed(&c, "ch1", Some(100)))
            .unwrap();
        // 30 * 2/4 + 30 * 1/2 + 40 * 1/2 * 1.0
        assert_eq!(global_score(&doc, &c), 50);
    }

    #[test]
    fn full_completion_scores_hundred() {
        let c = curriculum(2);
        let mut doc = ProgressDocument::new(fixed_now());
        for ch in ["ch1", "ch2"] {
            for l in ["l1", "l2"] {
                doc = doc
                    .with_lesson_completed(&c, ch, &format!("{ch}-{l}"))
                    .unwrap();
            }
            doc = doc.with_chapter_completed(&c, ch).unwrap();
            doc = doc.with_quiz_completed(&c, ch, Some(100)).unwrap();
        }
        assert_eq!(doc.global_score(), 100);
    }

    #[test]
    fn global_score_is_monotonic_under_additive_steps() {
        let c = curriculum(3);
        let mut doc = ProgressDocument::new(fixed_now());
        let mut last = doc.global_score();
        let steps: Vec<Box<dyn Fn(&ProgressDocument) -> Option<ProgressDocument>>> = vec![
            Box::new(|d| d.with_lesson_completed(&c, "ch1", "ch1-l1")),
            Box::new(|d| d.with_quiz_completed(&c, "ch1", Some(100))),
            Box::new(|d| d.with_quiz_completed(&c, "ch2", Some(80))),
            Box::new(|d| d.with_chapter_completed(&c, "ch1")),
            Box::new(|d| d.with_quiz_completed(&c, "ch2", Some(90))),
            Box::new(|d| d.with_lesson_completed(&c, "ch3", "ch3-l2")),
            Box::new(|d| d.with_quiz_completed(&c, "ch3", Some(85))),
            Box::new(|d| d.with_chapter_completed(&c, "ch3")),
        ];
        for step in &steps {
            doc = step(&doc).unwrap();
            assert!(doc.global_score() >= last, "score dropped");
            last = doc.global_score();
        }
    }

    #[test]
    fn unlock_follows_previous_chapter() {
        let c = curriculum(3);
        let mut completed = BTreeSet::new();
        assert!(is_unlocked(&c, &completed, 0));
        assert!(!is_unlocked(&c, &completed, 1));
        completed.insert(ChapterId::new("ch1"));
        assert!(is_unlocked(&c, &completed, 1));
        assert!(!is_unlocked(&c, &completed, 2));
        assert!(!is_unlocked(&c, &completed, 3));

        for i in 1..c.chapter_count() {
            let prev = c.chapter_at(i - 1).unwrap().id();
            assert_eq!(is_unlocked(&c, &completed, i), completed.contains(prev));
        }
    }

    #[test]
    fn percent_handles_edges() {
        assert_eq!(percent(0, 4), 0);
        assert_eq!(percent(1, 4), 25);
        assert_eq!(percent(4, 4), 100);
        assert_eq!(percent(3, 0), 0);
    }
}
