use tutor_core::model::ChapterId;
use tutor_core::scoring;

/// One answered question, kept for the results screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRecordEntry {
    pub index: usize,
    pub question: String,
    pub was_correct: bool,
}

/// Working state of the quiz attempt in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizAttempt {
    answers: Vec<bool>,
    record: Vec<QuizRecordEntry>,
}

impl QuizAttempt {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_answer(&mut self, index: usize, question: &str, was_correct: bool) {
        self.answers.push(was_correct);
        self.record.push(QuizRecordEntry {
            index,
            question: question.to_owned(),
            was_correct,
        });
    }

    #[must_use]
    pub fn answers(&self) -> &[bool] {
        &self.answers
    }

    #[must_use]
    pub fn record(&self) -> &[QuizRecordEntry] {
        &self.record
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|ok| **ok).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}

/// Outcome of a finished attempt.
///
/// Questions skipped by a resumed attempt count as wrong: the score is always
/// taken over the full quiz length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub chapter_id: ChapterId,
    pub score: u8,
    pub correct: usize,
    pub total: usize,
    pub passed: bool,
    pub record: Vec<QuizRecordEntry>,
}

impl QuizResult {
    pub(crate) fn from_attempt(chapter_id: ChapterId, attempt: &QuizAttempt, total: usize) -> Self {
        let correct = attempt.correct_count();
        let score = scoring::quiz_score(correct, total);
        Self {
            chapter_id,
            score,
            correct,
            total,
            passed: scoring::passes(score),
            record: attempt.record.clone(),
        }
    }
}
