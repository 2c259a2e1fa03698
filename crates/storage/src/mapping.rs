//! JSON codec for the persisted progress document.
//!
//! Decoding never fails: each top-level field is read on its own and falls
//! back to the default document's value when it is missing or has the wrong
//! shape, so one corrupted field does not discard the rest of the learner's
//! progress.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use tutor_core::model::{ChapterId, ProgressDocument, ProgressDraft};

use crate::repository::StorageError;

/// Which fields were replaced by defaults while decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// The payload was not a JSON object; everything was defaulted.
    pub unreadable: bool,
    pub missing: Vec<&'static str>,
    pub invalid: Vec<&'static str>,
}

impl DecodeReport {
    /// True when the stored document was used exactly as written.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.unreadable && self.missing.is_empty() && self.invalid.is_empty()
    }

    fn all_defaulted() -> Self {
        Self {
            unreadable: true,
            ..Self::default()
        }
    }
}

/// Serialize a document into its persisted JSON layout.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode(doc: &ProgressDocument) -> Result<String, StorageError> {
    serde_json::to_string(doc).map_err(|err| StorageError::Serialization(err.to_string()))
}

/// Decode a stored payload, defaulting field by field.
///
/// `now` is the fallback for `updatedAt` and the timestamp of the default
/// document used for the other fallbacks.
#[must_use]
pub fn decode(raw: &str, now: DateTime<Utc>) -> (ProgressDocument, DecodeReport) {
    let defaults = ProgressDocument::new(now).into_draft();
    let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(raw) else {
        return (
            ProgressDocument::from_persisted(defaults),
            DecodeReport::all_defaulted(),
        );
    };

    let mut reader = FieldReader {
        obj: &obj,
        report: DecodeReport::default(),
    };

    let quiz_scores: BTreeMap<ChapterId, u8> = reader.read_checked(
        "quizScores",
        defaults.quiz_scores,
        |scores: &BTreeMap<ChapterId, u8>| scores.values().all(|s| *s <= 100),
    );
    let draft = ProgressDraft {
        current_chapter: reader.read("currentChapter", defaults.current_chapter),
        current_lesson: reader.read("currentLesson", defaults.current_lesson),
        completed_lessons: reader.read("completedLessons", defaults.completed_lessons),
        completed_chapters: reader.read("completedChapters", defaults.completed_chapters),
        completed_quizzes: reader.read("completedQuizzes", defaults.completed_quizzes),
        quiz_scores,
        last_position: reader.read("lastPosition", defaults.last_position),
        global_score: reader.read_checked("globalScore", defaults.global_score, |s| *s <= 100),
        updated_at: reader.read("updatedAt", defaults.updated_at),
    };

    (ProgressDocument::from_persisted(draft), reader.report)
}

struct FieldReader<'a> {
    obj: &'a Map<String, Value>,
    report: DecodeReport,
}

impl FieldReader<'_> {
    fn read<T: DeserializeOwned>(&mut self, name: &'static str, fallback: T) -> T {
        self.read_checked(name, fallback, |_| true)
    }

    fn read_checked<T: DeserializeOwned>(
        &mut self,
        name: &'static str,
        fallback: T,
        check: impl Fn(&T) -> bool,
    ) -> T {
        let Some(value) = self.obj.get(name) else {
            self.report.missing.push(name);
            return fallback;
        };
        match serde_json::from_value::<T>(value.clone()) {
            Ok(parsed) if check(&parsed) => parsed,
            _ => {
                self.report.invalid.push(name);
                fallback
            }
        }
    }
}
