use thiserror::Error;

use tutor_core::model::{Curriculum, CurriculumDraft, CurriculumError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CurriculumLoadError {
    #[error("curriculum is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] CurriculumError),
}

/// Parse and validate the static curriculum dataset.
///
/// Accepts either `{"chapters": [...]}` or a bare array of chapters.
///
/// # Errors
///
/// Returns `CurriculumLoadError::Parse` for malformed JSON and
/// `CurriculumLoadError::Invalid` when the content breaks a curriculum rule.
pub fn curriculum_from_json(raw: &str) -> Result<Curriculum, CurriculumLoadError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let draft = if value.is_array() {
        CurriculumDraft {
            chapters: serde_json::from_value(value)?,
        }
    } else {
        serde_json::from_value(value)?
    };
    Ok(draft.validate()?)
}
