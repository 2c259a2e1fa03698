mod curriculum;
mod ids;
mod progress;
mod stats;

pub use curriculum::{
    Chapter, ChapterDraft, Curriculum, CurriculumDraft, CurriculumError, Lesson, LessonDraft,
    QuestionDraft, QuizQuestion,
};
pub use ids::{ChapterId, LessonId};
pub use progress::{LastPosition, ProgressDocument, ProgressDraft, ViewKind};
pub use stats::{ChapterProgress, ProgressStats};
