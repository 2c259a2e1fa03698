//! Tutorial view state machine and its quiz bookkeeping.

mod machine;
mod quiz;
mod view;

pub use machine::Navigator;
pub use quiz::{QuizAttempt, QuizRecordEntry, QuizResult};
pub use view::TutorView;
