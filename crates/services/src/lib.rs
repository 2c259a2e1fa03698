#![forbid(unsafe_code)]

pub mod autosave;
pub mod config;
pub mod error;
pub mod menu;
pub mod navigation;
pub mod progress_service;
pub mod session;

pub use tutor_core::Clock;

pub use autosave::AutosaveTimer;
pub use config::{DEFAULT_AUTOSAVE_SECS, TutorConfig};
pub use error::{
    ConfigError, NavigationError, PersistOperation, PersistenceFailure, SessionError,
};
pub use menu::{MenuItem, build_menu};
pub use navigation::{Navigator, QuizAttempt, QuizRecordEntry, QuizResult, TutorView};
pub use progress_service::ProgressStore;
pub use session::TutorSession;
