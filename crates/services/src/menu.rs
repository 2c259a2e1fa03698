use tutor_core::model::ChapterId;

use crate::progress_service::ProgressStore;

/// One sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Home,
    /// Sign-in placeholder; selecting it does nothing.
    Auth,
    Dashboard,
    Chapter {
        id: ChapterId,
        title: String,
        index: usize,
        unlocked: bool,
        completed: bool,
    },
    /// The quiz that closes a chapter.
    Activity {
        chapter_id: ChapterId,
        title: String,
        completed: bool,
        score: Option<u8>,
    },
}

impl MenuItem {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Home => "Home",
            Self::Auth => "Sign in",
            Self::Dashboard => "Dashboard",
            Self::Chapter { title, .. } | Self::Activity { title, .. } => title.as_str(),
        }
    }

    /// Locked chapters are listed but cannot be opened.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Chapter { unlocked, .. } => *unlocked,
            _ => true,
        }
    }
}

/// Sidebar contents: the fixed entries, then one chapter entry per chapter,
/// then one activity entry per chapter quiz.
#[must_use]
pub fn build_menu(store: &ProgressStore) -> Vec<MenuItem> {
    let curriculum = store.curriculum();
    let doc = store.document();
    let mut items = vec![MenuItem::Home, MenuItem::Auth, MenuItem::Dashboard];

    items.extend(
        curriculum
            .chapters()
            .iter()
            .enumerate()
            .map(|(index, chapter)| MenuItem::Chapter {
                id: chapter.id().clone(),
                title: chapter.title().to_owned(),
                index,
                unlocked: store.is_unlocked(index),
                completed: doc.is_chapter_completed(chapter.id().as_str()),
            }),
    );

    items.extend(
        curriculum
            .chapters()
            .iter()
            .map(|chapter| MenuItem::Activity {
                chapter_id: chapter.id().clone(),
                title: format!("{} quiz", chapter.title()),
                completed: doc.completed_quizzes().contains(chapter.id()),
                score: doc.quiz_score(chapter.id().as_str()),
            }),
    );

    items
}
