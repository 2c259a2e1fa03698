use services::{SessionError, TutorConfig, TutorSession};
use storage::StorageError;
use storage::curriculum::CurriculumLoadError;
use tutor_core::model::{CurriculumError, ViewKind};
use tutor_core::time::fixed_clock;

const CURRICULUM: &str = r#"[
    {
        "id": "basics",
        "title": "Basics",
        "lessons": [
            {"id": "init", "title": "Creating a repository"},
            {"id": "commit", "title": "Recording changes", "codeSample": "git commit -m \"first\""}
        ],
        "quiz": [
            {"question": "Which command starts tracking a folder?", "options": ["git init", "git log"], "correctAnswer": 0}
        ]
    },
    {
        "id": "branching",
        "title": "Branching",
        "lessons": [{"id": "create", "title": "Creating a branch"}],
        "quiz": [
            {"question": "Which command lists branches?", "options": ["git tag", "git branch"], "correctAnswer": 1}
        ]
    }
]"#;

fn config(dir: &std::path::Path) -> TutorConfig {
    TutorConfig {
        data_dir: Some(dir.to_path_buf()),
        ..TutorConfig::default()
    }
}

#[test]
fn progress_is_restored_from_the_data_directory() {
    let dir = tempfile::tempdir().unwrap();

    let mut session = TutorSession::open_in_dir(CURRICULUM, config(dir.path()), fixed_clock()).unwrap();
    session.start_chapter("basics").unwrap();
    session.complete_current_lesson().unwrap();
    session.complete_current_lesson().unwrap();
    session.submit_quiz_answer(0).unwrap();
    assert_eq!(session.navigator().view(), ViewKind::ChapterSummary);
    assert!(session.shutdown());
    drop(session);

    let session = TutorSession::open_in_dir(CURRICULUM, config(dir.path()), fixed_clock()).unwrap();
    assert_eq!(session.navigator().view(), ViewKind::ChapterSummary);
    assert!(session.document().is_chapter_completed("basics"));
    assert_eq!(session.document().quiz_score("basics"), Some(100));
    assert!(session.progress().is_unlocked(1));
    assert!(session.progress().load_report().is_clean());
}

#[test]
fn invalid_curriculum_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = TutorSession::open_in_dir("[]", config(dir.path()), fixed_clock())
        .err()
        .unwrap();
    assert!(matches!(err, SessionError::Curriculum(_)));

    let err = TutorSession::open_in_dir("{", config(dir.path()), fixed_clock())
        .err()
        .unwrap();
    assert!(matches!(err, SessionError::Curriculum(_)));
}

#[test]
fn lesson_ids_shared_between_chapters_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let shared = r#"[
        {"id": "ch1", "title": "One", "lessons": [{"id": "intro", "title": "Intro"}],
         "quiz": [{"question": "?", "options": ["a", "b"], "correctAnswer": 0}]},
        {"id": "ch2", "title": "Two", "lessons": [{"id": "intro", "title": "Intro"}],
         "quiz": [{"question": "?", "options": ["a", "b"], "correctAnswer": 0}]}
    ]"#;
    let err = TutorSession::open_in_dir(shared, config(dir.path()), fixed_clock())
        .err()
        .unwrap();
    assert!(matches!(
        err,
        SessionError::Curriculum(CurriculumLoadError::Invalid(
            CurriculumError::LessonInSeveralChapters { .. }
        ))
    ));
}

#[test]
fn blank_storage_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = TutorConfig {
        storage_key: " ".into(),
        ..config(dir.path())
    };
    let err = TutorSession::open_in_dir(CURRICULUM, config, fixed_clock())
        .err()
        .unwrap();
    assert!(matches!(err, SessionError::Config(_)));
}

#[test]
fn storage_keys_that_are_not_file_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    for key in ["a/b", "../progress"] {
        let config = TutorConfig {
            storage_key: key.into(),
            ..config(dir.path())
        };
        let err = TutorSession::open_in_dir(CURRICULUM, config, fixed_clock())
            .err()
            .unwrap();
        assert!(
            matches!(err, SessionError::Storage(StorageError::InvalidKey(_))),
            "{key:?}: {err:?}"
        );
    }

    let config = TutorConfig {
        storage_key: "a_b".into(),
        ..config(dir.path())
    };
    let mut session = TutorSession::open_in_dir(CURRICULUM, config, fixed_clock()).unwrap();
    session.start_chapter("basics").unwrap();
    assert!(session.shutdown());
    assert!(dir.path().join("a_b.json").exists());
}
