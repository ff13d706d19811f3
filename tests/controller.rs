//! Task list controller tests with scripted voice collaborators

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use async_trait::async_trait;
use voice_todo::db::TaskRepo;
use voice_todo::error::Action;
use voice_todo::{
    Error, NoticeLevel, RecognitionFailure, Result, SelectionKey, Speaker, SpeechRecognizer,
    TaskListController, ValidationError,
};

mod common;

use common::{create_test_task, date, setup_test_db};

/// Recognizer that replays canned transcripts
struct ScriptedRecognizer {
    replies: VecDeque<Result<String>>,
}

impl ScriptedRecognizer {
    fn new(replies: impl IntoIterator<Item = Result<String>>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
        }
    }
}

#[async_trait(?Send)]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn recognize(&mut self) -> Result<String> {
        self.replies
            .pop_front()
            .unwrap_or(Err(RecognitionFailure::AudioUnintelligible.into()))
    }
}

/// Speaker that records everything said
#[derive(Clone, Default)]
struct RecordingSpeaker {
    spoken: Rc<RefCell<Vec<String>>>,
}

impl RecordingSpeaker {
    fn spoken(&self) -> Vec<String> {
        self.spoken.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Speaker for RecordingSpeaker {
    async fn say(&mut self, text: &str) -> Result<()> {
        self.spoken.borrow_mut().push(text.to_string());
        Ok(())
    }
}

/// Speaker whose output device is gone
struct BrokenSpeaker;

#[async_trait(?Send)]
impl Speaker for BrokenSpeaker {
    async fn say(&mut self, _text: &str) -> Result<()> {
        Err(Error::Audio("no output device".to_string()))
    }
}

fn controller_for(repo: &TaskRepo) -> (TaskListController, RecordingSpeaker) {
    let speaker = RecordingSpeaker::default();
    let controller =
        TaskListController::new(repo.clone(), Box::new(speaker.clone()), date(2024, 6, 1))
            .unwrap();
    (controller, speaker)
}

fn warnings(controller: &mut TaskListController) -> Vec<String> {
    controller
        .take_notices()
        .into_iter()
        .filter(|n| n.level == NoticeLevel::Warning)
        .map(|n| n.text)
        .collect()
}

#[tokio::test]
async fn test_add_task_uses_date_and_deadline() {
    let repo = TaskRepo::new(setup_test_db());
    let (mut controller, speaker) = controller_for(&repo);
    controller.set_deadline(date(2024, 6, 5));
    controller.set_draft("buy milk");

    let task = controller.add_draft().await.unwrap();

    assert_eq!(task.scheduled_date, date(2024, 6, 1));
    assert_eq!(task.deadline, date(2024, 6, 5));
    assert_eq!(controller.entries().len(), 1);
    assert!(controller.entries()[0].text.starts_with("buy milk - 2024-06-01 "));
    assert!(controller.entries()[0].text.ends_with("(Deadline: 2024-06-05)"));
    assert!(controller.draft().is_empty());
    assert_eq!(
        speaker.spoken(),
        ["Task added: buy milk with deadline 2024-06-05"]
    );
}

#[tokio::test]
async fn test_empty_add_is_rejected() {
    let repo = TaskRepo::new(setup_test_db());
    let (mut controller, speaker) = controller_for(&repo);

    let err = controller.add_task("  \t ").await.unwrap_err();

    assert!(matches!(
        err,
        Error::Validation(ValidationError::EmptyDescription)
    ));
    assert!(err.is_recoverable());
    assert_eq!(warnings(&mut controller), ["Task cannot be empty!"]);
    assert!(repo.list_by_date(date(2024, 6, 1)).unwrap().is_empty());
    assert!(speaker.spoken().is_empty());
}

#[tokio::test]
async fn test_delete_and_complete_need_selection() {
    let repo = TaskRepo::new(setup_test_db());
    create_test_task(&repo, "laundry", date(2024, 6, 1), date(2024, 6, 1));
    let (mut controller, _speaker) = controller_for(&repo);

    let err = controller.delete_selected().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::NoSelection(Action::Delete))
    ));
    let err = controller.complete_selected().await.unwrap_err();
    assert!(matches!(
        err,
        Error::Validation(ValidationError::NoSelection(Action::Complete))
    ));

    assert_eq!(
        warnings(&mut controller),
        [
            "Please select a task to delete!",
            "Please select a task to mark as completed!"
        ]
    );
    assert_eq!(repo.list_by_date(date(2024, 6, 1)).unwrap().len(), 1);
}

#[tokio::test]
async fn test_complete_marks_entry_in_place() {
    let repo = TaskRepo::new(setup_test_db());
    let task = create_test_task(&repo, "laundry", date(2024, 6, 1), date(2024, 6, 2));
    let (mut controller, speaker) = controller_for(&repo);

    controller.select_task(task.id).unwrap();
    controller.complete_selected().await.unwrap();
    controller.complete_selected().await.unwrap();

    let entry = &controller.entries()[0];
    assert!(entry.completed);
    assert!(entry.text.starts_with("✔ laundry - "));
    assert!(!entry.text.starts_with("✔ ✔ "));
    assert!(repo.find(task.id).unwrap().unwrap().completed);
    assert_eq!(speaker.spoken()[0], "Task completed: laundry");
}

#[tokio::test]
async fn test_delete_removes_entry_without_reload() {
    let repo = TaskRepo::new(setup_test_db());
    create_test_task(&repo, "first", date(2024, 6, 1), date(2024, 6, 1));
    let second = create_test_task(&repo, "second", date(2024, 6, 1), date(2024, 6, 2));
    let (mut controller, speaker) = controller_for(&repo);

    controller.select_task(second.id).unwrap();
    controller.delete_selected().await.unwrap();

    assert_eq!(controller.entries().len(), 1);
    assert_eq!(controller.entries()[0].description, "first");
    assert_eq!(controller.selected(), None);
    assert!(repo.find(second.id).unwrap().is_none());
    assert_eq!(speaker.spoken(), ["Task deleted: second"]);
}

#[tokio::test]
async fn test_id_key_only_touches_selected_duplicate() {
    let repo = TaskRepo::new(setup_test_db());
    let first = create_test_task(&repo, "call mom", date(2024, 6, 1), date(2024, 6, 1));
    let second = create_test_task(&repo, "call mom", date(2024, 6, 1), date(2024, 6, 1));
    let (mut controller, _speaker) = controller_for(&repo);

    controller.select_task(first.id).unwrap();
    controller.complete_selected().await.unwrap();
    assert!(!repo.find(second.id).unwrap().unwrap().completed);

    controller.delete_selected().await.unwrap();
    assert!(repo.find(first.id).unwrap().is_none());
    assert!(repo.find(second.id).unwrap().is_some());
}

#[tokio::test]
async fn test_description_key_touches_every_duplicate() {
    let repo = TaskRepo::new(setup_test_db());
    let first = create_test_task(&repo, "call mom", date(2024, 6, 1), date(2024, 6, 1));
    let other_day = create_test_task(&repo, "call mom", date(2024, 6, 9), date(2024, 6, 9));
    let (controller, _speaker) = controller_for(&repo);
    let mut controller = controller.with_selection_key(SelectionKey::Description);

    controller.select_task(first.id).unwrap();
    controller.complete_selected().await.unwrap();
    assert!(repo.find(other_day.id).unwrap().unwrap().completed);

    // The completion glyph must not leak into the matched description
    controller.delete_selected().await.unwrap();
    assert!(repo.find(first.id).unwrap().is_none());
    assert!(repo.find(other_day.id).unwrap().is_none());
}

#[tokio::test]
async fn test_select_date_reloads_and_clears_selection() {
    let repo = TaskRepo::new(setup_test_db());
    create_test_task(&repo, "today", date(2024, 6, 1), date(2024, 6, 1));
    create_test_task(&repo, "later", date(2024, 6, 8), date(2024, 6, 8));
    let (mut controller, _speaker) = controller_for(&repo);
    controller.select_entry(0).unwrap();

    controller.select_date(date(2024, 6, 8)).unwrap();

    assert_eq!(controller.current_date(), date(2024, 6, 8));
    assert_eq!(controller.selected(), None);
    assert_eq!(controller.entries()[0].description, "later");
    assert!(matches!(controller.select_entry(1), Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_voice_input_fills_draft() {
    let repo = TaskRepo::new(setup_test_db());
    let (controller, speaker) = controller_for(&repo);
    let mut controller = controller.with_recognizer(Box::new(ScriptedRecognizer::new([Ok(
        "pick up the dry cleaning".to_string(),
    )])));

    let draft = controller.voice_input().await.unwrap();

    assert_eq!(draft, "pick up the dry cleaning");
    assert_eq!(controller.draft(), "pick up the dry cleaning");
    assert_eq!(
        speaker.spoken(),
        ["Listening...", "You said: pick up the dry cleaning"]
    );
    assert!(repo.list_by_date(date(2024, 6, 1)).unwrap().is_empty());
}

#[tokio::test]
async fn test_voice_input_failure_is_announced() {
    let repo = TaskRepo::new(setup_test_db());
    let (controller, speaker) = controller_for(&repo);
    let mut controller = controller.with_recognizer(Box::new(ScriptedRecognizer::new([Err(
        RecognitionFailure::ServiceUnavailable.into(),
    )])));
    controller.set_draft("keep me");

    let err = controller.voice_input().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Recognition(RecognitionFailure::ServiceUnavailable)
    ));
    assert_eq!(controller.draft(), "keep me");
    assert_eq!(
        speaker.spoken(),
        [
            "Listening...",
            "Could not request results. Please check your internet connection."
        ]
    );
}

#[tokio::test]
async fn test_voice_date_search_selects_spoken_date() {
    let repo = TaskRepo::new(setup_test_db());
    create_test_task(&repo, "dentist", date(2024, 3, 3), date(2024, 3, 3));
    create_test_task(&repo, "dentist", date(2025, 3, 3), date(2025, 3, 3));
    let (controller, speaker) = controller_for(&repo);
    let recognizer = ScriptedRecognizer::new([Ok("show tasks for 3rd march".to_string())]);
    let mut controller = controller
        .with_spoken_year(2024)
        .with_recognizer(Box::new(recognizer));

    let found = controller.voice_date_search().await.unwrap();

    assert_eq!(found, date(2024, 3, 3));
    assert_eq!(controller.current_date(), date(2024, 3, 3));
    assert_eq!(controller.entries().len(), 1);
    assert_eq!(
        speaker.spoken(),
        [
            "Please say the date you're looking for.".to_string(),
            "You said: show tasks for 3rd march".to_string(),
            "Displaying tasks for March 3, 2024".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_voice_date_search_without_date_keeps_view() {
    let repo = TaskRepo::new(setup_test_db());
    let (controller, speaker) = controller_for(&repo);
    let mut controller = controller.with_recognizer(Box::new(ScriptedRecognizer::new([Ok(
        "november 21st".to_string(),
    )])));

    let err = controller.voice_date_search().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Recognition(RecognitionFailure::NoDatePattern)
    ));
    assert_eq!(controller.current_date(), date(2024, 6, 1));
    assert_eq!(
        speaker.spoken().last().map(String::as_str),
        Some("Sorry, I couldn't recognize a date in your command.")
    );
}

#[tokio::test]
async fn test_voice_disabled_is_returned_once_and_silently() {
    let repo = TaskRepo::new(setup_test_db());
    let (mut controller, speaker) = controller_for(&repo);
    assert!(!controller.voice_enabled());

    let err = controller.voice_input().await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    let err = controller.voice_date_search().await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    // The shell prints the returned error; nothing is queued or spoken
    assert!(controller.take_notices().is_empty());
    assert!(speaker.spoken().is_empty());
}

/// Recognizer whose microphone has gone away
struct UnpluggedRecognizer;

#[async_trait(?Send)]
impl SpeechRecognizer for UnpluggedRecognizer {
    async fn recognize(&mut self) -> Result<String> {
        Err(Error::Audio("input device disconnected".to_string()))
    }
}

#[tokio::test]
async fn test_audio_failure_is_returned_without_notice() {
    let repo = TaskRepo::new(setup_test_db());
    let (controller, speaker) = controller_for(&repo);
    let mut controller = controller.with_recognizer(Box::new(UnpluggedRecognizer));

    let err = controller.voice_input().await.unwrap_err();

    assert!(matches!(err, Error::Audio(_)));
    assert!(warnings(&mut controller).is_empty());
    assert_eq!(speaker.spoken(), ["Listening..."]);
}

#[tokio::test]
async fn test_speech_failure_does_not_abort_action() {
    let repo = TaskRepo::new(setup_test_db());
    let mut controller =
        TaskListController::new(repo.clone(), Box::new(BrokenSpeaker), date(2024, 6, 1)).unwrap();

    controller.add_task("still saved").await.unwrap();

    assert_eq!(repo.list_by_date(date(2024, 6, 1)).unwrap().len(), 1);
    let notices = controller.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
}
