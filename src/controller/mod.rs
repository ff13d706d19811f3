//! Task list controller
//!
//! Holds the state the UI shell renders: the selected calendar date, the
//! deadline picked for new tasks, the displayed entries and the selected
//! entry. Every action goes through here, persists through [`TaskRepo`] and
//! leaves spoken/visible feedback in the notice queue.

pub mod display;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::db::task::DATE_FORMAT;
use crate::db::{NewTask, Task, TaskId, TaskRepo};
use crate::error::{Action, ValidationError};
use crate::voice::{Speaker, SpeechRecognizer, command};
use crate::{Error, Result};

/// How delete and complete find the stored task for a selected entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionKey {
    /// The entry's task id; only that task is affected
    #[default]
    Id,
    /// The description parsed from the entry text; every task with the same
    /// description is affected
    Description,
}

impl std::str::FromStr for SelectionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "id" => Ok(Self::Id),
            "description" => Ok(Self::Description),
            other => Err(Error::Config(format!("unknown match_by value: {other}"))),
        }
    }
}

/// One displayed line of the task list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub id: TaskId,
    pub description: String,
    /// Rendered text, see [`display::render_entry`]
    pub text: String,
    pub completed: bool,
}

impl From<&Task> for TaskEntry {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            description: task.description.clone(),
            text: display::render_entry(task),
            completed: task.completed,
        }
    }
}

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Confirmation, also spoken
    Info,
    /// Rejected action or failed command
    Warning,
}

/// Message for the UI shell to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// Drives the task list
pub struct TaskListController {
    repo: TaskRepo,
    speaker: Box<dyn Speaker>,
    recognizer: Option<Box<dyn SpeechRecognizer>>,
    selection_key: SelectionKey,
    spoken_year: Option<i32>,
    current_date: NaiveDate,
    deadline: NaiveDate,
    entries: Vec<TaskEntry>,
    selected: Option<usize>,
    draft: String,
    notices: Vec<Notice>,
}

impl TaskListController {
    /// Create a controller showing `today`, with `today` as the deadline
    ///
    /// # Errors
    ///
    /// Returns error if the initial task list cannot be loaded
    pub fn new(repo: TaskRepo, speaker: Box<dyn Speaker>, today: NaiveDate) -> Result<Self> {
        let mut controller = Self {
            repo,
            speaker,
            recognizer: None,
            selection_key: SelectionKey::default(),
            spoken_year: None,
            current_date: today,
            deadline: today,
            entries: Vec::new(),
            selected: None,
            draft: String::new(),
            notices: Vec::new(),
        };
        controller.reload()?;
        Ok(controller)
    }

    /// Enable voice commands
    #[must_use]
    pub fn with_recognizer(mut self, recognizer: Box<dyn SpeechRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Choose how delete and complete identify tasks
    #[must_use]
    pub fn with_selection_key(mut self, key: SelectionKey) -> Self {
        self.selection_key = key;
        self
    }

    /// Resolve spoken dates in `year` instead of the current local year
    #[must_use]
    pub fn with_spoken_year(mut self, year: i32) -> Self {
        self.spoken_year = Some(year);
        self
    }

    #[must_use]
    pub const fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    #[must_use]
    pub const fn deadline(&self) -> NaiveDate {
        self.deadline
    }

    /// Set the deadline used for tasks added from now on
    pub const fn set_deadline(&mut self, deadline: NaiveDate) {
        self.deadline = deadline;
    }

    #[must_use]
    pub fn entries(&self) -> &[TaskEntry] {
        &self.entries
    }

    #[must_use]
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    #[must_use]
    pub fn selected_entry(&self) -> Option<&TaskEntry> {
        self.selected.and_then(|i| self.entries.get(i))
    }

    /// Pending task text, filled by typing or by voice input
    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    #[must_use]
    pub const fn voice_enabled(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Drain notices raised since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Select a displayed entry by position
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if no entry is at `index`
    pub fn select_entry(&mut self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            let position = index + 1;
            return Err(Error::NotFound(format!("no task at position {position}")));
        }
        self.selected = Some(index);
        Ok(())
    }

    /// Select the displayed entry for a task id
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the task is not displayed
    pub fn select_task(&mut self, id: TaskId) -> Result<()> {
        let date = self.current_date;
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| Error::NotFound(format!("task {id} is not on {date}")))?;
        self.selected = Some(index);
        Ok(())
    }

    pub const fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Show the tasks filed under `date`
    ///
    /// # Errors
    ///
    /// Returns error if the task list cannot be loaded
    pub fn select_date(&mut self, date: NaiveDate) -> Result<()> {
        self.current_date = date;
        self.reload()
    }

    /// Reload the displayed list for the current date
    ///
    /// # Errors
    ///
    /// Returns error if the task list cannot be loaded
    pub fn reload(&mut self) -> Result<()> {
        let tasks = self.repo.list_by_date(self.current_date)?;
        self.entries = tasks.iter().map(TaskEntry::from).collect();
        self.selected = None;
        let count = self.entries.len();
        tracing::debug!(date = %self.current_date, count, "task list loaded");
        Ok(())
    }

    /// Add a task under the current date with the current deadline
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyDescription` for blank text, or a
    /// storage error
    pub async fn add_task(&mut self, description: &str) -> Result<Task> {
        let description = description.trim();
        if description.is_empty() {
            return Err(self.reject(ValidationError::EmptyDescription));
        }

        let pending = NewTask::now(description, self.current_date, self.deadline);
        let task = self.repo.insert(&pending)?;
        tracing::info!(id = task.id, date = %task.scheduled_date, "task added");

        self.reload()?;
        self.draft.clear();
        self.announce(format!(
            "Task added: {} with deadline {}",
            task.description,
            task.deadline.format(DATE_FORMAT)
        ))
        .await;
        Ok(task)
    }

    /// Add the draft text as a task
    ///
    /// # Errors
    ///
    /// See [`TaskListController::add_task`]
    pub async fn add_draft(&mut self) -> Result<Task> {
        let draft = self.draft.clone();
        self.add_task(&draft).await
    }

    /// Delete the selected task and drop its entry from the list
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NoSelection` without a selection, or a
    /// storage error
    pub async fn delete_selected(&mut self) -> Result<()> {
        let (index, description) = self.selection_target(Action::Delete)?;
        let entry = &self.entries[index];

        match self.selection_key {
            SelectionKey::Id => {
                self.repo.delete(entry.id)?;
            }
            SelectionKey::Description => {
                self.repo.delete_by_description(&description)?;
            }
        }
        tracing::info!(id = entry.id, key = ?self.selection_key, "task deleted");

        self.entries.remove(index);
        self.selected = None;
        self.announce(format!("Task deleted: {description}")).await;
        Ok(())
    }

    /// Mark the selected task completed and update its entry in place
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::NoSelection` without a selection, or a
    /// storage error
    pub async fn complete_selected(&mut self) -> Result<()> {
        let (index, description) = self.selection_target(Action::Complete)?;
        let id = self.entries[index].id;

        match self.selection_key {
            SelectionKey::Id => {
                self.repo.mark_completed(id)?;
            }
            SelectionKey::Description => {
                self.repo.mark_completed_by_description(&description)?;
            }
        }
        tracing::info!(id, key = ?self.selection_key, "task completed");

        let entry = &mut self.entries[index];
        entry.completed = true;
        entry.text = display::mark_completed(&entry.text);
        self.announce(format!("Task completed: {description}"))
            .await;
        Ok(())
    }

    /// Listen for a task description and place it in the draft
    ///
    /// # Errors
    ///
    /// Returns a `RecognitionFailure` when nothing usable was heard, or a
    /// configuration error when voice input is disabled
    pub async fn voice_input(&mut self) -> Result<String> {
        self.require_voice()?;
        self.announce("Listening...".to_string()).await;
        let transcript = self.listen().await?;

        self.draft = command::task_description(&transcript);
        self.announce(format!("You said: {transcript}")).await;
        Ok(self.draft.clone())
    }

    /// Listen for a spoken date and show its tasks
    ///
    /// # Errors
    ///
    /// Returns a `RecognitionFailure` when nothing usable was heard or no date
    /// was found, a configuration error when voice input is disabled, or a
    /// storage error
    pub async fn voice_date_search(&mut self) -> Result<NaiveDate> {
        self.require_voice()?;
        self.announce("Please say the date you're looking for.".to_string())
            .await;
        let transcript = self.listen().await?;
        self.announce(format!("You said: {transcript}")).await;

        let year = self.spoken_year.unwrap_or_else(|| Local::now().year());
        let date = match command::parse_date_in_year(&transcript, year) {
            Ok(date) => date,
            Err(failure) => {
                tracing::info!(transcript = %transcript, ?failure, "no date in voice command");
                self.announce(failure.to_string()).await;
                return Err(failure.into());
            }
        };

        self.select_date(date)?;
        self.announce(format!(
            "Displaying tasks for {}",
            command::spoken_date(date)
        ))
        .await;
        Ok(date)
    }

    fn require_voice(&self) -> Result<()> {
        if self.recognizer.is_none() {
            return Err(Error::Config("voice input is disabled".to_string()));
        }
        Ok(())
    }

    /// Capture one transcript
    ///
    /// Recognition failures are spoken and queued as notices. Other errors
    /// (audio, configuration) are returned for the caller to report.
    async fn listen(&mut self) -> Result<String> {
        let result = match self.recognizer.as_mut() {
            Some(recognizer) => recognizer.recognize().await,
            None => Err(Error::Config("voice input is disabled".to_string())),
        };

        match result {
            Ok(transcript) => Ok(transcript),
            Err(Error::Recognition(failure)) => {
                self.announce(failure.to_string()).await;
                Err(failure.into())
            }
            Err(e) => {
                tracing::error!(error = %e, "voice capture failed");
                Err(e)
            }
        }
    }

    /// Selected index and the description used to report on it
    fn selection_target(&mut self, action: Action) -> Result<(usize, String)> {
        let Some(index) = self.selected.filter(|&i| i < self.entries.len()) else {
            return Err(self.reject(ValidationError::NoSelection(action)));
        };

        let entry = &self.entries[index];
        let description = match self.selection_key {
            SelectionKey::Id => entry.description.clone(),
            SelectionKey::Description => display::description_from_entry(&entry.text).to_string(),
        };
        Ok((index, description))
    }

    fn reject(&mut self, err: ValidationError) -> Error {
        tracing::debug!(%err, "action rejected");
        self.push(NoticeLevel::Warning, err.to_string());
        err.into()
    }

    fn push(&mut self, level: NoticeLevel, text: String) {
        self.notices.push(Notice { level, text });
    }

    /// Show and speak a message; speech failures are logged, not returned
    async fn announce(&mut self, text: String) {
        if let Err(e) = self.speaker.say(&text).await {
            tracing::warn!(error = %e, "speech output failed");
        }
        self.push(NoticeLevel::Info, text);
    }
}
