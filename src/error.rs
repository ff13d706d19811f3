//! Error types for the voice to-do list

use thiserror::Error;

/// Result type alias for voice to-do operations
pub type Result<T> = std::result::Result<T, Error>;

/// User action that needs a selected list entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Delete the selected task
    Delete,
    /// Mark the selected task as completed
    Complete,
}

impl Action {
    /// Warning shown when the action is attempted with nothing selected
    #[must_use]
    pub const fn selection_warning(self) -> &'static str {
        match self {
            Self::Delete => "Please select a task to delete!",
            Self::Complete => "Please select a task to mark as completed!",
        }
    }
}

/// Input rejected before it reaches the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Add attempted with an empty description
    #[error("Task cannot be empty!")]
    EmptyDescription,

    /// Delete or complete attempted without a selected entry
    #[error("{}", .0.selection_warning())]
    NoSelection(Action),
}

/// A voice command that could not be turned into an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecognitionFailure {
    /// Speech was captured but could not be transcribed
    #[error("Sorry, I could not understand the audio.")]
    AudioUnintelligible,

    /// The recognition service could not be reached or refused the request
    #[error("Could not request results. Please check your internet connection.")]
    ServiceUnavailable,

    /// The transcript holds no `<day> <month>` phrase
    #[error("Sorry, I couldn't recognize a date in your command.")]
    NoDatePattern,

    /// A date phrase was found but its month name is unknown
    #[error("Sorry, I couldn't recognize the month.")]
    UnrecognizedMonth,

    /// Day and month were recognized but do not form a calendar date
    #[error("Sorry, that date doesn't exist.")]
    InvalidDate,
}

/// Errors that can occur in the voice to-do list
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Rejected user input
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Voice command failure
    #[error("recognition failure: {0}")]
    Recognition(#[from] RecognitionFailure),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether the failure is handled by notifying the user and aborting the
    /// current action, leaving the application usable
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Recognition(_) | Self::NotFound(_)
        )
    }

    /// Text to show or speak to the user for a recoverable failure
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Recognition(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}
