//! Voice To-Do - a date-organized task list driven by keyboard or voice
//!
//! This library provides the pieces behind the `vtodo` binary:
//! - Task persistence in `SQLite`
//! - The task list controller (selected date, deadline, selection, actions)
//! - Voice input and spoken feedback (capture, STT, TTS, date commands)
//! - Configuration and the interactive shell
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Shell / CLI (vtodo)                  │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              TaskListController                      │
//! │   Date  │  Deadline  │  Selection  │  Notices        │
//! └───────┬─────────────────────────────────┬───────────┘
//!         │                                 │
//! ┌───────▼──────────┐        ┌─────────────▼───────────┐
//! │  TaskRepo        │        │  SpeechRecognizer       │
//! │  (SQLite)        │        │  Speaker (STT/TTS)      │
//! └──────────────────┘        └─────────────────────────┘
//! ```

pub mod config;
pub mod controller;
pub mod db;
pub mod error;
pub mod setup;
pub mod shell;
pub mod voice;

pub use config::Config;
pub use controller::{Notice, NoticeLevel, SelectionKey, TaskEntry, TaskListController};
pub use db::{DbConn, DbPool, NewTask, Task, TaskId, TaskRepo};
pub use error::{Error, RecognitionFailure, Result, ValidationError};
pub use voice::{Speaker, SpeechRecognizer};
