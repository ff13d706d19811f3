//! Interactive terminal shell over the task list controller
//!
//! Renders the list for the selected date, offers the actions as a menu and
//! prints the controller's notices. Rejected actions and failed voice
//! commands are reported and the loop continues; storage failures end it.

use chrono::NaiveDate;
use dialoguer::{Input, Select};

use crate::controller::{NoticeLevel, TaskListController};
use crate::db::task::DATE_FORMAT;
use crate::{Error, Result};

/// Menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    SelectDate,
    SetDeadline,
    AddTask,
    VoiceInput,
    VoiceDateSearch,
    SelectEntry,
    Delete,
    Complete,
    Quit,
}

impl MenuAction {
    const fn label(self) -> &'static str {
        match self {
            Self::SelectDate => "Select date",
            Self::SetDeadline => "Set deadline",
            Self::AddTask => "Add task",
            Self::VoiceInput => "Voice input",
            Self::VoiceDateSearch => "Search date by voice",
            Self::SelectEntry => "Select task",
            Self::Delete => "Delete selected task",
            Self::Complete => "Mark selected task completed",
            Self::Quit => "Quit",
        }
    }

    fn available(voice: bool) -> Vec<Self> {
        let mut actions = vec![Self::SelectDate, Self::SetDeadline, Self::AddTask];
        if voice {
            actions.extend([Self::VoiceInput, Self::VoiceDateSearch]);
        }
        actions.extend([Self::SelectEntry, Self::Delete, Self::Complete, Self::Quit]);
        actions
    }
}

/// Run the shell until the user quits
///
/// # Errors
///
/// Returns the first storage error, or a terminal I/O error
#[allow(clippy::future_not_send)]
pub async fn run(controller: &mut TaskListController) -> Result<()> {
    loop {
        render(controller);

        let actions = MenuAction::available(controller.voice_enabled());
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let choice = Select::new()
            .with_prompt("Action")
            .items(&labels)
            .default(0)
            .interact()
            .map_err(prompt_error)?;

        let action = actions[choice];
        if action == MenuAction::Quit {
            tracing::info!("shell closed");
            return Ok(());
        }

        let result = dispatch(controller, action).await;
        print_notices(controller);
        settle(result)?;
    }
}

#[allow(clippy::future_not_send)]
async fn dispatch(controller: &mut TaskListController, action: MenuAction) -> Result<()> {
    match action {
        MenuAction::SelectDate => {
            let date = prompt_date("Date", controller.current_date())?;
            controller.select_date(date)
        }
        MenuAction::SetDeadline => {
            let date = prompt_date("Deadline", controller.deadline())?;
            controller.set_deadline(date);
            Ok(())
        }
        MenuAction::AddTask => {
            let text: String = Input::new()
                .with_prompt("Task")
                .with_initial_text(controller.draft())
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_error)?;
            controller.set_draft(text);
            controller.add_draft().await.map(drop)
        }
        MenuAction::VoiceInput => {
            tokio::select! {
                result = controller.voice_input() => {
                    let draft = result?;
                    let save = MenuAction::AddTask.label();
                    println!("Draft: {draft} (choose \"{save}\" to save it)");
                    Ok(())
                }
                _ = tokio::signal::ctrl_c() => {
                    cancelled();
                    Ok(())
                }
            }
        }
        MenuAction::VoiceDateSearch => {
            tokio::select! {
                result = controller.voice_date_search() => result.map(drop),
                _ = tokio::signal::ctrl_c() => {
                    cancelled();
                    Ok(())
                }
            }
        }
        MenuAction::SelectEntry => select_entry(controller),
        MenuAction::Delete => controller.delete_selected().await,
        MenuAction::Complete => controller.complete_selected().await,
        MenuAction::Quit => Ok(()),
    }
}

fn select_entry(controller: &mut TaskListController) -> Result<()> {
    if controller.entries().is_empty() {
        let date = controller.current_date().format(DATE_FORMAT);
        println!("No tasks for {date}");
        return Ok(());
    }

    let labels: Vec<&str> = controller
        .entries()
        .iter()
        .map(|e| e.text.as_str())
        .collect();
    let index = Select::new()
        .with_prompt("Select a task")
        .items(&labels)
        .default(controller.selected().unwrap_or(0))
        .interact()
        .map_err(prompt_error)?;
    controller.select_entry(index)
}

/// Decide whether an action's error ends the shell
fn settle(result: Result<()>) -> Result<()> {
    match result {
        // Rejections are already reported through the notice queue
        Ok(()) | Err(Error::Validation(_) | Error::Recognition(_)) => Ok(()),
        Err(e @ (Error::Sqlite(_) | Error::Database(_))) => Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "action failed");
            println!("! {}", e.user_message());
            Ok(())
        }
    }
}

fn render(controller: &TaskListController) {
    println!();
    println!(
        "Tasks for {}  (deadline for new tasks: {})",
        controller.current_date().format(DATE_FORMAT),
        controller.deadline().format(DATE_FORMAT)
    );
    if controller.entries().is_empty() {
        println!("  (none)");
    }
    for (i, entry) in controller.entries().iter().enumerate() {
        let marker = if controller.selected() == Some(i) { '>' } else { ' ' };
        println!("{marker} {:>2}. {}", i + 1, entry.text);
    }
    if !controller.draft().is_empty() {
        println!("  draft: {}", controller.draft());
    }
    println!();
}

fn print_notices(controller: &mut TaskListController) {
    for notice in controller.take_notices() {
        match notice.level {
            NoticeLevel::Info => println!("{}", notice.text),
            NoticeLevel::Warning => println!("! {}", notice.text),
        }
    }
}

fn prompt_date(prompt: &str, current: NaiveDate) -> Result<NaiveDate> {
    let text: String = Input::new()
        .with_prompt(format!("{prompt} (YYYY-MM-DD)"))
        .default(current.format(DATE_FORMAT).to_string())
        .validate_with(|input: &String| -> std::result::Result<(), String> {
            parse_date_input(input).map(drop)
        })
        .interact_text()
        .map_err(prompt_error)?;

    parse_date_input(&text).map_err(Error::Config)
}

/// Parse a typed `YYYY-MM-DD` date
fn parse_date_input(input: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| format!("expected a date like 2024-06-01, got \"{}\"", input.trim()))
}

fn cancelled() {
    tracing::info!("voice command cancelled");
    println!("Cancelled.");
}

fn prompt_error(err: dialoguer::Error) -> Error {
    Error::Io(std::io::Error::other(err))
}
