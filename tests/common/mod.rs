//! Shared test utilities

use chrono::{NaiveDate, NaiveTime};
use voice_todo::db::{NewTask, Task, TaskRepo};
use voice_todo::{DbPool, db};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Build a calendar date
#[must_use]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Store a task created at noon
pub fn create_test_task(
    repo: &TaskRepo,
    description: &str,
    scheduled: NaiveDate,
    deadline: NaiveDate,
) -> Task {
    repo.insert(&NewTask {
        description: description.to_string(),
        scheduled_date: scheduled,
        created_time: NaiveTime::from_hms_opt(12, 0, 0).expect("valid test time"),
        deadline,
    })
    .expect("failed to create test task")
}
