//! Task repository for CRUD operations

use chrono::{NaiveDate, NaiveTime};
use rusqlite::Row;
use rusqlite::types::Type;

use super::DbPool;
use crate::error::ValidationError;
use crate::{Error, Result};

/// Storage format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Storage format for creation times
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Row identity assigned by the store
pub type TaskId = i64;

/// A stored to-do task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    /// Calendar date the task is filed under
    pub scheduled_date: NaiveDate,
    pub created_time: NaiveTime,
    pub deadline: NaiveDate,
    pub completed: bool,
}

/// A task that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub description: String,
    pub scheduled_date: NaiveDate,
    pub created_time: NaiveTime,
    pub deadline: NaiveDate,
}

impl NewTask {
    /// Create a task stamped with the current local wall-clock time
    #[must_use]
    pub fn now(
        description: impl Into<String>,
        scheduled_date: NaiveDate,
        deadline: NaiveDate,
    ) -> Self {
        Self {
            description: description.into(),
            scheduled_date,
            created_time: chrono::Local::now().time(),
            deadline,
        }
    }
}

/// Task repository
#[derive(Clone)]
pub struct TaskRepo {
    pool: DbPool,
}

impl TaskRepo {
    /// Create a new task repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Store a new, uncompleted task
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyDescription` for a blank description,
    /// or an error if the database operation fails
    pub fn insert(&self, task: &NewTask) -> Result<Task> {
        if task.description.trim().is_empty() {
            return Err(ValidationError::EmptyDescription.into());
        }

        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        // Sub-second precision is not part of the stored format
        let created = task.created_time.format(TIME_FORMAT).to_string();
        let created_time =
            NaiveTime::parse_from_str(&created, TIME_FORMAT).unwrap_or(task.created_time);

        conn.execute(
            "INSERT INTO tasks (task, date, time, deadline, completed) VALUES (?1, ?2, ?3, ?4, 0)",
            rusqlite::params![
                task.description,
                task.scheduled_date.format(DATE_FORMAT).to_string(),
                created,
                task.deadline.format(DATE_FORMAT).to_string(),
            ],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!(id, date = %task.scheduled_date, "task inserted");

        Ok(Task {
            id,
            description: task.description.clone(),
            scheduled_date: task.scheduled_date,
            created_time,
            deadline: task.deadline,
            completed: false,
        })
    }

    /// Find a task by ID (returns None if not found)
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn find(&self, id: TaskId) -> Result<Option<Task>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT id, task, date, time, deadline, completed FROM tasks
             WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map([id], task_from_row)?;

        rows.next().transpose().map_err(Error::from)
    }

    /// List tasks filed under a date, earliest deadline first
    ///
    /// # Errors
    ///
    /// Returns `Error::Database` naming the row when a stored task on that
    /// date cannot be read, or an error if the database operation fails
    pub fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Task>> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT id, task, date, time, deadline, completed FROM tasks
             WHERE date = ?1 ORDER BY deadline ASC, id ASC",
        )?;

        let day = date.format(DATE_FORMAT).to_string();
        let rows = stmt.query_map([day], id_and_task)?;

        let mut tasks = Vec::new();
        for row in rows {
            let (id, task) = row?;
            let task = task.map_err(|e| {
                tracing::error!(id, error = %e, "unreadable task row");
                Error::Database(format!("task {id} has unreadable fields: {e}"))
            })?;
            tasks.push(task);
        }

        Ok(tasks)
    }

    /// Delete every task whose description matches exactly
    ///
    /// Returns the number of removed tasks.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn delete_by_description(&self, description: &str) -> Result<usize> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let removed = conn.execute("DELETE FROM tasks WHERE task = ?1", [description])?;
        tracing::debug!(removed, "tasks deleted by description");
        Ok(removed)
    }

    /// Mark every task whose description matches exactly as completed
    ///
    /// Returns the number of matched tasks.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn mark_completed_by_description(&self, description: &str) -> Result<usize> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let matched = conn.execute(
            "UPDATE tasks SET completed = 1 WHERE task = ?1",
            [description],
        )?;
        tracing::debug!(matched, "tasks completed by description");
        Ok(matched)
    }

    /// Delete a task by ID
    ///
    /// Returns whether a task was removed.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn delete(&self, id: TaskId) -> Result<bool> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let removed = conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        tracing::debug!(id, removed, "task deleted");
        Ok(removed > 0)
    }

    /// Mark a task as completed by ID
    ///
    /// Returns whether the task exists.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn mark_completed(&self, id: TaskId) -> Result<bool> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;

        let matched = conn.execute("UPDATE tasks SET completed = 1 WHERE id = ?1", [id])?;
        tracing::debug!(id, matched, "task completed");
        Ok(matched > 0)
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        description: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        scheduled_date: parse_column(row, 2, |s| NaiveDate::parse_from_str(s, DATE_FORMAT))?,
        created_time: parse_column(row, 3, |s| NaiveTime::parse_from_str(s, TIME_FORMAT))?,
        deadline: parse_column(row, 4, |s| NaiveDate::parse_from_str(s, DATE_FORMAT))?,
        completed: row.get::<_, Option<i64>>(5)?.unwrap_or(0) != 0,
    })
}

/// Row id alongside the mapped task, so a bad row can be reported by id
fn id_and_task(row: &Row<'_>) -> rusqlite::Result<(TaskId, rusqlite::Result<Task>)> {
    Ok((row.get(0)?, task_from_row(row)))
}

fn parse_column<T>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> chrono::ParseResult<T>,
) -> rusqlite::Result<T> {
    let Some(raw) = row.get::<_, Option<String>>(idx)? else {
        let null = rusqlite::Error::InvalidColumnType(idx, "NULL".to_string(), Type::Null);
        return Err(null);
    };
    parse(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
