//! List entry text
//!
//! Entries render as `"<description> - <date> <time> (Deadline: <deadline>)"`,
//! prefixed with a check mark once completed. Description-keyed delete and
//! complete read the description back out of this text, so the layout must
//! not change.

use crate::db::Task;
use crate::db::task::{DATE_FORMAT, TIME_FORMAT};

/// Prefix marking a completed entry
pub const COMPLETED_GLYPH: &str = "✔ ";

/// Separator between the description and the rest of the entry
const SEPARATOR: &str = " - ";

/// Render a task as a list entry
#[must_use]
pub fn render_entry(task: &Task) -> String {
    let line = format!(
        "{}{SEPARATOR}{} {} (Deadline: {})",
        task.description,
        task.scheduled_date.format(DATE_FORMAT),
        task.created_time.format(TIME_FORMAT),
        task.deadline.format(DATE_FORMAT),
    );
    if task.completed {
        mark_completed(&line)
    } else {
        line
    }
}

/// Prefix an entry with the completion glyph, once
#[must_use]
pub fn mark_completed(text: &str) -> String {
    if text.starts_with(COMPLETED_GLYPH) {
        text.to_string()
    } else {
        format!("{COMPLETED_GLYPH}{text}")
    }
}

/// Recover the description from an entry
///
/// Splits on the first `" - "`, so a description that itself contains that
/// sequence comes back truncated.
#[must_use]
pub fn description_from_entry(text: &str) -> &str {
    let text = text.strip_prefix(COMPLETED_GLYPH).unwrap_or(text);
    text.split_once(SEPARATOR)
        .map_or(text, |(description, _)| description)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    fn task(description: &str, completed: bool) -> Task {
        Task {
            id: 1,
            description: description.to_string(),
            scheduled_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            created_time: NaiveTime::from_hms_opt(14, 5, 9).unwrap(),
            deadline: NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
            completed,
        }
    }

    #[test]
    fn test_render_open_task() {
        assert_eq!(
            render_entry(&task("buy milk", false)),
            "buy milk - 2024-06-01 14:05:09 (Deadline: 2024-06-05)"
        );
    }

    #[test]
    fn test_render_completed_task() {
        assert_eq!(
            render_entry(&task("buy milk", true)),
            "✔ buy milk - 2024-06-01 14:05:09 (Deadline: 2024-06-05)"
        );
    }

    #[test]
    fn test_description_round_trip() {
        for completed in [false, true] {
            let text = render_entry(&task("water the ferns", completed));
            assert_eq!(description_from_entry(&text), "water the ferns");
        }
    }

    #[test]
    fn test_description_with_separator_is_truncated() {
        let text = render_entry(&task("call bob - urgent", false));
        assert_eq!(description_from_entry(&text), "call bob");
    }

    #[test]
    fn test_mark_completed_once() {
        let once = mark_completed("a - b");
        assert_eq!(mark_completed(&once), once);
    }
}
