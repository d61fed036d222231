//! Plain-text monthly completion report.

use crate::models::{DailyLog, Slot, Task};
use crate::recurrence::is_active_for_date;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Months (`YYYY-MM`) that have at least one log, oldest first.
pub fn available_months(history: &[DailyLog]) -> Vec<String> {
    history
        .iter()
        .map(|log| log.date.format("%Y-%m").to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Month one step before (`step < 0`) or after `current` in `months`.
pub fn step_month<'a>(months: &'a [String], current: &str, step: i32) -> Option<&'a str> {
    let index = months.iter().position(|m| m == current)?;
    let target = if step < 0 {
        index.checked_sub(1)?
    } else {
        index + 1
    };
    months.get(target).map(String::as_str)
}

fn slot_line(task: &Task, log: &DailyLog) -> Option<String> {
    let parts: Vec<String> = Slot::ALL
        .into_iter()
        .filter(|slot| task.times.get(*slot))
        .map(|slot| {
            let state = if log.is_taken(&task.id, slot) { "완료" } else { "미완료" };
            format!("{} {}", slot.label(), state)
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!("- {}: {}", task.name, parts.join(", ")))
}

/// Build the shareable report for `month`.
///
/// Only dates with a log are listed, and only tasks active on them.
/// Returns `None` when the month has nothing to report.
pub fn export_month(tasks: &[Task], history: &[DailyLog], month: &str, today: NaiveDate) -> Option<String> {
    let mut days: Vec<&DailyLog> = history
        .iter()
        .filter(|log| log.date.format("%Y-%m").to_string() == month)
        .collect();
    days.sort_by_key(|log| log.date);

    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by_cached_key(|task| task.name.to_lowercase());

    let mut lines = vec![
        "보리네 알리미 · 일정 기록".to_string(),
        format!("내보낸 날짜: {} · 기간: {}", today, month),
        String::new(),
    ];
    let mut wrote_any = false;

    for log in days {
        let entries: Vec<String> = sorted
            .iter()
            .filter(|task| is_active_for_date(task, log.date))
            .filter_map(|task| slot_line(task, log))
            .collect();
        if entries.is_empty() {
            continue;
        }
        wrote_any = true;
        lines.push(log.date.to_string());
        lines.extend(entries);
        lines.push(String::new());
    }

    if !wrote_any {
        return None;
    }
    Some(lines.join("\n").trim().to_string())
}
