//! Recurrence evaluation: which tasks are active on a date and which
//! of their slots are still pending.

use crate::dates::{is_between_dates, weekday_label};
use crate::models::{DailyLog, Recurrence, Slot, Task};
use chrono::NaiveDate;

/// Whether a task should be performed on `date`.
pub fn is_active_for_date(task: &Task, date: NaiveDate) -> bool {
    if !is_between_dates(date, task.start_date, task.end_date) {
        return false;
    }
    task.recurrence.matches(date)
}

/// Whether `slot` of `task_id` is marked complete in `log`.
pub fn is_slot_taken(log: Option<&DailyLog>, task_id: &str, slot: Slot) -> bool {
    log.map_or(false, |log| log.is_taken(task_id, slot))
}

/// Tasks active on `date`, in input order.
pub fn active_tasks(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| is_active_for_date(task, date))
        .collect()
}

/// Active tasks with `slot` enabled and not yet taken.
pub fn pending_tasks<'a>(active: &[&'a Task], log: Option<&DailyLog>, slot: Slot) -> Vec<&'a Task> {
    active
        .iter()
        .copied()
        .filter(|task| task.times.get(slot) && !is_slot_taken(log, &task.id, slot))
        .collect()
}

/// Human-readable schedule line, e.g. `매주 월, 수 · 시작 2024-01-01`.
pub fn describe_schedule(task: &Task) -> String {
    let mut range = format!("시작 {}", task.start_date);
    if let Some(end) = task.end_date {
        range.push_str(&format!(" ~ {}", end));
    }
    match &task.recurrence {
        Recurrence::Daily => format!("매일 · {}", range),
        Recurrence::Weekly { days } => {
            let labels: Vec<&str> = days.iter().filter_map(|d| weekday_label(*d)).collect();
            format!("매주 {} · {}", labels.join(", "), range)
        }
    }
}

/// Completion counts for one date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaySummary {
    /// Enabled slots across active tasks.
    pub scheduled: usize,
    /// Of those, slots marked complete.
    pub taken: usize,
}

impl DaySummary {
    /// Whether every scheduled slot is done.
    pub fn is_complete(&self) -> bool {
        self.scheduled > 0 && self.taken >= self.scheduled
    }

    /// Fraction done (0.0 to 1.0).
    pub fn ratio(&self) -> f64 {
        if self.scheduled == 0 {
            return 0.0;
        }
        self.taken as f64 / self.scheduled as f64
    }
}

/// Count scheduled and completed slots for active tasks on `date`.
pub fn summarize_day(tasks: &[Task], log: Option<&DailyLog>, date: NaiveDate) -> DaySummary {
    active_tasks(tasks, date)
        .into_iter()
        .fold(DaySummary::default(), |mut summary, task| {
            for slot in task.times.enabled() {
                summary.scheduled += 1;
                if is_slot_taken(log, &task.id, slot) {
                    summary.taken += 1;
                }
            }
            summary
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SlotFlags;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(start: NaiveDate) -> Task {
        Task::new("Vitamin", SlotFlags::of(&[Slot::Morning, Slot::Evening]), start)
    }

    #[test]
    fn test_range_is_inclusive() {
        let t = task(date(2024, 1, 1)).with_end_date(date(2024, 1, 31));
        assert!(!is_active_for_date(&t, date(2023, 12, 31)));
        assert!(is_active_for_date(&t, date(2024, 1, 1)));
        assert!(is_active_for_date(&t, date(2024, 1, 31)));
        assert!(!is_active_for_date(&t, date(2024, 2, 1)));
    }

    #[test]
    fn test_weekly_mon_wed_fri() {
        let t = task(date(2024, 1, 1)).with_recurrence(Recurrence::weekly([1, 3, 5]));
        // Jan 10, 2024 is Wednesday, Jan 9 is Tuesday
        assert!(is_active_for_date(&t, date(2024, 1, 10)));
        assert!(!is_active_for_date(&t, date(2024, 1, 9)));
    }

    #[test]
    fn test_empty_weekly_is_inert() {
        let t = task(date(2024, 1, 1)).with_recurrence(Recurrence::Weekly { days: vec![] });
        for offset in 0..7 {
            assert!(!is_active_for_date(&t, date(2024, 1, 1) + chrono::Duration::days(offset)));
        }
    }

    #[test]
    fn test_slot_taken_defaults_false() {
        assert!(!is_slot_taken(None, "x", Slot::Morning));
        let mut log = DailyLog::new(date(2024, 1, 10));
        assert!(!is_slot_taken(Some(&log), "x", Slot::Morning));
        log.toggle("x", Slot::Morning);
        assert!(is_slot_taken(Some(&log), "x", Slot::Morning));
    }

    #[test]
    fn test_pending_filters_slot_and_taken() {
        let a = task(date(2024, 1, 1));
        let b = Task::new("Walk", SlotFlags::of(&[Slot::Noon]), date(2024, 1, 1));
        let tasks = vec![a.clone(), b];
        let today = date(2024, 1, 10);
        let mut log = DailyLog::new(today);
        log.toggle(&a.id, Slot::Morning);

        let active = active_tasks(&tasks, today);
        assert!(pending_tasks(&active, Some(&log), Slot::Morning).is_empty());
        assert_eq!(pending_tasks(&active, Some(&log), Slot::Noon)[0].name, "Walk");
        assert_eq!(pending_tasks(&active, Some(&log), Slot::Evening)[0].id, a.id);
    }

    #[test]
    fn test_describe_schedule() {
        let daily = task(date(2024, 1, 1));
        assert_eq!(describe_schedule(&daily), "매일 · 시작 2024-01-01");

        let weekly = task(date(2024, 1, 1))
            .with_end_date(date(2024, 2, 1))
            .with_recurrence(Recurrence::weekly([1, 3]));
        assert_eq!(
            describe_schedule(&weekly),
            "매주 월, 수 · 시작 2024-01-01 ~ 2024-02-01"
        );
    }

    #[test]
    fn test_summarize_day() {
        let a = task(date(2024, 1, 1));
        let b = Task::new("Later", SlotFlags::of(&[Slot::Noon]), date(2024, 2, 1));
        let today = date(2024, 1, 10);
        let mut log = DailyLog::new(today);
        log.toggle(&a.id, Slot::Evening);

        let summary = summarize_day(&[a, b], Some(&log), today);
        assert_eq!(summary, DaySummary { scheduled: 2, taken: 1 });
        assert!(!summary.is_complete());
        assert!((summary.ratio() - 0.5).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn prop_active_respects_range_and_weekdays(
            start_offset in 0i64..400,
            span in proptest::option::of(0i64..60),
            offset in 0i64..500,
            days in proptest::collection::vec(0u8..7, 0..7),
            weekly in any::<bool>(),
        ) {
            let base = date(2024, 1, 1);
            let start = base + chrono::Duration::days(start_offset);
            let end = span.map(|s| start + chrono::Duration::days(s));
            let mut t = task(start);
            t.end_date = end;
            if weekly {
                t.recurrence = Recurrence::weekly(days.clone());
            }
            let day = base + chrono::Duration::days(offset);

            let in_range = day >= start && end.map_or(true, |e| day <= e);
            let expected = in_range
                && (!weekly || days.contains(&crate::dates::weekday_index(day)));
            prop_assert_eq!(is_active_for_date(&t, day), expected);
        }
    }
}
