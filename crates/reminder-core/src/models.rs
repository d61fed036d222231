//! Data models for recurring tasks and their completion logs.

use crate::dates::weekday_index;
use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Opaque task identifier, stable for the task's lifetime.
pub type TaskId = String;

/// Create a fresh task identifier.
pub fn new_task_id() -> TaskId {
    uuid::Uuid::new_v4().to_string()
}

/// Time-of-day slot a task can be scheduled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Morning,
    Noon,
    Evening,
}

impl Slot {
    /// All slots in delivery order.
    pub const ALL: [Slot; 3] = [Slot::Morning, Slot::Noon, Slot::Evening];

    /// Storage key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Noon => "noon",
            Self::Evening => "evening",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Morning => "아침",
            Self::Noon => "점심",
            Self::Evening => "저녁",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One boolean per slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotFlags {
    #[serde(default)]
    pub morning: bool,
    #[serde(default)]
    pub noon: bool,
    #[serde(default)]
    pub evening: bool,
}

impl SlotFlags {
    /// Flags with only the given slots set.
    pub fn of(slots: &[Slot]) -> Self {
        let mut flags = Self::default();
        for slot in slots {
            flags.set(*slot, true);
        }
        flags
    }

    pub fn get(&self, slot: Slot) -> bool {
        match slot {
            Slot::Morning => self.morning,
            Slot::Noon => self.noon,
            Slot::Evening => self.evening,
        }
    }

    pub fn set(&mut self, slot: Slot, value: bool) {
        match slot {
            Slot::Morning => self.morning = value,
            Slot::Noon => self.noon = value,
            Slot::Evening => self.evening = value,
        }
    }

    /// Flip a slot and return its new value.
    pub fn toggle(&mut self, slot: Slot) -> bool {
        let next = !self.get(slot);
        self.set(slot, next);
        next
    }

    /// Set slots, in delivery order.
    pub fn enabled(&self) -> impl Iterator<Item = Slot> + '_ {
        Slot::ALL.into_iter().filter(move |slot| self.get(*slot))
    }

    /// Number of set slots.
    pub fn count(&self) -> usize {
        self.enabled().count()
    }

    /// Whether any slot is set.
    pub fn any(&self) -> bool {
        self.morning || self.noon || self.evening
    }
}

/// How a task repeats within its date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Recurrence {
    /// Every day.
    Daily,
    /// Specific weekdays (0 = Sunday .. 6 = Saturday).
    Weekly { days: Vec<u8> },
}

impl Recurrence {
    /// Weekly recurrence with sorted, deduplicated days.
    pub fn weekly(days: impl IntoIterator<Item = u8>) -> Self {
        let mut days: Vec<u8> = days.into_iter().collect();
        days.sort_unstable();
        days.dedup();
        Self::Weekly { days }
    }

    /// Check whether the recurrence matches a date's weekday.
    ///
    /// Range checks are the caller's concern.
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            Self::Daily => true,
            Self::Weekly { days } => days.contains(&weekday_index(date)),
        }
    }

    /// Toggle a weekday, switching to weekly if needed.
    pub fn toggle_weekday(&mut self, day: u8) {
        match self {
            Self::Daily => *self = Self::weekly([day]),
            Self::Weekly { days } => {
                let next: Vec<u8> = if days.contains(&day) {
                    days.iter().copied().filter(|d| *d != day).collect()
                } else {
                    days.iter().copied().chain([day]).collect()
                };
                *self = Self::weekly(next);
            }
        }
    }

    /// Whether this is a weekly recurrence.
    pub fn is_weekly(&self) -> bool {
        matches!(self, Self::Weekly { .. })
    }
}

impl Default for Recurrence {
    fn default() -> Self {
        Self::Daily
    }
}

/// A user-defined recurring reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier.
    pub id: TaskId,
    /// Display name, deduplicated across the collection.
    pub name: String,
    /// Enabled slots.
    pub times: SlotFlags,
    /// First active date (inclusive).
    pub start_date: NaiveDate,
    /// Last active date (inclusive), open-ended if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    /// Repeat rule.
    pub recurrence: Recurrence,
}

impl Task {
    /// Create a daily task starting on `start_date`.
    pub fn new(name: impl Into<String>, times: SlotFlags, start_date: NaiveDate) -> Self {
        Self {
            id: new_task_id(),
            name: name.into(),
            times,
            start_date,
            end_date: None,
            recurrence: Recurrence::Daily,
        }
    }

    /// Set the end date.
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Set the recurrence.
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    /// Build a task from a validated draft.
    pub fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        Self {
            id,
            name: draft.name.trim().to_string(),
            times: draft.times,
            start_date: draft.start_date,
            end_date: draft.end_date,
            recurrence: draft.recurrence,
        }
    }
}

/// Completion record for one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLog {
    /// Date of the record.
    pub date: NaiveDate,
    /// Per-task slot completion; absent entries are all-false.
    #[serde(default)]
    pub taken: BTreeMap<TaskId, SlotFlags>,
}

impl DailyLog {
    /// Create an empty log.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            taken: BTreeMap::new(),
        }
    }

    /// Whether a task's slot is marked complete.
    pub fn is_taken(&self, task_id: &str, slot: Slot) -> bool {
        self.taken.get(task_id).map_or(false, |flags| flags.get(slot))
    }

    /// Flip a task's slot, creating the entry lazily.
    pub fn toggle(&mut self, task_id: &str, slot: Slot) -> bool {
        self.taken
            .entry(task_id.to_string())
            .or_default()
            .toggle(slot)
    }
}

/// Find the log for a date.
pub fn log_for_date(history: &[DailyLog], date: NaiveDate) -> Option<&DailyLog> {
    history.iter().find(|log| log.date == date)
}

/// Editing payload for add and update actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub times: SlotFlags,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub recurrence: Recurrence,
}

impl TaskDraft {
    /// Daily draft with the given slots.
    pub fn new(name: impl Into<String>, times: SlotFlags, start_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            times,
            start_date,
            end_date: None,
            recurrence: Recurrence::Daily,
        }
    }

    /// Draft prefilled from an existing task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            times: task.times,
            start_date: task.start_date,
            end_date: task.end_date,
            recurrence: task.recurrence.clone(),
        }
    }

    /// Set the end date.
    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Set the recurrence.
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = recurrence;
        self
    }

    /// Check the rules the editing screens enforce.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !self.times.any() {
            return Err(ValidationError::NoSlotSelected);
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(ValidationError::EndBeforeStart {
                    start: self.start_date.to_string(),
                    end: end.to_string(),
                });
            }
        }
        if let Recurrence::Weekly { days } = &self.recurrence {
            if days.is_empty() {
                return Err(ValidationError::NoWeekdaySelected);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_weekly_matches() {
        let recurrence = Recurrence::weekly([5, 1, 3, 3]);
        assert_eq!(recurrence, Recurrence::Weekly { days: vec![1, 3, 5] });
        // Jan 1, 2024 is Monday
        assert!(recurrence.matches(date(2024, 1, 1)));
        assert!(!recurrence.matches(date(2024, 1, 2)));
        assert!(recurrence.matches(date(2024, 1, 3)));
    }

    #[test]
    fn test_toggle_weekday() {
        let mut recurrence = Recurrence::Daily;
        recurrence.toggle_weekday(2);
        assert_eq!(recurrence, Recurrence::Weekly { days: vec![2] });
        recurrence.toggle_weekday(0);
        assert_eq!(recurrence, Recurrence::Weekly { days: vec![0, 2] });
        recurrence.toggle_weekday(2);
        assert_eq!(recurrence, Recurrence::Weekly { days: vec![0] });
    }

    #[test]
    fn test_task_json_shape() {
        let task = Task {
            id: "abc".into(),
            name: "Vitamin".into(),
            times: SlotFlags::of(&[Slot::Morning]),
            start_date: date(2024, 1, 1),
            end_date: None,
            recurrence: Recurrence::weekly([1, 3]),
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["startDate"], "2024-01-01");
        assert!(value.get("endDate").is_none());
        assert_eq!(value["recurrence"]["type"], "weekly");
        assert_eq!(value["recurrence"]["days"], serde_json::json!([1, 3]));
        assert_eq!(value["times"]["morning"], true);
    }

    #[test]
    fn test_daily_log_toggle() {
        let mut log = DailyLog::new(date(2024, 1, 10));
        assert!(!log.is_taken("a", Slot::Noon));
        assert!(log.toggle("a", Slot::Noon));
        assert!(log.is_taken("a", Slot::Noon));
        assert!(!log.is_taken("a", Slot::Morning));
        assert!(!log.toggle("a", Slot::Noon));
        assert!(!log.is_taken("a", Slot::Noon));
    }

    #[test]
    fn test_partial_slot_flags_deserialize() {
        let log: DailyLog =
            serde_json::from_str(r#"{"date":"2024-01-10","taken":{"a":{"evening":true}}}"#).unwrap();
        assert!(log.is_taken("a", Slot::Evening));
        assert!(!log.is_taken("a", Slot::Morning));
    }

    #[test]
    fn test_draft_validation() {
        let start = date(2024, 1, 10);
        let ok = TaskDraft::new("Walk", SlotFlags::of(&[Slot::Evening]), start);
        assert!(ok.validate().is_ok());

        let blank = TaskDraft::new("   ", SlotFlags::of(&[Slot::Evening]), start);
        assert_eq!(blank.validate(), Err(ValidationError::EmptyName));

        let no_slot = TaskDraft::new("Walk", SlotFlags::default(), start);
        assert_eq!(no_slot.validate(), Err(ValidationError::NoSlotSelected));

        let backwards = ok.clone().with_end_date(date(2024, 1, 9));
        assert!(matches!(
            backwards.validate(),
            Err(ValidationError::EndBeforeStart { .. })
        ));

        let empty_weekly = ok.with_recurrence(Recurrence::Weekly { days: vec![] });
        assert_eq!(empty_weekly.validate(), Err(ValidationError::NoWeekdaySelected));
    }
}
