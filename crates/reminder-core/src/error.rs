//! Reminder core error types.

use thiserror::Error;

/// Errors raised by a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No storage directory could be determined.
    #[error("No data directory available")]
    NoDataDir,

    /// Backend-specific failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors raised by a notification scheduler.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Permission request failed (distinct from a denial).
    #[error("Permission request failed: {0}")]
    Permission(String),

    /// Delivery channel could not be set up.
    #[error("Channel setup failed: {0}")]
    Channel(String),

    /// A single notification could not be scheduled.
    #[error("Failed to schedule notification: {0}")]
    Schedule(String),

    /// Cancelling scheduled notifications failed.
    #[error("Failed to cancel notifications: {0}")]
    Cancel(String),
}

/// Task edits rejected before they reach storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Name is empty after trimming.
    #[error("Task name is empty")]
    EmptyName,

    /// No time-of-day slot selected.
    #[error("No time slot selected")]
    NoSlotSelected,

    /// End date precedes start date.
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: String, end: String },

    /// Weekly recurrence without any weekday.
    #[error("Weekly recurrence needs at least one weekday")]
    NoWeekdaySelected,
}

impl ValidationError {
    /// Localized message for the editing UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyName => "할 일을 입력해주세요.",
            Self::NoSlotSelected => "시간대를 선택해주세요.",
            Self::EndBeforeStart { .. } => "기간이 올바르지 않습니다. 종료일이 시작일보다 빠릅니다.",
            Self::NoWeekdaySelected => "주기를 선택해주세요. 매주 반복할 요일을 선택해주세요.",
        }
    }
}

/// Errors that can occur in the reminder core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Notification error.
    #[error(transparent)]
    Notify(#[from] NotifyError),

    /// Rejected edit.
    #[error("Invalid task: {0}")]
    Validation(#[from] ValidationError),

    /// Task not found.
    #[error("Task not found: {0}")]
    TaskNotFound(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for notification operations.
pub type NotifyResult<T> = Result<T, NotifyError>;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
