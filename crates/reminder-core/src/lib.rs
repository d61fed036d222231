//! # reminder-core
//!
//! Recurring task evaluation and local reminder planning for the Borine
//! apps.
//!
//! ## Features
//!
//! - Daily and weekly recurrences bounded by an inclusive date range
//! - Per-slot (morning, noon, evening) completion tracking
//! - Rolling seven-day reminder rebuilds against a pluggable scheduler
//! - Collision-free display names for duplicate tasks
//! - Monthly plain-text completion reports

pub mod book;
pub mod clock;
pub mod dates;
pub mod error;
pub mod export;
pub mod history;
pub mod models;
pub mod names;
pub mod notifier;
pub mod planner;
pub mod recurrence;
pub mod settings;
pub mod store;

pub use book::TaskBook;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, NotifyError, StoreError, ValidationError};
pub use history::TaskHistory;
pub use models::{DailyLog, Recurrence, Slot, SlotFlags, Task, TaskDraft, TaskId};
pub use notifier::{
    DeliveryChannel, MemoryScheduler, NotificationData, NotificationRequest, NotificationScheduler,
    PresentationOptions,
};
pub use planner::{ChangeEvent, PlannerConfig, RefreshDispatcher, RefreshOutcome, RefreshPlanner};
pub use settings::{Settings, SlotTimes};
pub use store::{FileStore, KeyValueStore, MemoryStore, StorageKeys};
