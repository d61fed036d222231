//! Notification refresh planning.
//!
//! A refresh always rebuilds the full schedule: everything pending is
//! cancelled, then one reminder is scheduled per (date, slot) with at least
//! one pending task over a rolling window starting today.

use crate::clock::Clock;
use crate::error::CoreResult;
use crate::models::{log_for_date, DailyLog, Slot, Task, TaskId};
use crate::notifier::{
    DeliveryChannel, NotificationData, NotificationRequest, NotificationScheduler,
    PresentationOptions,
};
use crate::recurrence::{active_tasks, pending_tasks};
use crate::settings::{load_notifications_enabled, load_slot_times, SlotTimes};
use crate::store::KeyValueStore;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Number of days covered by a refresh, today included.
pub const REFRESH_WINDOW_DAYS: u32 = 7;

/// Planner settings that do not live in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Notification title.
    pub title: String,
    /// Channel ensured before scheduling.
    pub channel: DeliveryChannel,
    /// Days to plan ahead, today included.
    pub window_days: u32,
    /// Foreground presentation, installed once per planner.
    pub presentation: PresentationOptions,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            title: "보리네 알리미".to_string(),
            channel: DeliveryChannel::default(),
            window_days: REFRESH_WINDOW_DAYS,
            presentation: PresentationOptions::default(),
        }
    }
}

/// One reminder the planner intends to schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReminder {
    pub date: NaiveDate,
    pub slot: Slot,
    pub trigger_at: NaiveDateTime,
    /// Pending tasks, in collection order.
    pub task_ids: Vec<TaskId>,
    pub body: String,
}

/// Reminder text for a slot's pending tasks.
pub fn compose_body(slot: Slot, pending: &[&Task]) -> String {
    match pending {
        [] => String::new(),
        [only] => format!("{} 할 일: {}\n지금 확인해보세요.", slot.label(), only.name),
        [first, rest @ ..] => format!(
            "{} 할 일: {} 외 {}개\n지금 확인해보세요.",
            slot.label(),
            first.name,
            rest.len()
        ),
    }
}

/// Compute the reminders for `days` days starting at `now`'s date.
///
/// Output is ordered by date, then by slot. Triggers at or before `now`
/// are left out.
pub fn plan_window(
    tasks: &[Task],
    history: &[DailyLog],
    slot_times: &SlotTimes,
    now: NaiveDateTime,
    days: u32,
) -> Vec<PlannedReminder> {
    let today = now.date();
    let mut planned = Vec::new();

    for offset in 0..days {
        let date = today + Duration::days(i64::from(offset));
        let active = active_tasks(tasks, date);
        if active.is_empty() {
            continue;
        }
        let log = log_for_date(history, date);

        for slot in Slot::ALL {
            let pending = pending_tasks(&active, log, slot);
            if pending.is_empty() {
                continue;
            }
            let trigger_at = date.and_time(slot_times.resolve(slot));
            if trigger_at <= now {
                continue;
            }
            planned.push(PlannedReminder {
                date,
                slot,
                trigger_at,
                task_ids: pending.iter().map(|t| t.id.clone()).collect(),
                body: compose_body(slot, &pending),
            });
        }
    }
    planned
}

/// What a refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Notifications are off; everything was cancelled.
    Disabled,
    /// Permission not granted; existing notifications left untouched.
    PermissionDenied,
    /// Another refresh was running; this one was dropped.
    AlreadyRunning,
    /// Schedule rebuilt with `count` reminders.
    Scheduled { count: usize },
}

/// Clears the in-flight flag when a refresh ends, however it ends.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Rebuilds locally scheduled reminders from task and log state.
pub struct RefreshPlanner {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn NotificationScheduler>,
    clock: Arc<dyn Clock>,
    config: PlannerConfig,
    presentation_configured: AtomicBool,
    in_flight: AtomicBool,
}

impl RefreshPlanner {
    /// Create a planner with the default configuration.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn NotificationScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            config: PlannerConfig::default(),
            presentation_configured: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Whether a refresh is currently running.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Rebuild the schedule for the current window.
    ///
    /// A call made while another is running returns
    /// [`RefreshOutcome::AlreadyRunning`] without doing anything.
    pub async fn refresh(&self, tasks: &[Task], history: &[DailyLog]) -> CoreResult<RefreshOutcome> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("refresh already in flight, dropping request");
            return Ok(RefreshOutcome::AlreadyRunning);
        };

        self.ensure_presentation();

        if !load_notifications_enabled(self.store.as_ref()).await {
            self.notifier.cancel_all_scheduled().await?;
            tracing::info!("notifications disabled, cancelled all reminders");
            return Ok(RefreshOutcome::Disabled);
        }

        if !self.ensure_permission().await? {
            tracing::info!("notification permission not granted, skipping refresh");
            return Ok(RefreshOutcome::PermissionDenied);
        }

        self.notifier.ensure_channel(&self.config.channel).await?;
        let slot_times = load_slot_times(self.store.as_ref()).await;

        self.notifier.cancel_all_scheduled().await?;

        let now = self.clock.now();
        let plan = plan_window(tasks, history, &slot_times, now, self.config.window_days);
        let mut count = 0;
        for reminder in plan {
            tracing::debug!(
                date = %reminder.date,
                slot = %reminder.slot,
                tasks = reminder.task_ids.len(),
                "scheduling reminder"
            );
            self.notifier.schedule_at(self.request_for(reminder)).await?;
            count += 1;
        }

        tracing::info!(count, "reminders rescheduled");
        Ok(RefreshOutcome::Scheduled { count })
    }

    fn ensure_presentation(&self) {
        if self
            .presentation_configured
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.notifier.configure_presentation(self.config.presentation);
        }
    }

    async fn ensure_permission(&self) -> CoreResult<bool> {
        if self.notifier.permission_granted().await? {
            return Ok(true);
        }
        Ok(self.notifier.request_permission().await?)
    }

    fn request_for(&self, reminder: PlannedReminder) -> NotificationRequest {
        NotificationRequest {
            trigger_at: reminder.trigger_at,
            title: self.config.title.clone(),
            body: reminder.body,
            channel_id: Some(self.config.channel.id.clone()),
            data: NotificationData {
                slot: reminder.slot,
                date: reminder.date,
            },
        }
    }
}

/// Why the host asked for a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    /// App started.
    Startup,
    /// A task was added, edited or removed.
    TasksChanged,
    /// A slot completion was toggled.
    HistoryChanged,
    /// Reminder times or the enable flag changed.
    SettingsChanged,
    /// The local date rolled over, shifting the window.
    DayChanged,
}

/// Runs refreshes in the background in response to change events.
///
/// Failures are logged and swallowed; overlapping refreshes are dropped by
/// the planner.
#[derive(Clone)]
pub struct RefreshDispatcher {
    planner: Arc<RefreshPlanner>,
}

impl RefreshDispatcher {
    pub fn new(planner: Arc<RefreshPlanner>) -> Self {
        Self { planner }
    }

    pub fn planner(&self) -> &Arc<RefreshPlanner> {
        &self.planner
    }

    /// Spawn a refresh on the current tokio runtime.
    pub fn dispatch(
        &self,
        event: ChangeEvent,
        tasks: Vec<Task>,
        history: Vec<DailyLog>,
    ) -> tokio::task::JoinHandle<Option<RefreshOutcome>> {
        let planner = Arc::clone(&self.planner);
        tokio::spawn(async move {
            match planner.refresh(&tasks, &history).await {
                Ok(outcome) => {
                    tracing::debug!(?event, ?outcome, "refresh finished");
                    Some(outcome)
                }
                Err(e) => {
                    tracing::warn!(?event, error = %e, "notification refresh failed");
                    None
                }
            }
        })
    }
}
