//! Local notification scheduling seam.

use crate::error::{NotifyError, NotifyResult};
use crate::models::Slot;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Metadata attached to a scheduled reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub slot: Slot,
    pub date: NaiveDate,
}

/// One notification to deliver at an absolute local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Local wall time to fire at.
    pub trigger_at: NaiveDateTime,
    pub title: String,
    pub body: String,
    /// Channel on platforms that need one.
    pub channel_id: Option<String>,
    pub data: NotificationData,
}

/// Delivery importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Low,
    Default,
    #[default]
    High,
}

/// Delivery channel some hosts require before scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryChannel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
    pub vibration_pattern: Vec<u64>,
    pub sound: bool,
    pub lights: bool,
}

impl Default for DeliveryChannel {
    fn default() -> Self {
        Self {
            id: "alimi-reminders".to_string(),
            name: "Alimi Reminders".to_string(),
            importance: Importance::High,
            vibration_pattern: vec![0, 250, 250, 250],
            sound: true,
            lights: false,
        }
    }
}

/// How delivered notifications are presented while the app is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationOptions {
    pub show_alert: bool,
    pub play_sound: bool,
    pub set_badge: bool,
}

impl Default for PresentationOptions {
    fn default() -> Self {
        Self {
            show_alert: true,
            play_sound: true,
            set_badge: false,
        }
    }
}

/// Host notification service.
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    /// Install foreground presentation options.
    fn configure_presentation(&self, options: PresentationOptions);

    /// Whether permission is already granted.
    async fn permission_granted(&self) -> NotifyResult<bool>;

    /// Ask the user for permission.
    async fn request_permission(&self) -> NotifyResult<bool>;

    /// Create or update a delivery channel. Must be idempotent.
    async fn ensure_channel(&self, channel: &DeliveryChannel) -> NotifyResult<()>;

    /// Drop every pending notification.
    async fn cancel_all_scheduled(&self) -> NotifyResult<()>;

    /// Schedule one notification.
    async fn schedule_at(&self, request: NotificationRequest) -> NotifyResult<()>;
}

#[derive(Debug)]
struct SchedulerState {
    pending: Vec<NotificationRequest>,
    granted: bool,
    grantable: bool,
    permission_requests: usize,
    channels: Vec<DeliveryChannel>,
    presentation: Option<PresentationOptions>,
    cancel_calls: usize,
    fail_after: Option<usize>,
}

/// In-process scheduler that keeps pending notifications in a queue.
///
/// Hosts without a native scheduler drain it with [`MemoryScheduler::take_due`].
#[derive(Debug)]
pub struct MemoryScheduler {
    state: Mutex<SchedulerState>,
}

impl Default for MemoryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScheduler {
    /// Scheduler with permission already granted.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SchedulerState {
                pending: Vec::new(),
                granted: true,
                grantable: true,
                permission_requests: 0,
                channels: Vec::new(),
                presentation: None,
                cancel_calls: 0,
                fail_after: None,
            }),
        }
    }

    /// Scheduler that grants permission only when asked.
    pub fn prompting() -> Self {
        let scheduler = Self::new();
        scheduler.lock().granted = false;
        scheduler
    }

    /// Scheduler whose permission can never be granted.
    pub fn denied() -> Self {
        let scheduler = Self::new();
        {
            let mut state = scheduler.lock();
            state.granted = false;
            state.grantable = false;
        }
        scheduler
    }

    /// Reject every `schedule_at` after the first `count` succeed.
    pub fn fail_after(self, count: usize) -> Self {
        self.lock().fail_after = Some(count);
        self
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Snapshot of pending notifications, in scheduling order.
    pub fn pending(&self) -> Vec<NotificationRequest> {
        self.lock().pending.clone()
    }

    /// Remove and return every notification due at or before `now`.
    pub fn take_due(&self, now: NaiveDateTime) -> Vec<NotificationRequest> {
        let mut state = self.lock();
        let (due, rest): (Vec<_>, Vec<_>) = state
            .pending
            .drain(..)
            .partition(|request| request.trigger_at <= now);
        state.pending = rest;
        due
    }

    /// Earliest pending trigger.
    pub fn next_trigger(&self) -> Option<NaiveDateTime> {
        self.lock().pending.iter().map(|r| r.trigger_at).min()
    }

    pub fn permission_requests(&self) -> usize {
        self.lock().permission_requests
    }

    pub fn cancel_calls(&self) -> usize {
        self.lock().cancel_calls
    }

    pub fn channels(&self) -> Vec<DeliveryChannel> {
        self.lock().channels.clone()
    }

    pub fn presentation(&self) -> Option<PresentationOptions> {
        self.lock().presentation
    }
}

#[async_trait]
impl NotificationScheduler for MemoryScheduler {
    fn configure_presentation(&self, options: PresentationOptions) {
        self.lock().presentation = Some(options);
    }

    async fn permission_granted(&self) -> NotifyResult<bool> {
        Ok(self.lock().granted)
    }

    async fn request_permission(&self) -> NotifyResult<bool> {
        let mut state = self.lock();
        state.permission_requests += 1;
        state.granted = state.grantable;
        Ok(state.granted)
    }

    async fn ensure_channel(&self, channel: &DeliveryChannel) -> NotifyResult<()> {
        let mut state = self.lock();
        match state.channels.iter_mut().find(|c| c.id == channel.id) {
            Some(existing) => *existing = channel.clone(),
            None => state.channels.push(channel.clone()),
        }
        Ok(())
    }

    async fn cancel_all_scheduled(&self) -> NotifyResult<()> {
        let mut state = self.lock();
        state.cancel_calls += 1;
        state.pending.clear();
        Ok(())
    }

    async fn schedule_at(&self, request: NotificationRequest) -> NotifyResult<()> {
        let mut state = self.lock();
        if let Some(limit) = state.fail_after {
            if state.pending.len() >= limit {
                return Err(NotifyError::Schedule(format!(
                    "scheduler rejected reminder for {} {}",
                    request.data.date, request.data.slot
                )));
            }
        }
        state.pending.push(request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(hour: u32) -> NotificationRequest {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        NotificationRequest {
            trigger_at: date.and_hms_opt(hour, 0, 0).unwrap(),
            title: "t".into(),
            body: "b".into(),
            channel_id: None,
            data: NotificationData { slot: Slot::Morning, date },
        }
    }

    #[tokio::test]
    async fn test_take_due_splits_queue() {
        let scheduler = MemoryScheduler::new();
        scheduler.schedule_at(request(8)).await.unwrap();
        scheduler.schedule_at(request(19)).await.unwrap();

        let now = request(12).trigger_at;
        let due = scheduler.take_due(now);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].trigger_at, request(8).trigger_at);
        assert_eq!(scheduler.pending().len(), 1);
        assert_eq!(scheduler.next_trigger(), Some(request(19).trigger_at));
    }

    #[tokio::test]
    async fn test_permission_states() {
        let prompting = MemoryScheduler::prompting();
        assert!(!prompting.permission_granted().await.unwrap());
        assert!(prompting.request_permission().await.unwrap());
        assert!(prompting.permission_granted().await.unwrap());

        let denied = MemoryScheduler::denied();
        assert!(!denied.request_permission().await.unwrap());
        assert_eq!(denied.permission_requests(), 1);
    }

    #[tokio::test]
    async fn test_channel_setup_is_idempotent() {
        let scheduler = MemoryScheduler::new();
        let channel = DeliveryChannel::default();
        scheduler.ensure_channel(&channel).await.unwrap();
        scheduler.ensure_channel(&channel).await.unwrap();
        assert_eq!(scheduler.channels(), vec![channel]);
    }
}
