//! Desktop delivery of scheduled reminders.
//!
//! The terminal has no OS-level scheduler, so reminders wait in an
//! in-process queue and the event loop delivers whatever is due each tick.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reminder_core::error::NotifyResult;
use reminder_core::{
    DeliveryChannel, MemoryScheduler, NotificationRequest, NotificationScheduler,
    PresentationOptions,
};
use std::sync::atomic::{AtomicBool, Ordering};

/// Queue-backed scheduler that pops reminders up on the desktop.
#[derive(Debug)]
pub struct DesktopScheduler {
    queue: MemoryScheduler,
    popups: bool,
    play_sound: AtomicBool,
}

impl DesktopScheduler {
    /// Scheduler that shows popups when `popups` is set.
    pub fn new(popups: bool) -> Self {
        Self {
            queue: MemoryScheduler::new(),
            popups,
            play_sound: AtomicBool::new(true),
        }
    }

    /// Scheduler that only records deliveries.
    #[cfg(test)]
    pub fn headless() -> Self {
        Self::new(false)
    }

    /// Number of reminders waiting.
    pub fn pending_count(&self) -> usize {
        self.queue.pending().len()
    }

    /// Earliest pending reminder time.
    pub fn next_trigger(&self) -> Option<NaiveDateTime> {
        self.queue.next_trigger()
    }

    /// Deliver every reminder due at `now` and return them.
    pub fn deliver_due(&self, now: NaiveDateTime) -> Vec<NotificationRequest> {
        let due = self.queue.take_due(now);
        for request in &due {
            tracing::info!(
                date = %request.data.date,
                slot = %request.data.slot,
                "delivering reminder"
            );
            if self.popups {
                self.show(request);
            }
        }
        due
    }

    #[cfg(target_os = "linux")]
    fn show(&self, request: &NotificationRequest) {
        let mut popup = notify_rust::Notification::new();
        popup.summary(&request.title).body(&request.body).appname("alimi");
        if self.play_sound.load(Ordering::Relaxed) {
            popup.sound_name("message-new-instant");
        }
        if let Err(e) = popup.show() {
            tracing::warn!(error = %e, "desktop notification failed");
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn show(&self, request: &NotificationRequest) {
        tracing::info!(title = %request.title, body = %request.body, "reminder");
    }
}

#[async_trait]
impl NotificationScheduler for DesktopScheduler {
    fn configure_presentation(&self, options: PresentationOptions) {
        self.play_sound.store(options.play_sound, Ordering::Relaxed);
        self.queue.configure_presentation(options);
    }

    async fn permission_granted(&self) -> NotifyResult<bool> {
        Ok(true)
    }

    async fn request_permission(&self) -> NotifyResult<bool> {
        Ok(true)
    }

    async fn ensure_channel(&self, channel: &DeliveryChannel) -> NotifyResult<()> {
        self.queue.ensure_channel(channel).await
    }

    async fn cancel_all_scheduled(&self) -> NotifyResult<()> {
        self.queue.cancel_all_scheduled().await
    }

    async fn schedule_at(&self, request: NotificationRequest) -> NotifyResult<()> {
        tracing::debug!(at = %request.trigger_at, "queued reminder");
        self.queue.schedule_at(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use reminder_core::{NotificationData, Slot};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn request(hour: u32, slot: Slot) -> NotificationRequest {
        NotificationRequest {
            trigger_at: at(hour),
            title: "보리네 알리미".into(),
            body: "body".into(),
            channel_id: None,
            data: NotificationData {
                slot,
                date: at(hour).date(),
            },
        }
    }

    #[tokio::test]
    async fn test_deliver_due_drains_only_past_reminders() {
        let scheduler = DesktopScheduler::headless();
        scheduler.schedule_at(request(8, Slot::Morning)).await.unwrap();
        scheduler.schedule_at(request(19, Slot::Evening)).await.unwrap();

        assert!(scheduler.deliver_due(at(7)).is_empty());
        let due = scheduler.deliver_due(at(9));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].data.slot, Slot::Morning);
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(scheduler.next_trigger(), Some(at(19)));
    }

    #[tokio::test]
    async fn test_permission_is_always_granted() {
        let scheduler = DesktopScheduler::headless();
        assert!(scheduler.permission_granted().await.unwrap());
        scheduler.configure_presentation(PresentationOptions {
            show_alert: true,
            play_sound: false,
            set_badge: false,
        });
        assert!(!scheduler.play_sound.load(Ordering::Relaxed));
    }
}
