//! Application state and logic.

use crate::config::{Config, APP_NAME};
use crate::form::{FormAction, TaskForm};
use crate::notify::DesktopScheduler;
use chrono::{Duration, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use reminder_core::export::{available_months, export_month, step_month};
use reminder_core::recurrence::{active_tasks, is_active_for_date, summarize_day, DaySummary};
use reminder_core::settings::{parse_time_of_day, save_notifications_enabled, save_slot_times};
use reminder_core::{
    ChangeEvent, Clock, CoreError, CoreResult, FileStore, KeyValueStore, PlannerConfig,
    RefreshDispatcher, RefreshOutcome, RefreshPlanner, Settings, Slot, SystemClock, Task,
    TaskBook, TaskHistory, TaskId,
};
use std::sync::Arc;
use tokio::task::JoinHandle;

const SAVE_FAILED: &str = "저장에 실패했습니다. 다시 시도해주세요.";

/// Current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Tasks for the selected date with slot toggles.
    Today,
    /// Every task with its schedule.
    Tasks,
    /// Reminder times, the enable flag and export.
    Settings,
}

/// Message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Warning,
    Error,
}

/// Confirmation dialog.
#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

/// Confirm action type.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    DeleteTask(TaskId),
}

/// Rows of the settings view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsRow {
    SlotTime(Slot),
    Notifications,
    Export,
}

impl SettingsRow {
    pub const ALL: [SettingsRow; 5] = [
        SettingsRow::SlotTime(Slot::Morning),
        SettingsRow::SlotTime(Slot::Noon),
        SettingsRow::SlotTime(Slot::Evening),
        SettingsRow::Notifications,
        SettingsRow::Export,
    ];
}

/// Application state.
pub struct App {
    /// Configuration.
    pub config: Config,
    /// Task collection.
    pub book: TaskBook,
    /// Completion logs.
    pub history: TaskHistory,
    /// Reminder times and enable flag.
    pub settings: Settings,
    store: Arc<dyn KeyValueStore>,
    /// Pending reminder queue.
    pub scheduler: Arc<DesktopScheduler>,
    dispatcher: RefreshDispatcher,
    clock: Arc<dyn Clock>,
    /// Current view.
    pub view: View,
    /// Local date as of the last tick.
    pub today: NaiveDate,
    /// Date shown in the today view.
    pub selected_date: NaiveDate,
    /// Selected row in the task lists.
    pub selected_index: usize,
    /// Slot column toggled by space.
    pub selected_slot: Slot,
    /// Selected row in the settings view.
    pub settings_index: usize,
    /// Month offered for export.
    pub export_month: Option<String>,
    /// Open add/edit form.
    pub form: Option<TaskForm>,
    /// Reminder time being typed.
    pub time_input: Option<(Slot, String)>,
    /// Message to display.
    pub message: Option<(String, MessageType)>,
    /// Show help popup.
    pub show_help: bool,
    /// Confirmation dialog.
    pub confirm_dialog: Option<ConfirmDialog>,
    /// Result of the last finished refresh.
    pub last_outcome: Option<RefreshOutcome>,
    refresh_task: Option<JoinHandle<Option<RefreshOutcome>>>,
    queued_refresh: Option<ChangeEvent>,
}

impl App {
    /// Open the app with file storage and desktop delivery.
    pub async fn open(config: Config) -> anyhow::Result<Self> {
        let store = match &config.storage.data_dir {
            Some(dir) => FileStore::new(dir),
            None => FileStore::for_app(APP_NAME)?,
        };
        tracing::debug!(dir = %store.dir().display(), "opening store");
        let store: Arc<dyn KeyValueStore> = Arc::new(store);
        let scheduler = Arc::new(DesktopScheduler::new(config.notifications.desktop));
        Ok(Self::new(config, store, scheduler, Arc::new(SystemClock)).await)
    }

    /// Create the app on explicit collaborators and kick off the first refresh.
    pub async fn new(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        scheduler: Arc<DesktopScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let today = clock.today();
        let keys = config.storage_keys();
        let history = TaskHistory::load(store.clone(), keys.history).await;
        let book = TaskBook::load(store.clone(), keys, today).await;
        let settings = Settings::load(store.as_ref()).await;

        let mut planner_config = PlannerConfig::default();
        if let Some(title) = &config.notifications.title {
            planner_config.title = title.clone();
        }
        let planner = RefreshPlanner::new(store.clone(), scheduler.clone(), clock.clone())
            .with_config(planner_config);
        let export_month = available_months(history.logs()).pop();

        let mut app = Self {
            config,
            book,
            history,
            settings,
            store,
            scheduler,
            dispatcher: RefreshDispatcher::new(Arc::new(planner)),
            clock,
            view: View::Today,
            today,
            selected_date: today,
            selected_index: 0,
            selected_slot: Slot::Morning,
            settings_index: 0,
            export_month,
            form: None,
            time_input: None,
            message: None,
            show_help: false,
            confirm_dialog: None,
            last_outcome: None,
            refresh_task: None,
            queued_refresh: None,
        };
        app.request_refresh(ChangeEvent::Startup);
        app
    }

    /// Check if in editing mode.
    pub fn is_editing(&self) -> bool {
        self.form.is_some() || self.time_input.is_some()
    }

    /// Tasks listed in the current view.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        match self.view {
            View::Today if !self.config.display.show_inactive => {
                active_tasks(self.book.tasks(), self.selected_date)
            }
            _ => self.book.tasks().iter().collect(),
        }
    }

    /// Get selected task.
    pub fn selected_task(&self) -> Option<&Task> {
        self.visible_tasks().get(self.selected_index).copied()
    }

    /// Completion counts for the selected date.
    pub fn day_summary(&self) -> DaySummary {
        summarize_day(
            self.book.tasks(),
            self.history.log_for(self.selected_date),
            self.selected_date,
        )
    }

    /// Whether `slot` of `task` is done on the selected date.
    pub fn is_taken(&self, task: &Task, slot: Slot) -> bool {
        self.history
            .log_for(self.selected_date)
            .is_some_and(|log| log.is_taken(&task.id, slot))
    }

    /// Get view title.
    pub fn view_title(&self) -> &str {
        match self.view {
            View::Today => "오늘의 할 일",
            View::Tasks => "할 일 목록",
            View::Settings => "설정",
        }
    }

    /// Ask for a reminder rebuild; requests made while one runs are coalesced.
    fn request_refresh(&mut self, event: ChangeEvent) {
        if self.refresh_task.as_ref().is_some_and(|h| !h.is_finished()) {
            self.queued_refresh = Some(event);
            return;
        }
        let handle = self.dispatcher.dispatch(
            event,
            self.book.tasks().to_vec(),
            self.history.logs().to_vec(),
        );
        self.refresh_task = Some(handle);
    }

    async fn collect_refresh(&mut self, handle: JoinHandle<Option<RefreshOutcome>>) {
        match handle.await {
            Ok(Some(outcome)) => {
                if outcome == RefreshOutcome::PermissionDenied {
                    self.message = Some((
                        "알림 권한이 없어 알림을 예약하지 못했습니다.".to_string(),
                        MessageType::Warning,
                    ));
                }
                self.last_outcome = Some(outcome);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "refresh task ended abnormally"),
        }
        if let Some(event) = self.queued_refresh.take() {
            self.request_refresh(event);
        }
    }

    /// Periodic work: finish refreshes, roll the date, deliver due reminders.
    pub async fn tick(&mut self) {
        if self.refresh_task.as_ref().is_some_and(|h| h.is_finished()) {
            if let Some(handle) = self.refresh_task.take() {
                self.collect_refresh(handle).await;
            }
        }

        let now = self.clock.now();
        if now.date() != self.today {
            if self.selected_date == self.today {
                self.selected_date = now.date();
            }
            self.today = now.date();
            self.request_refresh(ChangeEvent::DayChanged);
        }

        let delivered = self.scheduler.deliver_due(now);
        if let Some(last) = delivered.last() {
            let first_line = last.body.lines().next().unwrap_or_default();
            self.message = Some((format!("알림 · {}", first_line), MessageType::Info));
        }
    }

    /// Wait for every pending refresh, including coalesced ones.
    #[cfg(test)]
    pub async fn settle(&mut self) -> Option<RefreshOutcome> {
        while let Some(handle) = self.refresh_task.take() {
            self.collect_refresh(handle).await;
        }
        self.last_outcome
    }

    /// Handle key input.
    pub async fn handle_key(&mut self, key: KeyEvent) {
        // Handle confirmation dialog
        if let Some(dialog) = self.confirm_dialog.clone() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.confirm_dialog = None;
                    self.execute_confirm(dialog.action).await;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm_dialog = None;
                }
                _ => {}
            }
            return;
        }

        // Handle help popup
        if self.show_help {
            self.show_help = false;
            return;
        }

        if self.form.is_some() {
            self.handle_form_key(key).await;
            return;
        }

        if self.time_input.is_some() {
            self.handle_time_key(key).await;
            return;
        }

        // Clear message on any key
        self.message = None;

        match key.code {
            // Views
            KeyCode::Char('1') => self.switch_view(View::Today),
            KeyCode::Char('2') => self.switch_view(View::Tasks),
            KeyCode::Char('3') => self.switch_view(View::Settings),

            // Help
            KeyCode::Char('?') => self.show_help = true,

            _ => match self.view {
                View::Today => self.handle_today_key(key).await,
                View::Tasks => self.handle_tasks_key(key),
                View::Settings => self.handle_settings_key(key).await,
            },
        }
    }

    fn switch_view(&mut self, view: View) {
        self.view = view;
        self.selected_index = 0;
    }

    async fn handle_today_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('h') | KeyCode::Left => self.change_date(-1),
            KeyCode::Char('l') | KeyCode::Right => self.change_date(1),
            KeyCode::Char('t') => {
                self.selected_date = self.today;
                self.clamp_selection();
            }
            KeyCode::Tab => self.selected_slot = next_slot(self.selected_slot, 1),
            KeyCode::BackTab => self.selected_slot = next_slot(self.selected_slot, -1),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_slot().await,
            _ => {}
        }
    }

    fn handle_tasks_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('a') => self.form = Some(TaskForm::new(self.today)),
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(task) = self.selected_task() {
                    self.form = Some(TaskForm::edit(task));
                }
            }
            KeyCode::Char('d') => self.confirm_delete_task(),
            _ => {}
        }
    }

    async fn handle_settings_key(&mut self, key: KeyEvent) {
        let row = SettingsRow::ALL[self.settings_index.min(SettingsRow::ALL.len() - 1)];
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.settings_index = (self.settings_index + 1).min(SettingsRow::ALL.len() - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.settings_index = self.settings_index.saturating_sub(1);
            }
            KeyCode::Char('h') | KeyCode::Left if row == SettingsRow::Export => self.step_export_month(-1),
            KeyCode::Char('l') | KeyCode::Right if row == SettingsRow::Export => self.step_export_month(1),
            KeyCode::Enter | KeyCode::Char(' ') => match row {
                SettingsRow::SlotTime(slot) => {
                    let current = self.settings.slot_times.get(slot).to_string();
                    self.time_input = Some((slot, current));
                }
                SettingsRow::Notifications => self.toggle_notifications().await,
                SettingsRow::Export => self.export_history().await,
            },
            _ => {}
        }
    }

    async fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match form.handle_key(key) {
            FormAction::Continue => {}
            FormAction::Cancel => self.form = None,
            FormAction::Submit(draft) => {
                let task_id = form.task_id.clone();
                let result = match &task_id {
                    Some(id) => self.book.update_task(id, draft).await,
                    None => self.book.add_task(draft).await.map(|_| ()),
                };
                match result {
                    Err(CoreError::Validation(e)) => {
                        if let Some(form) = self.form.as_mut() {
                            form.error = Some(e.user_message().to_string());
                        }
                    }
                    result => {
                        self.form = None;
                        self.after_mutation(result, ChangeEvent::TasksChanged, "저장했습니다.");
                    }
                }
            }
        }
    }

    async fn handle_time_key(&mut self, key: KeyEvent) {
        let Some((slot, input)) = self.time_input.as_mut() else {
            return;
        };
        let slot = *slot;
        match key.code {
            KeyCode::Esc => self.time_input = None,
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == ':' => input.push(c),
            KeyCode::Enter => match parse_time_of_day(input) {
                Some(time) => {
                    self.time_input = None;
                    self.settings.slot_times.set(slot, time);
                    let result = save_slot_times(self.store.as_ref(), &self.settings.slot_times).await;
                    self.after_mutation(
                        result.map_err(CoreError::from),
                        ChangeEvent::SettingsChanged,
                        "알림 시간을 변경했습니다.",
                    );
                }
                None => {
                    self.message = Some((
                        "시간 형식이 올바르지 않습니다. (HH:MM)".to_string(),
                        MessageType::Warning,
                    ));
                }
            },
            _ => {}
        }
    }

    /// Report a mutation's result and refresh reminders.
    ///
    /// Edits stay applied in memory even when saving fails, so the refresh
    /// runs either way.
    fn after_mutation(&mut self, result: CoreResult<()>, event: ChangeEvent, success: &str) {
        match result {
            Ok(()) => self.message = Some((success.to_string(), MessageType::Success)),
            Err(e) => {
                tracing::warn!(error = %e, "save failed");
                self.message = Some((SAVE_FAILED.to_string(), MessageType::Error));
            }
        }
        self.clamp_selection();
        self.request_refresh(event);
    }

    /// Move selection by delta.
    fn move_selection(&mut self, delta: i32) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }

        let new_index = self.selected_index as i32 + delta;
        self.selected_index = new_index.clamp(0, len as i32 - 1) as usize;
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_tasks().len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    /// Change selected date.
    fn change_date(&mut self, delta: i64) {
        self.selected_date += Duration::days(delta);
        self.clamp_selection();
    }

    /// Toggle the selected slot of the selected task.
    async fn toggle_slot(&mut self) {
        let Some(task) = self.selected_task().cloned() else {
            return;
        };
        let slot = self.selected_slot;

        if !is_active_for_date(&task, self.selected_date) {
            self.message = Some((
                "이 날짜에 예정된 할 일이 아닙니다.".to_string(),
                MessageType::Warning,
            ));
            return;
        }
        if !task.times.get(slot) {
            self.message = Some((
                format!("{} 시간대에는 할 일이 없습니다.", slot.label()),
                MessageType::Warning,
            ));
            return;
        }

        let result = self.history.toggle(&task.id, slot, self.selected_date).await;
        let success = match &result {
            Ok(true) => format!("{} {} 완료", task.name, slot.label()),
            _ => format!("{} {} 완료 취소", task.name, slot.label()),
        };
        if self.export_month.is_none() {
            self.export_month = available_months(self.history.logs()).pop();
        }
        self.after_mutation(result.map(|_| ()), ChangeEvent::HistoryChanged, &success);
    }

    /// Confirm delete task.
    fn confirm_delete_task(&mut self) {
        if let Some(task) = self.selected_task() {
            self.confirm_dialog = Some(ConfirmDialog {
                title: "할 일 삭제".to_string(),
                message: format!("'{}'을(를) 삭제할까요? (y/n)", task.name),
                action: ConfirmAction::DeleteTask(task.id.clone()),
            });
        }
    }

    /// Execute confirmed action.
    async fn execute_confirm(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteTask(id) => {
                let result = self.book.remove_task(&id).await.map(|_| ());
                self.after_mutation(result, ChangeEvent::TasksChanged, "삭제했습니다.");
            }
        }
    }

    async fn toggle_notifications(&mut self) {
        let enabled = !self.settings.notifications_enabled;
        self.settings.notifications_enabled = enabled;
        let result = save_notifications_enabled(self.store.as_ref(), enabled).await;
        let success = if enabled {
            "알림을 켰습니다."
        } else {
            "알림을 껐습니다."
        };
        self.after_mutation(result.map_err(CoreError::from), ChangeEvent::SettingsChanged, success);
    }

    fn step_export_month(&mut self, step: i32) {
        let months = available_months(self.history.logs());
        let Some(current) = self.export_month.as_deref() else {
            return;
        };
        if let Some(month) = step_month(&months, current, step) {
            self.export_month = Some(month.to_string());
        }
    }

    /// Write the selected month's report into the data directory.
    async fn export_history(&mut self) {
        let Some(month) = self.export_month.clone() else {
            self.message = Some((
                "공유할 기록이 없어요. 기록이 있는 달을 먼저 선택해주세요.".to_string(),
                MessageType::Warning,
            ));
            return;
        };
        let Some(text) = export_month(self.book.tasks(), self.history.logs(), &month, self.today) else {
            self.message = Some((
                "선택한 기간에 공유할 내용이 없습니다.".to_string(),
                MessageType::Warning,
            ));
            return;
        };
        let Some(dir) = self.config.data_dir() else {
            self.message = Some(("공유에 실패했습니다.".to_string(), MessageType::Error));
            return;
        };

        let path = dir.join(format!("alimi-{}.txt", month));
        let written = match tokio::fs::create_dir_all(&dir).await {
            Ok(()) => tokio::fs::write(&path, text).await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => {
                tracing::info!(path = %path.display(), "history exported");
                self.message = Some((format!("내보냈습니다: {}", path.display()), MessageType::Success));
            }
            Err(e) => {
                tracing::warn!(error = %e, "export failed");
                self.message = Some(("공유에 실패했습니다.".to_string(), MessageType::Error));
            }
        }
    }
}

fn next_slot(slot: Slot, delta: isize) -> Slot {
    let index = Slot::ALL.iter().position(|s| *s == slot).unwrap_or(0) as isize;
    Slot::ALL[(index + delta).rem_euclid(Slot::ALL.len() as isize) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use reminder_core::error::{StoreError, StoreResult};
    use reminder_core::{FixedClock, MemoryStore};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn at(day: u32, hour: u32, minute: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    struct Harness {
        app: App,
        clock: Arc<FixedClock>,
        _dir: tempfile::TempDir,
    }

    async fn harness_with(store: Arc<dyn KeyValueStore>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.data_dir = Some(dir.path().to_path_buf());
        let clock = Arc::new(FixedClock::new(at(10, 7, 0)));
        let mut app = App::new(
            config,
            store,
            Arc::new(DesktopScheduler::headless()),
            clock.clone(),
        )
        .await;
        app.settle().await;
        Harness {
            app,
            clock,
            _dir: dir,
        }
    }

    async fn harness() -> Harness {
        harness_with(Arc::new(MemoryStore::new())).await
    }

    async fn press(app: &mut App, keys: &[KeyCode]) {
        for code in keys {
            app.handle_key(key(*code)).await;
        }
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c))).await;
        }
    }

    async fn add_task(app: &mut App, name: &str) {
        press(app, &[KeyCode::Char('2'), KeyCode::Char('a')]).await;
        type_text(app, name).await;
        press(app, &[KeyCode::Enter]).await;
    }

    #[tokio::test]
    async fn test_adding_task_schedules_reminders() {
        let mut h = harness().await;
        assert_eq!(h.app.last_outcome, Some(RefreshOutcome::Scheduled { count: 0 }));

        add_task(&mut h.app, "Vitamin").await;
        assert!(h.app.form.is_none());
        assert_eq!(h.app.book.tasks().len(), 1);
        assert_eq!(h.app.settle().await, Some(RefreshOutcome::Scheduled { count: 7 }));
        assert_eq!(h.app.scheduler.pending_count(), 7);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_numbered() {
        let mut h = harness().await;
        add_task(&mut h.app, "Walk").await;
        add_task(&mut h.app, "Walk").await;
        let names: Vec<&str> = h.app.book.tasks().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Walk", "Walk (2)"]);
    }

    #[tokio::test]
    async fn test_completing_today_skips_todays_reminder() {
        let mut h = harness().await;
        add_task(&mut h.app, "Vitamin").await;
        h.app.settle().await;

        press(&mut h.app, &[KeyCode::Char('1'), KeyCode::Char(' ')]).await;
        let task = h.app.book.tasks()[0].clone();
        assert!(h.app.is_taken(&task, Slot::Morning));
        assert_eq!(h.app.day_summary(), DaySummary { scheduled: 1, taken: 1 });

        assert_eq!(h.app.settle().await, Some(RefreshOutcome::Scheduled { count: 6 }));
        assert_eq!(h.app.scheduler.next_trigger(), Some(at(11, 8, 0)));
    }

    #[tokio::test]
    async fn test_toggle_on_disabled_slot_warns() {
        let mut h = harness().await;
        add_task(&mut h.app, "Vitamin").await;
        press(&mut h.app, &[KeyCode::Char('1'), KeyCode::Tab, KeyCode::Char(' ')]).await;
        assert!(matches!(h.app.message, Some((_, MessageType::Warning))));
        assert!(h.app.history.logs().is_empty());
    }

    #[tokio::test]
    async fn test_disabling_notifications_clears_queue() {
        let mut h = harness().await;
        add_task(&mut h.app, "Vitamin").await;
        h.app.settle().await;

        h.app.settings_index = 3;
        press(&mut h.app, &[KeyCode::Char('3'), KeyCode::Enter]).await;
        assert!(!h.app.settings.notifications_enabled);
        assert_eq!(h.app.settle().await, Some(RefreshOutcome::Disabled));
        assert_eq!(h.app.scheduler.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_editing_slot_time_moves_reminders() {
        let mut h = harness().await;
        add_task(&mut h.app, "Vitamin").await;
        h.app.settle().await;

        press(&mut h.app, &[KeyCode::Char('3'), KeyCode::Enter]).await;
        assert_eq!(h.app.time_input, Some((Slot::Morning, "08:00".to_string())));
        for _ in 0..5 {
            press(&mut h.app, &[KeyCode::Backspace]).await;
        }
        type_text(&mut h.app, "9:3").await;
        press(&mut h.app, &[KeyCode::Enter]).await;
        assert_eq!(h.app.settings.slot_times.morning, "09:03");

        h.app.settle().await;
        assert_eq!(h.app.scheduler.next_trigger(), Some(at(10, 9, 3)));
    }

    #[tokio::test]
    async fn test_tick_delivers_due_reminders_and_rolls_date() {
        let mut h = harness().await;
        add_task(&mut h.app, "Vitamin").await;
        h.app.settle().await;

        h.clock.set(at(10, 8, 1));
        h.app.tick().await;
        let (message, _) = h.app.message.clone().unwrap();
        assert!(message.contains("Vitamin"));
        assert_eq!(h.app.scheduler.pending_count(), 6);

        h.clock.set(at(11, 0, 5));
        h.app.tick().await;
        assert_eq!(h.app.today, NaiveDate::from_ymd_opt(2024, 1, 11).unwrap());
        assert_eq!(h.app.selected_date, h.app.today);
        assert_eq!(h.app.settle().await, Some(RefreshOutcome::Scheduled { count: 7 }));
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let mut h = harness().await;
        add_task(&mut h.app, "Walk").await;
        press(&mut h.app, &[KeyCode::Char('d'), KeyCode::Char('n')]).await;
        assert_eq!(h.app.book.tasks().len(), 1);

        press(&mut h.app, &[KeyCode::Char('d'), KeyCode::Char('y')]).await;
        assert!(h.app.book.tasks().is_empty());
    }

    #[tokio::test]
    async fn test_export_writes_report() {
        let mut h = harness().await;
        add_task(&mut h.app, "Vitamin").await;
        press(&mut h.app, &[KeyCode::Char('1'), KeyCode::Char(' ')]).await;
        assert_eq!(h.app.export_month.as_deref(), Some("2024-01"));

        h.app.settings_index = 4;
        press(&mut h.app, &[KeyCode::Char('3'), KeyCode::Enter]).await;
        let path = h.app.config.data_dir().unwrap().join("alimi-2024-01.txt");
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("- Vitamin: 아침 완료"));
    }

    struct ReadOnlyStore;

    #[async_trait::async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: String) -> StoreResult<()> {
            Err(StoreError::Backend("read-only".into()))
        }
    }

    #[tokio::test]
    async fn test_save_failure_shows_message() {
        let mut h = harness_with(Arc::new(ReadOnlyStore)).await;
        add_task(&mut h.app, "Walk").await;
        assert_eq!(
            h.app.message,
            Some((SAVE_FAILED.to_string(), MessageType::Error))
        );
    }
}
