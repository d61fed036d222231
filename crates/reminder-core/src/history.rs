//! Completion log ownership.

use crate::error::CoreResult;
use crate::models::{log_for_date, DailyLog, Slot};
use crate::store::{load_json_list, save_json_list, KeyValueStore};
use chrono::NaiveDate;
use std::sync::Arc;

/// Per-date completion records, persisted as one list.
pub struct TaskHistory {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    logs: Vec<DailyLog>,
    unreadable: Vec<serde_json::Value>,
}

impl TaskHistory {
    /// Load the logs. Records with a bad date are kept aside and saved back.
    pub async fn load(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        let list = load_json_list(store.as_ref(), key, |value| {
            serde_json::from_value::<DailyLog>(value.clone()).ok()
        })
        .await;
        tracing::debug!(days = list.records.len(), unreadable = list.unreadable.len(), "loaded history");
        Self {
            store,
            key,
            logs: list.records,
            unreadable: list.unreadable,
        }
    }

    pub fn logs(&self) -> &[DailyLog] {
        &self.logs
    }

    pub fn log_for(&self, date: NaiveDate) -> Option<&DailyLog> {
        log_for_date(&self.logs, date)
    }

    /// Flip one slot of a task on `date` and persist. Returns the new state.
    pub async fn toggle(&mut self, task_id: &str, slot: Slot, date: NaiveDate) -> CoreResult<bool> {
        let index = match self.logs.iter().position(|log| log.date == date) {
            Some(index) => index,
            None => {
                self.logs.push(DailyLog::new(date));
                self.logs.len() - 1
            }
        };
        let taken = self.logs[index].toggle(task_id, slot);
        tracing::debug!(task_id, %slot, %date, taken, "slot toggled");
        save_json_list(self.store.as_ref(), self.key, &self.logs, &self.unreadable).await?;
        Ok(taken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StorageKeys};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_toggle_creates_log_lazily() {
        let store = Arc::new(MemoryStore::new());
        let key = StorageKeys::alimi().history;
        let mut history = TaskHistory::load(store.clone(), key).await;
        assert!(history.log_for(date(10)).is_none());

        assert!(history.toggle("t1", Slot::Morning, date(10)).await.unwrap());
        assert!(history.log_for(date(10)).unwrap().is_taken("t1", Slot::Morning));
        assert!(!history.toggle("t1", Slot::Morning, date(10)).await.unwrap());
        assert!(history.toggle("t1", Slot::Evening, date(11)).await.unwrap());
        assert_eq!(history.logs().len(), 2);

        let reloaded = TaskHistory::load(store, key).await;
        assert_eq!(reloaded.logs(), history.logs());
    }

    #[tokio::test]
    async fn test_stored_shape() {
        let store = Arc::new(MemoryStore::new());
        let mut history = TaskHistory::load(store.clone(), "H").await;
        history.toggle("t1", Slot::Noon, date(10)).await.unwrap();

        let raw = store.get("H").await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["date"], "2024-01-10");
        assert_eq!(value[0]["taken"]["t1"]["noon"], true);
    }

    #[tokio::test]
    async fn test_bad_date_keeps_other_logs() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(
                "H",
                r#"[{"date":"2024-01-09","taken":{"t1":{"morning":true}}},{"date":"bad","taken":{}}]"#
                    .to_string(),
            )
            .await
            .unwrap();

        let mut history = TaskHistory::load(store.clone(), "H").await;
        assert_eq!(history.logs().len(), 1);
        assert!(history.log_for(date(9)).unwrap().is_taken("t1", Slot::Morning));

        history.toggle("t1", Slot::Noon, date(10)).await.unwrap();

        let raw = store.get("H").await.unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let dates: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|log| log["date"].as_str())
            .collect();
        assert_eq!(dates, vec!["2024-01-09", "2024-01-10", "bad"]);
    }
}
