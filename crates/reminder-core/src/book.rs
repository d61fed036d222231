//! Task collection ownership and persistence.

use crate::dates::parse_date_key;
use crate::error::{CoreError, CoreResult, StoreResult};
use crate::models::{new_task_id, Recurrence, SlotFlags, Task, TaskDraft, TaskId};
use crate::names::{next_display_name, normalize_names, NormalizedTasks};
use crate::store::{load_json, load_json_list, save_json, save_json_list, KeyValueStore, StorageKeys};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Task as found in storage; older records may lack newer fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredTask {
    id: TaskId,
    name: String,
    #[serde(default)]
    times: SlotFlags,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    recurrence: Option<Recurrence>,
}

impl StoredTask {
    /// A blank start means today and a blank end means open-ended. Any other
    /// date that does not parse rejects the record.
    fn into_task(self, today: NaiveDate) -> Option<Task> {
        let start_date = match blank_to_none(self.start_date.as_deref()) {
            Some(key) => parse_date_key(key)?,
            None => today,
        };
        let end_date = match blank_to_none(self.end_date.as_deref()) {
            Some(key) => Some(parse_date_key(key)?),
            None => None,
        };
        Some(Task {
            id: self.id,
            name: self.name,
            times: self.times,
            start_date,
            end_date,
            recurrence: self.recurrence.unwrap_or_default(),
        })
    }
}

fn blank_to_none(key: Option<&str>) -> Option<&str> {
    key.map(str::trim).filter(|k| !k.is_empty())
}

/// The user's task collection.
///
/// Every mutation applies in memory, normalizes display names, then writes
/// the whole list and the name-to-id map back to the store.
pub struct TaskBook {
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
    tasks: Vec<Task>,
    // Stored records with dates that do not parse. Never active, but kept.
    unreadable: Vec<serde_json::Value>,
    id_map: BTreeMap<String, TaskId>,
}

impl TaskBook {
    /// Load tasks and the id map, filling defaults for older records.
    ///
    /// Records that do not decode are set aside and written back untouched
    /// on every save, so one bad record never costs the rest.
    pub async fn load(store: Arc<dyn KeyValueStore>, keys: StorageKeys, today: NaiveDate) -> Self {
        let list = load_json_list(store.as_ref(), keys.task_list, |value| {
            serde_json::from_value::<StoredTask>(value.clone())
                .ok()
                .and_then(|stored| stored.into_task(today))
        })
        .await;
        let id_map = load_json(store.as_ref(), keys.task_id_map, BTreeMap::new()).await;
        tracing::debug!(count = list.records.len(), unreadable = list.unreadable.len(), "loaded tasks");
        Self {
            store,
            keys,
            tasks: list.records,
            unreadable: list.unreadable,
            id_map,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn id_map(&self) -> &BTreeMap<String, TaskId> {
        &self.id_map
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Add a task and return its id.
    ///
    /// A name already in use gets a `" (N)"` suffix. If the id map remembers
    /// an id for the resulting name and no live task holds it, that id is
    /// reused so history recorded under it reattaches.
    pub async fn add_task(&mut self, draft: TaskDraft) -> CoreResult<TaskId> {
        draft.validate()?;

        let final_name = next_display_name(&self.tasks, draft.name.trim());
        let id = match self.id_map.get(&final_name) {
            Some(id) if self.get(id).is_none() => id.clone(),
            _ => new_task_id(),
        };

        let mut task = Task::from_draft(id.clone(), draft);
        task.name = final_name;
        let mut tasks = self.tasks.clone();
        tasks.push(task);

        let NormalizedTasks { tasks, id_map } = normalize_names(tasks);
        self.tasks = tasks;
        self.id_map.extend(id_map);
        tracing::info!(task_id = %id, "task added");
        self.persist().await?;
        Ok(id)
    }

    /// Replace a task's fields, keeping its id.
    pub async fn update_task(&mut self, id: &str, draft: TaskDraft) -> CoreResult<()> {
        draft.validate()?;
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))?;

        let mut tasks = self.tasks.clone();
        tasks[index] = Task::from_draft(id.to_string(), draft);
        self.replace(tasks);
        tracing::info!(task_id = %id, "task updated");
        self.persist().await?;
        Ok(())
    }

    /// Remove a task. Its completion history is left in place.
    pub async fn remove_task(&mut self, id: &str) -> CoreResult<Task> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::TaskNotFound(id.to_string()))?;

        let mut tasks = self.tasks.clone();
        let removed = tasks.remove(index);
        self.replace(tasks);
        tracing::info!(task_id = %id, "task removed");
        self.persist().await?;
        Ok(removed)
    }

    fn replace(&mut self, tasks: Vec<Task>) {
        let NormalizedTasks { tasks, id_map } = normalize_names(tasks);
        self.tasks = tasks;
        self.id_map = id_map;
    }

    async fn persist(&self) -> StoreResult<()> {
        save_json_list(self.store.as_ref(), self.keys.task_list, &self.tasks, &self.unreadable).await?;
        save_json(self.store.as_ref(), self.keys.task_id_map, &self.id_map).await
    }
}
