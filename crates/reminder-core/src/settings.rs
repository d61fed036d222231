//! Reminder settings: per-slot times and the global enable flag.
//!
//! Both values live in the key-value store under their own keys and are
//! loaded independently of tasks and history.

use crate::error::StoreResult;
use crate::models::Slot;
use crate::store::{load_json, save_json, KeyValueStore};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Store key for the slot times.
pub const SLOT_TIMES_KEY: &str = "BORINE_SETTINGS_MEAL_TIMES";
/// Store key for the global enable flag.
pub const NOTIFICATIONS_ENABLED_KEY: &str = "BORINE_SETTINGS_NOTIFICATION_ENABLED";

/// Reminder time of day for each slot, as `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTimes {
    #[serde(default = "default_morning")]
    pub morning: String,
    #[serde(default = "default_noon")]
    pub noon: String,
    #[serde(default = "default_evening")]
    pub evening: String,
}

impl Default for SlotTimes {
    fn default() -> Self {
        Self {
            morning: default_morning(),
            noon: default_noon(),
            evening: default_evening(),
        }
    }
}

fn default_morning() -> String {
    "08:00".to_string()
}

fn default_noon() -> String {
    "12:30".to_string()
}

fn default_evening() -> String {
    "19:00".to_string()
}

impl SlotTimes {
    /// Default `HH:MM` for a slot.
    pub fn default_for(slot: Slot) -> &'static str {
        match slot {
            Slot::Morning => "08:00",
            Slot::Noon => "12:30",
            Slot::Evening => "19:00",
        }
    }

    /// Configured string for a slot.
    pub fn get(&self, slot: Slot) -> &str {
        match slot {
            Slot::Morning => &self.morning,
            Slot::Noon => &self.noon,
            Slot::Evening => &self.evening,
        }
    }

    /// Replace a slot's time, normalized to `HH:MM`.
    pub fn set(&mut self, slot: Slot, time: NaiveTime) {
        let value = time.format("%H:%M").to_string();
        match slot {
            Slot::Morning => self.morning = value,
            Slot::Noon => self.noon = value,
            Slot::Evening => self.evening = value,
        }
    }

    /// Time of day for a slot; empty or malformed values use the default.
    pub fn resolve(&self, slot: Slot) -> NaiveTime {
        parse_time_of_day(self.get(slot))
            .or_else(|| parse_time_of_day(Self::default_for(slot)))
            .unwrap_or(NaiveTime::MIN)
    }
}

/// Parse `H:MM` or `HH:MM`.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let (hour, minute) = value.trim().split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Everything the planner reads before scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub slot_times: SlotTimes,
    pub notifications_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            slot_times: SlotTimes::default(),
            notifications_enabled: true,
        }
    }
}

impl Settings {
    /// Load both settings, falling back to defaults.
    pub async fn load(store: &dyn KeyValueStore) -> Self {
        Self {
            slot_times: load_slot_times(store).await,
            notifications_enabled: load_notifications_enabled(store).await,
        }
    }
}

/// Load slot times; missing slots use their defaults.
pub async fn load_slot_times(store: &dyn KeyValueStore) -> SlotTimes {
    load_json(store, SLOT_TIMES_KEY, SlotTimes::default()).await
}

pub async fn save_slot_times(store: &dyn KeyValueStore, times: &SlotTimes) -> StoreResult<()> {
    save_json(store, SLOT_TIMES_KEY, times).await
}

/// Load the global enable flag (default on).
pub async fn load_notifications_enabled(store: &dyn KeyValueStore) -> bool {
    load_json(store, NOTIFICATIONS_ENABLED_KEY, true).await
}

pub async fn save_notifications_enabled(store: &dyn KeyValueStore, enabled: bool) -> StoreResult<()> {
    save_json(store, NOTIFICATIONS_ENABLED_KEY, &enabled).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("08:00"), Some(hm(8, 0)));
        assert_eq!(parse_time_of_day("7:05"), Some(hm(7, 5)));
        assert_eq!(parse_time_of_day("24:00"), None);
        assert_eq!(parse_time_of_day("noon"), None);
        assert_eq!(parse_time_of_day(""), None);
    }

    #[test]
    fn test_resolve_falls_back_per_slot() {
        let times = SlotTimes {
            morning: "".into(),
            noon: "bogus".into(),
            evening: "21:15".into(),
        };
        assert_eq!(times.resolve(Slot::Morning), hm(8, 0));
        assert_eq!(times.resolve(Slot::Noon), hm(12, 30));
        assert_eq!(times.resolve(Slot::Evening), hm(21, 15));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let times: SlotTimes = serde_json::from_str(r#"{"noon":"13:00"}"#).unwrap();
        assert_eq!(times.morning, "08:00");
        assert_eq!(times.noon, "13:00");
        assert_eq!(times.evening, "19:00");
    }

    #[tokio::test]
    async fn test_settings_round_trip_through_store() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store).await, Settings::default());

        let mut times = SlotTimes::default();
        times.set(Slot::Evening, hm(20, 5));
        save_slot_times(&store, &times).await.unwrap();
        save_notifications_enabled(&store, false).await.unwrap();

        let loaded = Settings::load(&store).await;
        assert_eq!(loaded.slot_times.evening, "20:05");
        assert!(!loaded.notifications_enabled);
    }
}
