//! Best time, ranking, lifetime statistics and settings
//!
//! Everything lives in one JSON blob under [`STORAGE_KEY`]. Missing or
//! malformed fields fall back to their defaults one at a time; storage
//! failures are logged and never interrupt play.

mod storage;

pub use storage::{MemoryStorage, Storage};
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::highscores::HighScores;
use crate::settings::Settings;

/// Storage key for the save blob
pub const STORAGE_KEY: &str = "evade_infinity_data";

#[derive(Error, Debug)]
pub enum PersistError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveData {
    /// Longest run (ms)
    #[serde(deserialize_with = "lenient")]
    pub best_time: f64,
    #[serde(deserialize_with = "lenient")]
    pub top_scores: HighScores,
    #[serde(deserialize_with = "lenient")]
    pub total_play_time: f64,
    #[serde(deserialize_with = "lenient")]
    pub total_deaths: u32,
    #[serde(deserialize_with = "lenient")]
    pub near_miss_count: u32,
    #[serde(deserialize_with = "lenient")]
    pub settings: Settings,
    /// Keys this version does not know, written back untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Decode one field, falling back to its default if it has the wrong shape
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_else(|e| {
        log::warn!("Ignoring malformed save field: {}", e);
        T::default()
    }))
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            best_time: 0.0,
            top_scores: HighScores::new(),
            total_play_time: 0.0,
            total_deaths: 0,
            near_miss_count: 0,
            settings: Settings::default(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Lifetime totals for the stats screen
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stats {
    pub best_time: f64,
    pub total_play_time: f64,
    pub total_deaths: u32,
    pub near_miss_count: u32,
}

/// Save data cached in memory and written through on every change
pub struct Persistence<S: Storage> {
    storage: S,
    data: SaveData,
}

impl<S: Storage> Persistence<S> {
    /// Load from storage, falling back to defaults on any problem
    pub fn load(storage: S) -> Self {
        let data = match Self::read(&storage) {
            Ok(Some(data)) => {
                log::info!("Loaded save data ({} ranked runs)", data.top_scores.len());
                data
            }
            Ok(None) => {
                log::info!("No save data found, starting fresh");
                SaveData::default()
            }
            Err(e) => {
                log::warn!("Save data unreadable, using defaults: {}", e);
                SaveData::default()
            }
        };
        Self { storage, data }
    }

    fn read(storage: &S) -> Result<Option<SaveData>, PersistError> {
        let Some(json) = storage.get_item(STORAGE_KEY)? else {
            return Ok(None);
        };
        let mut data: SaveData = serde_json::from_str(&json)?;
        data.top_scores.normalize();
        data.settings = data.settings.sanitized();
        Ok(Some(data))
    }

    /// Write the cached data back to storage
    pub fn save(&mut self) -> Result<(), PersistError> {
        let json = serde_json::to_string(&self.data)?;
        self.storage.set_item(STORAGE_KEY, &json)
    }

    fn commit(&mut self) {
        if let Err(e) = self.save() {
            log::warn!("Failed to save data: {}", e);
        }
    }

    /// Record a finished run. Returns whether it set a new best time.
    pub fn record_run(&mut self, elapsed_ms: f64) -> bool {
        let is_new_record = elapsed_ms > self.data.best_time;
        if is_new_record {
            self.data.best_time = elapsed_ms;
        }
        self.data.top_scores.add_time(elapsed_ms);
        self.data.total_deaths += 1;
        self.commit();
        is_new_record
    }

    pub fn record_near_miss(&mut self, count: u32) {
        if count == 0 {
            return;
        }
        self.data.near_miss_count += count;
        self.commit();
    }

    pub fn record_play_time(&mut self, elapsed_ms: f64) {
        self.data.total_play_time += elapsed_ms.max(0.0);
        self.commit();
    }

    pub fn settings(&self) -> Settings {
        self.data.settings
    }

    /// Replace the stored settings, leaving all other data untouched
    pub fn save_settings(&mut self, settings: Settings) {
        self.data.settings = settings.sanitized();
        self.commit();
    }

    pub fn best_time(&self) -> f64 {
        self.data.best_time
    }

    pub fn top_scores(&self) -> &HighScores {
        &self.data.top_scores
    }

    pub fn stats(&self) -> Stats {
        Stats {
            best_time: self.data.best_time,
            total_play_time: self.data.total_play_time,
            total_deaths: self.data.total_deaths,
            near_miss_count: self.data.near_miss_count,
        }
    }

    pub fn data(&self) -> &SaveData {
        &self.data
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
