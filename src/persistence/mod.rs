use std::{
    fs,
    path::PathBuf,
};

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    de::DeserializeOwned,
    Deserialize,
    Serialize,
};

use crate::core::SpeechBubbleError;

const APP_NAME: &str = "speechbubble";

pub fn get_app_config_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(config_dir) => config_dir.join(APP_NAME),
        None => PathBuf::from("."),
    }
}

pub fn get_app_cache_dir() -> PathBuf {
    match dirs::cache_dir() {
        Some(cache_dir) => cache_dir.join(APP_NAME),
        None => PathBuf::from(".").join("cache"),
    }
}

/// On-disk layout of a cache file.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEnvelope<T> {
    pub timestamp: DateTime<Utc>,
    pub data: T,
}

/// One JSON file per key, invalidated by age only. No locking: last writer wins.
#[derive(Debug, Clone)]
pub struct JsonCache {
    dir: PathBuf,
}

impl JsonCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> Result<(), SpeechBubbleError> {
        fs::create_dir_all(&self.dir)?;
        let envelope = CacheEnvelope { timestamp: Utc::now(), data };
        let json = serde_json::to_string_pretty(&envelope)?;
        let file_path = self.path_for(key);
        fs::write(&file_path, json)?;
        log::debug!("Cache saved to: {}", file_path.display());
        Ok(())
    }

    /// `None` on a missing file, an unreadable envelope, or an entry older than `max_age`.
    pub fn load<T: DeserializeOwned>(&self, key: &str, max_age: chrono::Duration) -> Option<T> {
        self.load_at(key, max_age, Utc::now())
    }

    fn load_at<T: DeserializeOwned>(
        &self,
        key: &str,
        max_age: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Option<T> {
        let file_path = self.path_for(key);
        let json = match fs::read_to_string(&file_path) {
            Ok(json) => json,
            Err(e) => {
                log::debug!("Cache miss for {}: {}", key, e);
                return None;
            }
        };

        let envelope: CacheEnvelope<T> = match serde_json::from_str(&json) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::debug!("Ignoring unreadable cache file {}: {}", file_path.display(), e);
                return None;
            }
        };

        let age = now.signed_duration_since(envelope.timestamp);
        if age > max_age {
            log::debug!("Cache entry {} is stale ({} minutes old)", key, age.num_minutes());
            return None;
        }

        log::debug!("Cache hit: {}", file_path.display());
        Some(envelope.data)
    }
}
