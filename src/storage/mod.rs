use crate::models::CefrLevel;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;

pub(crate) const QUIZ_KEY: &str = "lumiere_local_quizzes";
pub(crate) const STORY_KEY: &str = "lumiere_local_stories";
pub(crate) const PROGRESS_KEY: &str = "lumiere_progress";
pub(crate) const STUDY_GUIDE_KEY: &str = "lumiere_study_guides";
pub(crate) const DEVICE_ID_KEY: &str = "lumiere_device_id";
pub(crate) const THEME_KEY: &str = "theme";

const VOCAB_PREFIX: &str = "lumiere_vocab_";

/// Vocabulary is partitioned per level, e.g. `lumiere_vocab_A1`.
pub(crate) fn vocab_key(level: CefrLevel) -> String {
    format!("{VOCAB_PREFIX}{level}")
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("localStorage unavailable")]
    Unavailable,
    #[error("localStorage write failed: {0}")]
    Write(String),
    #[error("could not encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable string key/value store scoped to this device.
///
/// Collections are stored as one JSON array per key and always rewritten whole,
/// so concurrent writers to one key are last-write-wins.
pub trait LocalStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str);

    /// Absent or unparsable collections read as empty.
    fn list<T: DeserializeOwned>(&self, key: &str) -> Vec<T>
    where
        Self: Sized,
    {
        let Some(json) = self.get_item(key) else {
            return Vec::new();
        };
        match serde_json::from_str(&json) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding corrupt local collection");
                Vec::new()
            }
        }
    }

    fn replace<T: Serialize>(&self, key: &str, items: &[T])
    where
        Self: Sized,
    {
        let res = serde_json::to_string(items)
            .map_err(StorageError::from)
            .and_then(|json| self.set_item(key, &json));
        if let Err(e) = res {
            tracing::warn!(key, error = %e, "local write failed");
        }
    }
}

/// `window.localStorage`. Every call resolves the storage handle anew, so a
/// missing window (or disabled storage) just behaves like an empty store.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window().and_then(|w| w.local_storage().ok().flatten())
    }
}

impl LocalStore for BrowserStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let storage = Self::storage().ok_or(StorageError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|e| StorageError::Write(format!("{e:?}")))
    }

    fn remove_item(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}

/// In-process store, used off the browser and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.lock().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self
            .items
            .lock()
            .map_err(|e| StorageError::Write(e.to_string()))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        if let Ok(mut items) = self.items.lock() {
            items.remove(key);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// `None` means the user never picked one; callers decide the default.
pub fn load_theme(store: &impl LocalStore) -> Option<Theme> {
    match store.get_item(THEME_KEY)?.as_str() {
        "dark" => Some(Theme::Dark),
        "light" => Some(Theme::Light),
        _ => None,
    }
}

pub fn save_theme(store: &impl LocalStore, theme: Theme) {
    if let Err(e) = store.set_item(THEME_KEY, theme.as_ref()) {
        tracing::warn!(error = %e, "could not persist theme");
    }
}

/// Flip the theme and remember it as the user's choice.
pub fn toggle_theme(store: &impl LocalStore, current: Theme) -> Theme {
    let next = current.toggled();
    save_theme(store, next);
    next
}
