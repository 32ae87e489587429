//! Synchronous settings persistence.

use crate::settings::Settings;
use crate::{js_err, WidgetError};
use log::{debug, warn};

/// Key of the settings record in the synchronous store.
pub const SETTINGS_KEY: &str = "countdownSettings";

/// Minimal string key-value store, implemented by `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, WidgetError>;
    fn set(&self, key: &str, value: &str) -> Result<(), WidgetError>;
    fn remove(&self, key: &str) -> Result<(), WidgetError>;
}

impl KeyValueStore for web_sys::Storage {
    fn get(&self, key: &str) -> Result<Option<String>, WidgetError> {
        self.get_item(key)
            .map_err(|e| WidgetError::Storage(js_err(e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WidgetError> {
        self.set_item(key, value)
            .map_err(|e| WidgetError::Storage(js_err(e)))
    }

    fn remove(&self, key: &str) -> Result<(), WidgetError> {
        self.remove_item(key)
            .map_err(|e| WidgetError::Storage(js_err(e)))
    }
}

/// Reads and writes the [`Settings`] record under [`SETTINGS_KEY`].
pub struct SettingsGateway<S> {
    store: S,
}

impl<S: KeyValueStore> SettingsGateway<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Serialize and store. On failure the previously stored record is untouched.
    pub fn save(&self, settings: &Settings) -> Result<(), WidgetError> {
        let raw = serde_json::to_string(settings)
            .map_err(|e| WidgetError::Serialization(e.to_string()))?;
        self.store.set(SETTINGS_KEY, &raw)?;
        debug!("settings saved ({} bytes)", raw.len());
        Ok(())
    }

    /// Load the stored record. Absent, unreadable or corrupt records all yield `None`.
    pub fn load(&self) -> Option<Settings> {
        let raw = match self.store.get(SETTINGS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not read saved settings: {}", e);
                return None;
            }
        };
        match serde_json::from_str::<Settings>(&raw) {
            Ok(settings) => Some(settings),
            Err(e) => {
                warn!("Ignoring corrupt saved settings: {}", e);
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), WidgetError> {
        self.store.remove(SETTINGS_KEY)
    }
}

/// Gateway over the window's `localStorage`.
pub fn local_settings() -> Result<SettingsGateway<web_sys::Storage>, WidgetError> {
    let storage = web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .ok_or(WidgetError::StorageUnavailable)?;
    Ok(SettingsGateway::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Animation;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStore {
        items: RefCell<HashMap<String, String>>,
        read_only: bool,
    }

    impl KeyValueStore for &MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>, WidgetError> {
            Ok(self.items.borrow().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), WidgetError> {
            if self.read_only {
                return Err(WidgetError::Storage("QuotaExceededError".into()));
            }
            self.items.borrow_mut().insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), WidgetError> {
            self.items.borrow_mut().remove(key);
            Ok(())
        }
    }

    fn launch_settings() -> Settings {
        Settings {
            target_date: "2030-06-01T09:30".into(),
            title: "Launch".into(),
            title_size: "32".into(),
            day_color: "#ff6b6b".into(),
            has_background: true,
            animation: Animation::Pulse,
            animation_speed: "1.5".into(),
            ..Settings::default()
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemoryStore::default();
        let gateway = SettingsGateway::new(&store);
        assert_eq!(gateway.load(), None);

        let settings = launch_settings();
        gateway.save(&settings).unwrap();
        let loaded = gateway.load().expect("settings stored");
        assert_eq!(loaded, settings);
        assert_eq!(loaded.title, "Launch");
        assert_eq!(loaded.title_size, "32");
        assert_eq!(loaded.day_color, "#ff6b6b");
    }

    #[test]
    fn corrupt_record_loads_as_none() {
        let store = MemoryStore::default();
        store
            .items
            .borrow_mut()
            .insert(SETTINGS_KEY.to_string(), "{not json".to_string());
        assert_eq!(SettingsGateway::new(&store).load(), None);
    }

    #[test]
    fn failed_save_keeps_previous_record() {
        let mut store = MemoryStore::default();
        SettingsGateway::new(&store).save(&launch_settings()).unwrap();
        store.read_only = true;

        let gateway = SettingsGateway::new(&store);
        let changed = Settings {
            title: "Other".into(),
            ..launch_settings()
        };
        assert!(gateway.save(&changed).is_err());
        assert_eq!(gateway.load().map(|s| s.title), Some("Launch".to_string()));
    }

    #[test]
    fn clear_removes_record() {
        let store = MemoryStore::default();
        let gateway = SettingsGateway::new(&store);
        gateway.save(&launch_settings()).unwrap();
        gateway.clear().unwrap();
        assert_eq!(gateway.load(), None);
        assert!(store.items.borrow().is_empty());
    }
}
