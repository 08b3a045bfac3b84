//! Browser LocalStorage store

use super::{KeyValueStore, PersistenceError};

#[derive(Debug, Default)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        Self
    }

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let storage = Self::storage()
            .ok_or_else(|| PersistenceError::Unavailable("LocalStorage disabled".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|e| PersistenceError::Unavailable(format!("{:?}", e)))
    }
}
