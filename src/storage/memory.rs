// In-memory key-value store
// Author: kelexine (https://github.com/kelexine)

use super::KeyValueStore;
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Keeps values for the lifetime of the instance only.
///
/// Used when no storage path is configured and by tests that need to share
/// "durable" state between two governors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
