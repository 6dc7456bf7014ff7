//! In-process session store.
//!
//! Lives exactly as long as the process, which is the terminal equivalent of
//! a browser tab's session storage.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::ports::SessionStore;

/// Session store backed by a mutex-protected map.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slots: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // Every operation replaces or reads a whole value, so a poisoned map is
    // still consistent.
    fn slots(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.slots().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.slots().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        if self.slots().remove(key).is_some() {
            tracing::debug!("Session slot {} removed", key);
        }
    }
}
