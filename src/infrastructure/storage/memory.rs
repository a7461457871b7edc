//! In-memory storage implementation

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::KeyValueStore;
use crate::shared::errors::InfraError;

/// In-memory store for development and testing.
///
/// Clones share the same entries, so a second repository built from a
/// clone sees what the first one wrote (a simulated reload).
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw access for tests that need to plant bad data.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, InfraError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: &str, value: String) -> Result<(), InfraError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), InfraError> {
        self.entries.remove(key);
        Ok(())
    }
}
