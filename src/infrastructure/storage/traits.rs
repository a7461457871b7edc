//! Storage trait definitions

use async_trait::async_trait;

use crate::shared::errors::InfraError;

/// Persistent key-value surface. Values are JSON documents.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, InfraError>;
    async fn put(&self, key: &str, value: String) -> Result<(), InfraError>;
    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), InfraError>;
}
