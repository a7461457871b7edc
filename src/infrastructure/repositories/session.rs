use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::{DomainError, DomainResult, SessionRepository, User};
use crate::infrastructure::storage::KeyValueStore;
use crate::shared::errors::InfraError;

/// Storage key holding the session user.
pub const SESSION_KEY: &str = "session";

pub struct KvSessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl KvSessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Strict read, surfacing `SessionCorrupt` and storage failures.
    pub async fn load(&self) -> DomainResult<Option<User>> {
        let Some(raw) = self.store.get(SESSION_KEY).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| DomainError::SessionCorrupt(e.to_string()))
    }
}

#[async_trait]
impl SessionRepository for KvSessionStore {
    async fn get(&self) -> Option<User> {
        match self.load().await {
            Ok(user) => user,
            Err(err @ DomainError::SessionCorrupt(_)) => {
                warn!(error = %err, "Discarding corrupt session, continuing as guest");
                if let Err(e) = self.store.remove(SESSION_KEY).await {
                    warn!(error = %e, "Failed to remove corrupt session");
                }
                None
            }
            Err(err) => {
                warn!(error = %err, "Session unreadable, continuing as guest");
                None
            }
        }
    }

    async fn set(&self, user: &User) -> DomainResult<()> {
        let raw = serde_json::to_string(user).map_err(InfraError::from)?;
        self.store.put(SESSION_KEY, raw).await?;
        Ok(())
    }

    async fn clear(&self) -> DomainResult<()> {
        self.store.remove(SESSION_KEY).await?;
        Ok(())
    }
}
