use async_trait::async_trait;

use crate::domain::{DomainResult, User};

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Current session user. Unreadable or corrupt state reads as `None`.
    async fn get(&self) -> Option<User>;
    /// Replaces any previous session unconditionally.
    async fn set(&self, user: &User) -> DomainResult<()>;
    async fn clear(&self) -> DomainResult<()>;
}
