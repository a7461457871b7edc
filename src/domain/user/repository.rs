use async_trait::async_trait;

use super::{ContactType, ProfilePatch, User};
use crate::domain::DomainResult;

/// System of record for every known user. Entries are never deleted.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// Match by email, then phone, then name. First match wins.
    async fn find_by_identifier(&self, identifier: &str) -> DomainResult<Option<User>>;
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;
    async fn exists_by_contact(&self, contact: &str, contact_type: ContactType) -> DomainResult<bool>;

    /// Fails with `DuplicateUserId` rather than overwriting.
    async fn append(&self, user: User) -> DomainResult<()>;
    /// Fails with `UserNotFound` if `id` is absent.
    async fn update(&self, id: &str, patch: ProfilePatch) -> DomainResult<User>;

    /// All users in insertion order.
    async fn list(&self) -> DomainResult<Vec<User>>;
}
