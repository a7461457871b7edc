use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::{
    ContactType, DirectoryRepository, DomainError, DomainResult, ProfilePatch, User,
};
use crate::infrastructure::storage::KeyValueStore;
use crate::shared::errors::InfraError;

/// Storage key holding the ordered user list.
pub const USERS_KEY: &str = "users";

/// Where an unreadable `users` document is kept when a write starts over.
pub const CORRUPT_USERS_KEY: &str = "users.corrupt";

/// Directory persisted as a single JSON array under [`USERS_KEY`].
pub struct KvDirectory {
    store: Arc<dyn KeyValueStore>,
    write_gate: Mutex<()>,
}

impl KvDirectory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_gate: Mutex::new(()),
        }
    }

    async fn read_users(&self) -> Result<Vec<User>, InfraError> {
        match self.store.get(USERS_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Read path: any failure degrades to an empty directory.
    async fn snapshot(&self) -> Vec<User> {
        self.read_users().await.unwrap_or_else(|e| {
            warn!(error = %e, "User directory unreadable, treating as empty");
            Vec::new()
        })
    }

    /// Write path. An unparseable document is moved to [`CORRUPT_USERS_KEY`]
    /// before the directory starts over; it is never overwritten in place.
    async fn load_for_write(&self) -> DomainResult<Vec<User>> {
        let Some(raw) = self.store.get(USERS_KEY).await? else {
            return Ok(Vec::new());
        };
        let parse_error = match serde_json::from_str(&raw) {
            Ok(users) => return Ok(users),
            Err(e) => e,
        };

        if self.store.get(CORRUPT_USERS_KEY).await?.is_some() {
            return Err(DomainError::Storage(format!(
                "user directory is unreadable ({}) and {} is already occupied",
                parse_error, CORRUPT_USERS_KEY
            )));
        }
        self.store.put(CORRUPT_USERS_KEY, raw).await?;
        warn!(error = %parse_error, moved_to = CORRUPT_USERS_KEY, "Unreadable user directory set aside");
        Ok(Vec::new())
    }

    async fn write_users(&self, users: &[User]) -> DomainResult<()> {
        let raw = serde_json::to_string(users).map_err(InfraError::from)?;
        self.store.put(USERS_KEY, raw).await?;
        Ok(())
    }
}

fn contact_matches(user: &User, contact: &str, contact_type: ContactType) -> bool {
    match (contact_type, user.contact(contact_type)) {
        (ContactType::Email, Some(email)) => email.eq_ignore_ascii_case(contact),
        (ContactType::Phone, Some(phone)) => phone == contact,
        (_, None) => false,
    }
}

#[async_trait]
impl DirectoryRepository for KvDirectory {
    async fn find_by_identifier(&self, identifier: &str) -> DomainResult<Option<User>> {
        let users = self.snapshot().await;

        let found = users
            .iter()
            .find(|u| contact_matches(u, identifier, ContactType::Email))
            .or_else(|| users.iter().find(|u| contact_matches(u, identifier, ContactType::Phone)))
            .or_else(|| users.iter().find(|u| u.name == identifier));

        Ok(found.cloned())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.snapshot().await.into_iter().find(|u| u.id == id))
    }

    async fn exists_by_contact(&self, contact: &str, contact_type: ContactType) -> DomainResult<bool> {
        Ok(self
            .snapshot()
            .await
            .iter()
            .any(|u| contact_matches(u, contact, contact_type)))
    }

    async fn append(&self, user: User) -> DomainResult<()> {
        let _gate = self.write_gate.lock().await;
        let mut users = self.load_for_write().await?;

        if users.iter().any(|u| u.id == user.id) {
            return Err(DomainError::DuplicateUserId(user.id));
        }

        debug!(user_id = %user.id, total = users.len() + 1, "Appending user to directory");
        users.push(user);
        self.write_users(&users).await
    }

    async fn update(&self, id: &str, patch: ProfilePatch) -> DomainResult<User> {
        let _gate = self.write_gate.lock().await;
        let mut users = self.load_for_write().await?;

        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))?;
        patch.apply_to(user);
        let updated = user.clone();

        self.write_users(&users).await?;
        Ok(updated)
    }

    async fn list(&self) -> DomainResult<Vec<User>> {
        Ok(self.snapshot().await)
    }
}
