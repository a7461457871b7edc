//! Authentication service
//!
//! Login, registration, verification codes, logout and profile updates
//! against the directory and the session slot. Every check-then-act
//! sequence runs behind a single write gate, so two registrations can never
//! both pass the uniqueness check.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use validator::Validate;

use super::verification::{VerificationCodes, VerificationHandle};
use crate::config::AuthConfig;
use crate::domain::{
    name_from_identifier, ContactType, DirectoryRepository, DomainError, DomainResult,
    ProfilePatch, RegisterUserDto, RoleRegistry, SessionRepository, User,
};
use crate::notifications::{
    Event, ProfileUpdatedEvent, SessionEvent, SharedEventBus, VerificationCodeEvent,
};
use crate::shared::validations::{is_valid_email, is_valid_mobile};

/// Orchestrates every identity use case.
pub struct AuthService {
    directory: Arc<dyn DirectoryRepository>,
    sessions: Arc<dyn SessionRepository>,
    registry: RoleRegistry,
    codes: VerificationCodes,
    events: SharedEventBus,
    latency: Duration,
    cancel: CancellationToken,
    write_gate: Mutex<()>,
}

impl AuthService {
    pub fn new(
        directory: Arc<dyn DirectoryRepository>,
        sessions: Arc<dyn SessionRepository>,
        events: SharedEventBus,
        config: &AuthConfig,
    ) -> Self {
        Self {
            directory,
            sessions,
            registry: RoleRegistry::new(),
            codes: VerificationCodes::from_config(config),
            events,
            latency: config.simulated_latency(),
            cancel: CancellationToken::new(),
            write_gate: Mutex::new(()),
        }
    }

    /// Tie the service to an outer token. Cancelling it aborts calls that
    /// are still suspended, before they touch any state.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    // ── Session ─────────────────────────────────────────────────

    /// Read the persisted session at start-up. Anything unreadable is a guest.
    pub async fn restore_session(&self) -> Option<User> {
        let user = self.sessions.get().await;
        match &user {
            Some(u) => info!(user_id = %u.id, role = %u.role, "Session restored"),
            None => debug!("No session to restore, starting as guest"),
        }
        user
    }

    pub async fn current_user(&self) -> Option<User> {
        self.sessions.get().await
    }

    // ── Authentication ──────────────────────────────────────────

    /// Log in by email, phone or name.
    ///
    /// An unknown identifier with a role hint synthesises a demo user for
    /// that role. There is no credential check.
    pub async fn login(&self, identifier: &str, role_hint: Option<&str>) -> DomainResult<User> {
        let result = self.login_inner(identifier.trim(), role_hint).await;
        record_outcome("auth_logins_total", &result);
        result
    }

    async fn login_inner(&self, identifier: &str, role_hint: Option<&str>) -> DomainResult<User> {
        if identifier.is_empty() {
            return Err(DomainError::Validation("identifier is required".into()));
        }

        self.suspend().await?;
        let _gate = self.write_gate.lock().await;

        let user = match self.directory.find_by_identifier(identifier).await? {
            Some(user) => user,
            None => {
                let Some(code) = role_hint else {
                    return Err(DomainError::UserNotFound(identifier.to_string()));
                };
                let role = self.registry.resolve(code)?;

                let mut user = User::new(name_from_identifier(identifier), role);
                if is_valid_email(identifier) {
                    user.email = Some(identifier.to_string());
                } else if is_valid_mobile(identifier) {
                    user.phone = Some(identifier.to_string());
                }

                self.directory.append(user.clone()).await?;
                info!(user_id = %user.id, role = %user.role, "Demo user created on login");
                user
            }
        };

        self.start_session(&user).await?;
        Ok(user)
    }

    // ── Verification codes ──────────────────────────────────────

    pub async fn send_verification_code(&self, phone: &str) -> DomainResult<VerificationHandle> {
        let result = self.send_code_inner(phone.trim()).await;
        record_outcome("auth_verification_codes_total", &result);
        result
    }

    async fn send_code_inner(&self, phone: &str) -> DomainResult<VerificationHandle> {
        if !is_valid_mobile(phone) {
            return Err(DomainError::InvalidPhoneFormat(phone.to_string()));
        }

        self.suspend().await?;
        let handle = self.codes.issue(phone)?;

        info!(phone, "Verification code issued");
        self.events
            .publish(Event::VerificationCodeIssued(VerificationCodeEvent {
                phone: phone.to_string(),
                cooldown_secs: handle.cooldown_secs,
                timestamp: Utc::now(),
            }));
        Ok(handle)
    }

    /// Check and consume a previously issued code.
    pub fn verify_code(&self, phone: &str, code: &str) -> DomainResult<()> {
        self.codes.verify(phone.trim(), code.trim())
    }

    // ── Registration ────────────────────────────────────────────

    pub async fn register(
        &self,
        username: &str,
        contact: &str,
        contact_type: ContactType,
        role: &str,
    ) -> DomainResult<User> {
        self.register_user(RegisterUserDto::new(username, contact, contact_type, role))
            .await
    }

    pub async fn register_user(&self, dto: RegisterUserDto) -> DomainResult<User> {
        let result = self.register_inner(dto).await;
        record_outcome("auth_registrations_total", &result);
        result
    }

    async fn register_inner(&self, dto: RegisterUserDto) -> DomainResult<User> {
        dto.validate()
            .map_err(|e| DomainError::Validation(e.to_string()))?;
        check_contact(&dto.contact, dto.contact_type)?;

        self.suspend().await?;
        let _gate = self.write_gate.lock().await;

        if self
            .directory
            .exists_by_contact(&dto.contact, dto.contact_type)
            .await?
        {
            return Err(DomainError::DuplicateContact {
                contact: dto.contact,
                contact_type: dto.contact_type,
            });
        }

        let role = self.registry.resolve(&dto.role)?;
        let user = User::new(dto.username, role).with_contact(dto.contact, dto.contact_type);
        self.directory.append(user.clone()).await?;

        info!(user_id = %user.id, role = %user.role, "New user registered");
        self.events.publish(Event::UserRegistered(session_event(&user)));

        self.start_session(&user).await?;
        Ok(user)
    }

    // ── Logout ──────────────────────────────────────────────────

    /// Clear the session. The directory is untouched.
    pub async fn logout(&self) -> DomainResult<()> {
        self.suspend().await?;
        let _gate = self.write_gate.lock().await;

        let previous = self.sessions.get().await;
        self.sessions.clear().await?;

        if let Some(user) = previous {
            info!(user_id = %user.id, "Session ended");
            self.events.publish(Event::SessionEnded(session_event(&user)));
        }
        Ok(())
    }

    // ── Profile ─────────────────────────────────────────────────

    /// Merge profile fields into the stored user. If that user holds the
    /// session, the session copy is rewritten too.
    pub async fn update_user(&self, id: &str, patch: ProfilePatch) -> DomainResult<User> {
        if let Some(email) = &patch.email {
            check_contact(email, ContactType::Email)?;
        }
        if let Some(phone) = &patch.phone {
            check_contact(phone, ContactType::Phone)?;
        }

        let _gate = self.write_gate.lock().await;

        let current = self
            .directory
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(id.to_string()))?;

        for (contact, contact_type) in [
            (patch.email.as_deref(), ContactType::Email),
            (patch.phone.as_deref(), ContactType::Phone),
        ] {
            let Some(contact) = contact else { continue };
            if !owns_contact(&current, contact, contact_type)
                && self.directory.exists_by_contact(contact, contact_type).await?
            {
                return Err(DomainError::DuplicateContact {
                    contact: contact.to_string(),
                    contact_type,
                });
            }
        }

        let updated = self.directory.update(id, patch).await?;

        let session_refreshed = match self.sessions.get().await {
            Some(session_user) if session_user.id == updated.id => {
                self.sessions.set(&updated).await?;
                true
            }
            _ => false,
        };

        info!(user_id = %updated.id, session_refreshed, "Profile updated");
        self.events.publish(Event::ProfileUpdated(ProfileUpdatedEvent {
            user_id: updated.id.clone(),
            session_refreshed,
            timestamp: Utc::now(),
        }));
        Ok(updated)
    }

    // ── Helpers ─────────────────────────────────────────────────

    async fn start_session(&self, user: &User) -> DomainResult<()> {
        self.sessions.set(user).await?;
        info!(user_id = %user.id, role = %user.role, "Session started");
        self.events.publish(Event::SessionStarted(session_event(user)));
        Ok(())
    }

    /// Simulated backend latency, abandoned as soon as the token fires.
    async fn suspend(&self) -> DomainResult<()> {
        if self.cancel.is_cancelled() {
            return Err(DomainError::Cancelled);
        }
        if self.latency.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = self.cancel.cancelled() => Err(DomainError::Cancelled),
            _ = tokio::time::sleep(self.latency) => Ok(()),
        }
    }
}

fn check_contact(contact: &str, contact_type: ContactType) -> DomainResult<()> {
    match contact_type {
        ContactType::Phone if !is_valid_mobile(contact) => {
            Err(DomainError::InvalidPhoneFormat(contact.to_string()))
        }
        ContactType::Email if !is_valid_email(contact) => Err(DomainError::Validation(format!(
            "invalid email address: {}",
            contact
        ))),
        _ => Ok(()),
    }
}

fn owns_contact(user: &User, contact: &str, contact_type: ContactType) -> bool {
    match (contact_type, user.contact(contact_type)) {
        (ContactType::Email, Some(own)) => own.eq_ignore_ascii_case(contact),
        (ContactType::Phone, Some(own)) => own == contact,
        (_, None) => false,
    }
}

fn session_event(user: &User) -> SessionEvent {
    SessionEvent {
        user_id: user.id.clone(),
        role: user.role,
        timestamp: Utc::now(),
    }
}

fn record_outcome<T>(name: &'static str, result: &DomainResult<T>) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    counter!(name, "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Permission, UserRole};
    use crate::infrastructure::storage::InMemoryStore;
    use crate::infrastructure::{KvDirectory, KvSessionStore};
    use crate::notifications::create_event_bus;

    struct Fixture {
        store: InMemoryStore,
        service: Arc<AuthService>,
    }

    fn service_over(store: &InMemoryStore, config: &AuthConfig) -> AuthService {
        AuthService::new(
            Arc::new(KvDirectory::new(Arc::new(store.clone()))),
            Arc::new(KvSessionStore::new(Arc::new(store.clone()))),
            create_event_bus(),
            config,
        )
    }

    fn fixture_with(config: AuthConfig) -> Fixture {
        let store = InMemoryStore::new();
        let service = Arc::new(service_over(&store, &config));
        Fixture { store, service }
    }

    fn fixture() -> Fixture {
        fixture_with(AuthConfig::default())
    }

    #[tokio::test]
    async fn test_demo_login_stamps_role_permissions() {
        let registry = RoleRegistry::new();
        for role in UserRole::ALL {
            let fx = fixture();
            let identifier = format!("{}_demo@xinhuashe.com", role);
            let user = fx.service.login(&identifier, Some(role.as_str())).await.unwrap();

            let def = registry.definition(role);
            assert_eq!(user.role, role);
            assert_eq!(user.role_name, def.display_name);
            assert_eq!(user.permissions, def.default_permissions());
            assert!(user.authenticated);
            assert_eq!(user.name, format!("{}_demo", role));
        }
    }

    #[tokio::test]
    async fn test_demo_login_is_persisted_and_found_again() {
        let fx = fixture();
        let first = fx
            .service
            .login("root_admin_demo@xinhuashe.com", Some("root_admin"))
            .await
            .unwrap();
        assert_eq!(first.email.as_deref(), Some("root_admin_demo@xinhuashe.com"));

        // second login finds the same record, the hint is ignored
        let second = fx
            .service
            .login("root_admin_demo@xinhuashe.com", Some("buyer"))
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.role, UserRole::RootAdmin);
    }

    #[tokio::test]
    async fn test_login_unknown_without_hint() {
        let fx = fixture();
        let err = fx.service.login("ghost", None).await.unwrap_err();
        assert_eq!(err, DomainError::UserNotFound("ghost".into()));
        assert!(fx.service.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_login_with_bad_role_hint() {
        let fx = fixture();
        let err = fx.service.login("ghost", Some("overlord")).await.unwrap_err();
        assert_eq!(err, DomainError::RoleNotFound("overlord".into()));
    }

    #[tokio::test]
    async fn test_login_blank_identifier() {
        let fx = fixture();
        assert!(matches!(
            fx.service.login("   ", Some("creator")).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_register_then_session_holds_user() {
        let fx = fixture();
        let user = fx
            .service
            .register("Alice", "a@x.com", ContactType::Email, "creator")
            .await
            .unwrap();

        assert_eq!(fx.service.current_user().await, Some(user.clone()));
        assert!(user.has_permission(Permission::UploadWorks));
        assert_eq!(user.email.as_deref(), Some("a@x.com"));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let fx = fixture();
        fx.service
            .register("Alice", "a@x.com", ContactType::Email, "creator")
            .await
            .unwrap();
        let err = fx
            .service
            .register("Bob", "a@x.com", ContactType::Email, "creator")
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DomainError::DuplicateContact {
                contact: "a@x.com".into(),
                contact_type: ContactType::Email
            }
        );
    }

    #[tokio::test]
    async fn test_email_and_phone_uniqueness_are_independent() {
        let fx = fixture();
        fx.service
            .register("Alice", "a@x.com", ContactType::Email, "creator")
            .await
            .unwrap();
        fx.service
            .register("Bob", "13800000000", ContactType::Phone, "buyer")
            .await
            .unwrap();
        let err = fx
            .service
            .register("Carol", "13800000000", ContactType::Phone, "buyer")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateContact { contact_type: ContactType::Phone, .. }));
    }

    #[tokio::test]
    async fn test_register_checks_duplicate_before_role() {
        let fx = fixture();
        fx.service
            .register("Alice", "a@x.com", ContactType::Email, "creator")
            .await
            .unwrap();
        let err = fx
            .service
            .register("Bob", "a@x.com", ContactType::Email, "nonsense")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateContact { .. }));

        let err = fx
            .service
            .register("Bob", "b@x.com", ContactType::Email, "nonsense")
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::RoleNotFound("nonsense".into()));
    }

    #[tokio::test]
    async fn test_register_rejects_malformed_contacts() {
        let fx = fixture();
        assert_eq!(
            fx.service
                .register("Bob", "12345", ContactType::Phone, "buyer")
                .await
                .unwrap_err(),
            DomainError::InvalidPhoneFormat("12345".into())
        );
        assert!(matches!(
            fx.service.register("Bob", "nope", ContactType::Email, "buyer").await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            fx.service.register("", "b@x.com", ContactType::Email, "buyer").await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_admit_one() {
        let fx = fixture_with(AuthConfig {
            simulated_latency_ms: 5,
            ..AuthConfig::default()
        });

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let service = fx.service.clone();
                tokio::spawn(async move {
                    service
                        .register(&format!("user{}", i), "same@x.com", ContactType::Email, "creator")
                        .await
                })
            })
            .collect();

        let mut ok = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => assert!(matches!(e, DomainError::DuplicateContact { .. })),
            }
        }
        assert_eq!(ok, 1);

        let reloaded = KvDirectory::new(Arc::new(fx.store.clone()));
        assert_eq!(reloaded.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_logout_clears_session_only() {
        let fx = fixture();
        let user = fx
            .service
            .register("Alice", "a@x.com", ContactType::Email, "creator")
            .await
            .unwrap();

        fx.service.logout().await.unwrap();
        assert!(fx.service.current_user().await.is_none());

        let again = fx.service.login("a@x.com", None).await.unwrap();
        assert_eq!(again.id, user.id);
    }

    #[tokio::test]
    async fn test_update_keeps_role_and_refreshes_session() {
        let fx = fixture();
        let user = fx
            .service
            .register("Alice", "a@x.com", ContactType::Email, "enterprise")
            .await
            .unwrap();

        let updated = fx
            .service
            .update_user(&user.id, ProfilePatch::name("NewName"))
            .await
            .unwrap();

        assert_eq!(updated.name, "NewName");
        assert_eq!(updated.role, user.role);
        assert_eq!(updated.permissions, user.permissions);
        assert_eq!(fx.service.current_user().await, Some(updated));
    }

    #[tokio::test]
    async fn test_update_other_user_leaves_session_alone() {
        let fx = fixture();
        let alice = fx
            .service
            .register("Alice", "a@x.com", ContactType::Email, "creator")
            .await
            .unwrap();
        let bob = fx
            .service
            .register("Bob", "b@x.com", ContactType::Email, "buyer")
            .await
            .unwrap();

        fx.service
            .update_user(&alice.id, ProfilePatch::name("Alicia"))
            .await
            .unwrap();
        assert_eq!(fx.service.current_user().await, Some(bob));
    }

    #[tokio::test]
    async fn test_update_rejects_taken_contact() {
        let fx = fixture();
        let alice = fx
            .service
            .register("Alice", "a@x.com", ContactType::Email, "creator")
            .await
            .unwrap();
        fx.service
            .register("Bob", "b@x.com", ContactType::Email, "buyer")
            .await
            .unwrap();

        let patch = ProfilePatch {
            email: Some("B@x.com".into()),
            ..Default::default()
        };
        assert!(matches!(
            fx.service.update_user(&alice.id, patch).await,
            Err(DomainError::DuplicateContact { .. })
        ));

        // re-submitting one's own address is fine
        let patch = ProfilePatch {
            email: Some("a@x.com".into()),
            ..Default::default()
        };
        assert!(fx.service.update_user(&alice.id, patch).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let fx = fixture();
        assert_eq!(
            fx.service
                .update_user("nope", ProfilePatch::name("x"))
                .await
                .unwrap_err(),
            DomainError::UserNotFound("nope".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_verification_code_flow() {
        let fx = fixture();
        assert_eq!(
            fx.service.send_verification_code("12345").await.unwrap_err(),
            DomainError::InvalidPhoneFormat("12345".into())
        );

        let handle = fx.service.send_verification_code("13800000000").await.unwrap();
        assert!(matches!(
            fx.service.send_verification_code("13800000000").await,
            Err(DomainError::CodeCooldown { .. })
        ));

        assert!(fx.service.verify_code("13800000000", &handle.code).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_without_side_effects() {
        let token = CancellationToken::new();
        let store = InMemoryStore::new();
        let config = AuthConfig {
            simulated_latency_ms: 800,
            ..AuthConfig::default()
        };
        let service = Arc::new(service_over(&store, &config).with_cancellation(token.clone()));

        let pending = {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .register("Alice", "a@x.com", ContactType::Email, "creator")
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        token.cancel();

        assert_eq!(pending.await.unwrap().unwrap_err(), DomainError::Cancelled);
        assert!(service.current_user().await.is_none());
        assert!(matches!(
            service.login("a@x.com", None).await,
            Err(DomainError::Cancelled)
        ));
        let directory = KvDirectory::new(Arc::new(store));
        assert!(directory.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restore_session_after_reload() {
        let fx = fixture();
        let user = fx
            .service
            .login("root_admin_demo@xinhuashe.com", Some("root_admin"))
            .await
            .unwrap();

        let reloaded = service_over(&fx.store, &AuthConfig::default());
        assert_eq!(reloaded.restore_session().await, Some(user));
    }
}
