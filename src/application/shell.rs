//! Application shell
//!
//! Wires the auth service, navigation controller and overlays over one
//! event bus, and routes the results of auth calls into navigation.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use super::identity::AuthService;
use super::navigation::NavigationController;
use super::overlay::{ModalOrchestrator, Overlay};
use crate::config::{AppConfig, StorageBackend};
use crate::domain::{
    ContactType, DomainResult, NavigationState, ProfilePatch, User, ViewMode, ViewRequestOutcome,
};
use crate::infrastructure::{FileStore, InMemoryStore, KeyValueStore, KvDirectory, KvSessionStore};
use crate::notifications::{create_event_bus, SharedEventBus};

pub struct AppShell {
    auth: Arc<AuthService>,
    navigation: Arc<NavigationController>,
    overlays: Arc<ModalOrchestrator>,
    events: SharedEventBus,
    overlay_listener: JoinHandle<()>,
}

impl AppShell {
    /// Build over the configured storage backend.
    pub async fn build(config: &AppConfig) -> DomainResult<Self> {
        let store: Arc<dyn KeyValueStore> = match config.storage.backend {
            StorageBackend::Memory => Arc::new(InMemoryStore::new()),
            StorageBackend::File => {
                let store = FileStore::open(&config.storage.data_dir).await?;
                info!(dir = %store.dir().display(), "File storage opened");
                Arc::new(store)
            }
        };
        Ok(Self::with_store(store, config))
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>, config: &AppConfig) -> Self {
        let events = create_event_bus();
        let auth = Arc::new(AuthService::new(
            Arc::new(KvDirectory::new(store.clone())),
            Arc::new(KvSessionStore::new(store)),
            events.clone(),
            &config.auth,
        ));
        let navigation = Arc::new(NavigationController::new(&config.navigation, events.clone()));
        let overlays = Arc::new(ModalOrchestrator::new(events.clone()));
        let overlay_listener = overlays.close_on_navigation(&events);

        Self {
            auth,
            navigation,
            overlays,
            events,
            overlay_listener,
        }
    }

    /// Restore a persisted session and leave the splash screen if one exists.
    pub async fn boot(&self) -> Option<User> {
        let user = self.auth.restore_session().await;
        self.navigation.on_session_restored(user.as_ref());
        user
    }

    pub fn enter_as_guest(&self) -> bool {
        self.navigation.enter_as_guest()
    }

    pub async fn login(&self, identifier: &str, role_hint: Option<&str>) -> DomainResult<User> {
        let user = self.auth.login(identifier, role_hint).await?;
        self.session_started(&user);
        Ok(user)
    }

    pub async fn register(
        &self,
        username: &str,
        contact: &str,
        contact_type: ContactType,
        role: &str,
    ) -> DomainResult<User> {
        let user = self
            .auth
            .register(username, contact, contact_type, role)
            .await?;
        self.session_started(&user);
        Ok(user)
    }

    pub async fn logout(&self) -> DomainResult<()> {
        self.auth.logout().await?;
        self.overlays.close();
        self.navigation.on_logout();
        Ok(())
    }

    pub async fn update_profile(&self, id: &str, patch: ProfilePatch) -> DomainResult<User> {
        self.auth.update_user(id, patch).await
    }

    /// Guests asking for the workspace get the login overlay instead.
    pub fn request_view(&self, mode: ViewMode) -> ViewRequestOutcome {
        let outcome = self.navigation.request_view(mode);
        if outcome == ViewRequestOutcome::LoginRequired {
            self.overlays.open(Overlay::Login);
        }
        outcome
    }

    pub fn navigate_to_profile(&self, profile_id: impl Into<String>) -> ViewRequestOutcome {
        self.navigation.navigate_to_profile(profile_id)
    }

    /// Open the upload form, or the login form for guests. Returns what opened.
    pub fn open_upload(&self) -> Overlay {
        let overlay = if self.navigation.is_logged_in() {
            Overlay::Upload
        } else {
            Overlay::Login
        };
        self.overlays.open(overlay);
        overlay
    }

    pub fn state(&self) -> NavigationState {
        self.navigation.current_state()
    }

    pub fn auth(&self) -> &Arc<AuthService> {
        &self.auth
    }

    pub fn navigation(&self) -> &Arc<NavigationController> {
        &self.navigation
    }

    pub fn overlays(&self) -> &Arc<ModalOrchestrator> {
        &self.overlays
    }

    pub fn events(&self) -> &SharedEventBus {
        &self.events
    }

    /// Abort suspended auth calls. Further calls fail with `Cancelled`.
    pub fn shutdown(&self) {
        info!("Shutting down");
        self.auth.cancellation_token().cancel();
    }

    fn session_started(&self, user: &User) {
        self.overlays.close();
        self.navigation.on_session_started(user);
    }
}

impl Drop for AppShell {
    fn drop(&mut self) {
        self.overlay_listener.abort();
    }
}
