//! Navigation controller
//!
//! Owns the current view mode and workspace tab. Mode changes are
//! debounced: a request marks the state as transitioning and commits after
//! the debounce window. A newer request cancels the pending one, and the
//! commit re-checks a generation number under the lock, so an abandoned
//! transition can never land. Exactly one mode is current at any time.
//!
//! Methods that schedule a transition spawn a task and must be called from
//! within a Tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::NavigationConfig;
use crate::domain::{
    default_destination, DomainError, DomainResult, NavigationState, PermissionSet, User,
    ViewMode, ViewRequestOutcome, WorkspaceTab,
};
use crate::notifications::{Event, LoginRequestedEvent, SharedEventBus, ViewChangedEvent};

struct PendingTransition {
    generation: u64,
    cancel: CancellationToken,
    /// Profile to show once a `Profile` transition commits.
    profile_target: Option<String>,
}

struct NavInner {
    state: NavigationState,
    /// Permissions of the session user; `None` while browsing as a guest.
    session: Option<PermissionSet>,
    generation: u64,
    pending: Option<PendingTransition>,
}

impl NavInner {
    /// Abandon the pending transition, if any.
    fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.cancel.cancel();
                self.state.transitioning = false;
                self.state.pending = None;
                true
            }
            None => false,
        }
    }

    /// Make `mode` current right now. The profile target only survives
    /// on the profile view.
    fn apply(&mut self, mode: ViewMode, profile_target: Option<String>) -> ViewChangedEvent {
        let from = self.state.mode;
        self.state.mode = mode;
        self.state.transitioning = false;
        self.state.pending = None;
        self.state.profile_target = match mode {
            ViewMode::Profile => profile_target,
            _ => None,
        };
        ViewChangedEvent {
            from,
            to: mode,
            tab: self.state.tab,
            scroll_to_top: true,
            timestamp: Utc::now(),
        }
    }
}

pub struct NavigationController {
    inner: Arc<Mutex<NavInner>>,
    debounce: Duration,
    events: SharedEventBus,
}

impl NavigationController {
    pub fn new(config: &NavigationConfig, events: SharedEventBus) -> Self {
        Self {
            inner: Arc::new(Mutex::new(NavInner {
                state: NavigationState::default(),
                session: None,
                generation: 0,
                pending: None,
            })),
            debounce: config.debounce(),
            events,
        }
    }

    pub fn current_state(&self) -> NavigationState {
        self.inner.lock().state.clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.lock().session.is_some()
    }

    /// Ask for a new top-level view.
    pub fn request_view(&self, mode: ViewMode) -> ViewRequestOutcome {
        let mut inner = self.inner.lock();

        if mode == ViewMode::Workspace && inner.session.is_none() {
            drop(inner);
            debug!("Workspace requested without a session");
            counter!("navigation_transitions_total", "outcome" => "login_required").increment(1);
            self.events.publish(Event::LoginRequested(LoginRequestedEvent {
                requested: mode,
                timestamp: Utc::now(),
            }));
            return ViewRequestOutcome::LoginRequired;
        }

        let target = match mode {
            ViewMode::Profile => inner.state.profile_target.clone(),
            _ => None,
        };
        self.schedule(&mut inner, mode, target)
    }

    /// Open a profile page. Switching between profiles is a transition too.
    pub fn navigate_to_profile(&self, profile_id: impl Into<String>) -> ViewRequestOutcome {
        let mut inner = self.inner.lock();
        self.schedule(&mut inner, ViewMode::Profile, Some(profile_id.into()))
    }

    /// Leave the splash screen without logging in.
    pub fn enter_as_guest(&self) -> bool {
        let change = {
            let mut inner = self.inner.lock();
            if inner.state.mode != ViewMode::Splash {
                return false;
            }
            inner.cancel_pending();
            inner.apply(ViewMode::Discovery, None)
        };
        self.announce(change);
        true
    }

    /// A persisted session was found (or not) at start-up.
    pub fn on_session_restored(&self, user: Option<&User>) {
        let Some(user) = user else { return };

        let change = {
            let mut inner = self.inner.lock();
            inner.session = Some(user.permissions.clone());
            if inner.state.mode != ViewMode::Splash {
                return;
            }
            inner.cancel_pending();
            inner.apply(ViewMode::Discovery, None)
        };
        self.announce(change);
    }

    /// Route to the role's landing view after login or registration.
    pub fn on_session_started(&self, user: &User) -> ViewRequestOutcome {
        let (mode, tab) = default_destination(user.role);

        let mut inner = self.inner.lock();
        inner.session = Some(user.permissions.clone());
        inner.state.tab = tab.unwrap_or(WorkspaceTab::Dashboard);
        self.schedule(&mut inner, mode, None)
    }

    /// Drop back to guest discovery, abandoning any pending transition.
    pub fn on_logout(&self) {
        let change = {
            let mut inner = self.inner.lock();
            if inner.cancel_pending() {
                debug!("Pending transition abandoned on logout");
            }
            inner.session = None;
            inner.state.tab = WorkspaceTab::Dashboard;
            inner.state.profile_target = None;
            (inner.state.mode != ViewMode::Discovery)
                .then(|| inner.apply(ViewMode::Discovery, None))
        };
        if let Some(change) = change {
            self.announce(change);
        }
    }

    /// Switch the workspace panel. Admin panels need the matching permission.
    pub fn select_tab(&self, tab: WorkspaceTab) -> DomainResult<()> {
        let mut inner = self.inner.lock();

        let in_workspace = inner.state.mode == ViewMode::Workspace
            || inner.state.pending == Some(ViewMode::Workspace);
        if !in_workspace {
            return Err(DomainError::Validation(format!(
                "tab {} is only available in the workspace",
                tab
            )));
        }

        if let Some(required) = tab.required_permission() {
            let allowed = inner
                .session
                .as_ref()
                .is_some_and(|perms| perms.contains(&required));
            if !allowed {
                return Err(DomainError::Forbidden(format!("tab {} requires {:?}", tab, required)));
            }
        }

        inner.state.tab = tab;
        Ok(())
    }

    fn schedule(
        &self,
        inner: &mut NavInner,
        mode: ViewMode,
        profile_target: Option<String>,
    ) -> ViewRequestOutcome {
        if mode == inner.state.mode && profile_target == inner.state.profile_target {
            if inner.cancel_pending() {
                debug!(mode = %mode, "Pending transition abandoned, already current");
            }
            return ViewRequestOutcome::Unchanged;
        }

        if inner.cancel_pending() {
            debug!(mode = %mode, "Pending transition superseded");
            counter!("navigation_transitions_total", "outcome" => "superseded").increment(1);
        }

        inner.generation += 1;
        let generation = inner.generation;
        let cancel = CancellationToken::new();
        inner.pending = Some(PendingTransition {
            generation,
            cancel: cancel.clone(),
            profile_target,
        });
        inner.state.transitioning = true;
        inner.state.pending = Some(mode);

        let shared = Arc::clone(&self.inner);
        let events = self.events.clone();
        let debounce = self.debounce;
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(debounce) => {}
            }
            let change = {
                let mut inner = shared.lock();
                let pending = match inner.pending.take() {
                    Some(pending) if pending.generation == generation => pending,
                    other => {
                        inner.pending = other;
                        debug!(generation, "Stale transition dropped");
                        return;
                    }
                };
                inner.apply(mode, pending.profile_target)
            };
            commit_announce(&events, change);
        });

        ViewRequestOutcome::Scheduled
    }

    fn announce(&self, change: ViewChangedEvent) {
        commit_announce(&self.events, change);
    }
}

fn commit_announce(events: &SharedEventBus, change: ViewChangedEvent) {
    info!(from = %change.from, to = %change.to, tab = %change.tab, "View changed");
    counter!("navigation_transitions_total", "outcome" => "committed").increment(1);
    events.publish(Event::ViewChanged(change));
}

impl Drop for NavigationController {
    fn drop(&mut self) {
        self.inner.lock().cancel_pending();
    }
}
