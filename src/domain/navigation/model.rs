use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Permission, UserRole};

/// Top-level view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Splash,
    Discovery,
    Workspace,
    Profile,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Splash => "splash",
            ViewMode::Discovery => "discovery",
            ViewMode::Workspace => "workspace",
            ViewMode::Profile => "profile",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Panel shown while in [`ViewMode::Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceTab {
    Dashboard,
    Dam,
    Projects,
    Finance,
    AdminUsers,
    AdminRoles,
}

impl WorkspaceTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceTab::Dashboard => "dashboard",
            WorkspaceTab::Dam => "dam",
            WorkspaceTab::Projects => "projects",
            WorkspaceTab::Finance => "finance",
            WorkspaceTab::AdminUsers => "admin_users",
            WorkspaceTab::AdminRoles => "admin_roles",
        }
    }

    /// Permission the session user needs to open this tab, if any.
    pub fn required_permission(&self) -> Option<Permission> {
        match self {
            WorkspaceTab::AdminUsers => Some(Permission::ManageUsers),
            WorkspaceTab::AdminRoles => Some(Permission::ManageRoles),
            _ => None,
        }
    }
}

impl fmt::Display for WorkspaceTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot returned by `NavigationController::current_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    pub mode: ViewMode,
    pub tab: WorkspaceTab,
    pub transitioning: bool,
    /// Requested mode awaiting its debounce window.
    pub pending: Option<ViewMode>,
    pub profile_target: Option<String>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            mode: ViewMode::Splash,
            tab: WorkspaceTab::Dashboard,
            transitioning: false,
            pending: None,
            profile_target: None,
        }
    }
}

/// What `request_view` did with the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewRequestOutcome {
    /// Already in the requested mode.
    Unchanged,
    /// Transition scheduled; commits after the debounce window.
    Scheduled,
    /// Workspace requested without a session; login must be shown instead.
    LoginRequired,
}

/// Landing view right after a successful login.
pub fn default_destination(role: UserRole) -> (ViewMode, Option<WorkspaceTab>) {
    match role {
        UserRole::RootAdmin | UserRole::PlatformAdmin => {
            (ViewMode::Workspace, Some(WorkspaceTab::AdminUsers))
        }
        UserRole::Enterprise => (ViewMode::Workspace, Some(WorkspaceTab::Dashboard)),
        UserRole::Creator | UserRole::Buyer => (ViewMode::Discovery, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_destination() {
        assert_eq!(
            default_destination(UserRole::RootAdmin),
            (ViewMode::Workspace, Some(WorkspaceTab::AdminUsers))
        );
        assert_eq!(
            default_destination(UserRole::PlatformAdmin),
            (ViewMode::Workspace, Some(WorkspaceTab::AdminUsers))
        );
        assert_eq!(
            default_destination(UserRole::Enterprise),
            (ViewMode::Workspace, Some(WorkspaceTab::Dashboard))
        );
        assert_eq!(default_destination(UserRole::Creator), (ViewMode::Discovery, None));
        assert_eq!(default_destination(UserRole::Buyer), (ViewMode::Discovery, None));
    }

    #[test]
    fn test_initial_state_is_splash() {
        let state = NavigationState::default();
        assert_eq!(state.mode, ViewMode::Splash);
        assert!(!state.transitioning);
        assert!(state.pending.is_none());
    }

    #[test]
    fn test_admin_tabs_require_permissions() {
        assert_eq!(
            WorkspaceTab::AdminUsers.required_permission(),
            Some(Permission::ManageUsers)
        );
        assert_eq!(WorkspaceTab::Dam.required_permission(), None);
    }
}
