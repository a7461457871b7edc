//! Notification events
//!
//! Everything the core announces to UI collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{UserRole, ViewMode, WorkspaceTab};

/// Event types for notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    /// A user became the session user
    SessionStarted(SessionEvent),
    /// The session was cleared
    SessionEnded(SessionEvent),
    /// A new user was registered
    UserRegistered(SessionEvent),
    /// Profile fields changed
    ProfileUpdated(ProfileUpdatedEvent),
    /// Verification code sent to a phone
    VerificationCodeIssued(VerificationCodeEvent),
    /// A view transition committed; the UI scrolls to top
    ViewChanged(ViewChangedEvent),
    /// Something needs a logged-in user
    LoginRequested(LoginRequestedEvent),
    /// The active overlay changed
    OverlayChanged(OverlayChangedEvent),
}

impl Event {
    /// Get the event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::SessionStarted(_) => "session_started",
            Event::SessionEnded(_) => "session_ended",
            Event::UserRegistered(_) => "user_registered",
            Event::ProfileUpdated(_) => "profile_updated",
            Event::VerificationCodeIssued(_) => "verification_code_issued",
            Event::ViewChanged(_) => "view_changed",
            Event::LoginRequested(_) => "login_requested",
            Event::OverlayChanged(_) => "overlay_changed",
        }
    }

    /// Get the user ID if applicable
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Event::SessionStarted(e) | Event::SessionEnded(e) | Event::UserRegistered(e) => {
                Some(&e.user_id)
            }
            Event::ProfileUpdated(e) => Some(&e.user_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub user_id: String,
    pub role: UserRole,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdatedEvent {
    pub user_id: String,
    pub session_refreshed: bool,
    pub timestamp: DateTime<Utc>,
}

/// Never carries the code itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCodeEvent {
    pub phone: String,
    pub cooldown_secs: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewChangedEvent {
    pub from: ViewMode,
    pub to: ViewMode,
    pub tab: WorkspaceTab,
    pub scroll_to_top: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequestedEvent {
    pub requested: ViewMode,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayChangedEvent {
    pub previous: String,
    pub current: String,
    pub timestamp: DateTime<Utc>,
}

/// Envelope delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_json_is_tagged() {
        let msg = EventMessage::new(Event::ViewChanged(ViewChangedEvent {
            from: ViewMode::Discovery,
            to: ViewMode::Workspace,
            tab: WorkspaceTab::AdminUsers,
            scroll_to_top: true,
            timestamp: Utc::now(),
        }));
        let json: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

        assert_eq!(json["type"], "ViewChanged");
        assert_eq!(json["data"]["to"], "workspace");
        assert_eq!(json["data"]["tab"], "admin_users");
        assert!(json["id"].is_string());
    }

    #[test]
    fn test_user_id() {
        let event = Event::SessionEnded(SessionEvent {
            user_id: "u1".into(),
            role: UserRole::Buyer,
            timestamp: Utc::now(),
        });
        assert_eq!(event.user_id(), Some("u1"));
        assert_eq!(event.event_type(), "session_ended");
    }
}
