//! Modal overlay orchestration
//!
//! At most one overlay is open at a time. Opening another overlay replaces
//! the current one and discards whatever was typed into it.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::notifications::{Event, OverlayChangedEvent, SharedEventBus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlay {
    #[default]
    None,
    Login,
    Upload,
}

impl Overlay {
    pub fn as_str(&self) -> &'static str {
        match self {
            Overlay::None => "none",
            Overlay::Login => "login",
            Overlay::Upload => "upload",
        }
    }
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default)]
struct OverlayState {
    active: Overlay,
    draft: HashMap<String, String>,
}

pub struct ModalOrchestrator {
    state: Mutex<OverlayState>,
    events: SharedEventBus,
}

impl ModalOrchestrator {
    pub fn new(events: SharedEventBus) -> Self {
        Self {
            state: Mutex::new(OverlayState::default()),
            events,
        }
    }

    pub fn current(&self) -> Overlay {
        self.state.lock().active
    }

    /// Show `overlay`, replacing whatever is open. The draft is always reset.
    pub fn open(&self, overlay: Overlay) {
        let previous = {
            let mut state = self.state.lock();
            state.draft.clear();
            std::mem::replace(&mut state.active, overlay)
        };

        if previous != overlay {
            debug!(%previous, current = %overlay, "Overlay changed");
            self.events.publish(Event::OverlayChanged(OverlayChangedEvent {
                previous: previous.as_str().to_string(),
                current: overlay.as_str().to_string(),
                timestamp: Utc::now(),
            }));
        }
    }

    pub fn close(&self) {
        self.open(Overlay::None);
    }

    /// Record a form field on the open overlay. Ignored when nothing is open.
    pub fn set_field(&self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let mut state = self.state.lock();
        if state.active == Overlay::None {
            return false;
        }
        state.draft.insert(key.into(), value.into());
        true
    }

    pub fn field(&self, key: &str) -> Option<String> {
        self.state.lock().draft.get(key).cloned()
    }

    /// Close the open overlay whenever a view change commits.
    ///
    /// The listener holds a weak reference and stops once the orchestrator
    /// is dropped or the bus closes.
    pub fn close_on_navigation(self: &Arc<Self>, bus: &SharedEventBus) -> JoinHandle<()> {
        let orchestrator: Weak<Self> = Arc::downgrade(self);
        let mut subscriber = bus.subscribe();

        tokio::spawn(async move {
            while let Some(message) = subscriber.recv().await {
                if !matches!(message.event, Event::ViewChanged(_)) {
                    continue;
                }
                let Some(orchestrator) = orchestrator.upgrade() else {
                    break;
                };
                orchestrator.close();
            }
        })
    }
}
