//! Broadcast bus for session, navigation and overlay events.
//!
//! Publishing never blocks. A subscriber that falls more than the channel
//! capacity behind skips the oldest events and carries on.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{trace, warn};

use super::events::{Event, EventMessage};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventMessage>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Wrap `event` in a message and fan it out. Returns how many
    /// subscribers it reached; zero is normal before anyone listens.
    pub fn publish(&self, event: Event) -> usize {
        let message = EventMessage::new(event);
        let event_type = message.event.event_type();
        let user_id = message.event.user_id().map(str::to_owned);

        let delivered = self.sender.send(message).unwrap_or(0);
        trace!(event_type, ?user_id, delivered, "Event published");
        delivered
    }

    pub fn subscribe(&self) -> EventSubscriber {
        EventSubscriber {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventSubscriber {
    receiver: broadcast::Receiver<EventMessage>,
}

impl EventSubscriber {
    /// Wait for the next event. `None` once every bus handle is gone.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.recv().await {
                Ok(message) => return Some(message),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event subscriber lagged"),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next event that has already been published, without waiting.
    pub fn try_recv(&mut self) -> Option<EventMessage> {
        loop {
            match self.receiver.try_recv() {
                Ok(message) => return Some(message),
                Err(TryRecvError::Lagged(skipped)) => warn!(skipped, "Event subscriber lagged"),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

pub type SharedEventBus = Arc<EventBus>;

pub fn create_event_bus() -> SharedEventBus {
    Arc::new(EventBus::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{UserRole, ViewMode};
    use crate::notifications::events::{LoginRequestedEvent, SessionEvent};
    use chrono::Utc;

    fn session_started(user_id: &str) -> Event {
        Event::SessionStarted(SessionEvent {
            user_id: user_id.to_string(),
            role: UserRole::Buyer,
            timestamp: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_each_event() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        assert_eq!(bus.publish(session_started("u-1")), 2);

        for subscriber in [&mut first, &mut second] {
            let message = subscriber.recv().await.expect("message");
            assert_eq!(message.event.user_id(), Some("u-1"));
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(session_started("u-1")), 0);
        assert_eq!(bus.subscriber_count(), 0);

        let subscriber = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(subscriber);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_lagging_subscriber_keeps_newest() {
        let bus = EventBus::with_capacity(2);
        let mut subscriber = bus.subscribe();

        for id in ["a", "b", "c"] {
            bus.publish(session_started(id));
        }
        bus.publish(Event::LoginRequested(LoginRequestedEvent {
            requested: ViewMode::Workspace,
            timestamp: Utc::now(),
        }));

        let received: Vec<_> = std::iter::from_fn(|| subscriber.try_recv())
            .map(|m| m.event.event_type())
            .collect();
        assert_eq!(received, vec!["session_started", "login_requested"]);
    }

    #[tokio::test]
    async fn test_recv_ends_when_bus_dropped() {
        let bus = EventBus::new();
        let mut subscriber = bus.subscribe();
        drop(bus);
        assert!(subscriber.recv().await.is_none());
    }
}
