//! Notifications module
//!
//! Broadcasts session, navigation and overlay changes to whoever renders
//! them.
//!
//! # Usage
//! ```ignore
//! use marketplace_core::notifications::{create_event_bus, Event};
//!
//! let event_bus = create_event_bus();
//! let mut subscriber = event_bus.subscribe();
//!
//! while let Some(message) = subscriber.recv().await {
//!     if let Event::ViewChanged(change) = &message.event {
//!         // re-render `change.to`, scroll to top
//!     }
//! }
//! ```

pub mod event_bus;
pub mod events;

pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::*;
