//! # Marketplace core
//!
//! Identity, session and navigation core for the marketplace/portfolio
//! front end: demo login and registration against a persisted user
//! directory, role-based permissions, and a debounced view state machine.
//!
//! ## Architecture
//!
//! - **domain**: users, roles, permissions and navigation types
//! - **application**: auth service, navigation controller, overlays, shell
//! - **infrastructure**: key-value storage and the repositories over it
//! - **notifications**: event bus for whoever renders state changes
//! - **shared**: errors and input validation

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod notifications;
pub mod shared;
pub mod telemetry;

pub use application::{AppShell, AuthService, ModalOrchestrator, NavigationController, Overlay};
pub use config::{default_config_path, AppConfig};
pub use domain::{DomainError, DomainResult};
pub use notifications::{create_event_bus, Event, EventBus, SharedEventBus};
