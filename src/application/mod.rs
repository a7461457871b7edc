//! Application layer - use cases over the domain

pub mod identity;
pub mod navigation;
pub mod overlay;
pub mod shell;

pub use identity::{AuthService, VerificationCodes, VerificationHandle};
pub use navigation::NavigationController;
pub use overlay::{ModalOrchestrator, Overlay};
pub use shell::AppShell;
