//! Mutually exclusive overlays (login / upload dialogs)

pub mod orchestrator;

pub use orchestrator::{ModalOrchestrator, Overlay};
