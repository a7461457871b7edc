//! Navigation state types

pub mod model;

pub use model::{default_destination, NavigationState, ViewMode, ViewRequestOutcome, WorkspaceTab};
