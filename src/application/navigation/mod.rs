//! View-mode state machine

pub mod controller;

pub use controller::NavigationController;
