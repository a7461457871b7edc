//! Identity: authentication and session management
//!
//! Contains the `AuthService`, which orchestrates login, registration,
//! verification codes, logout and profile updates.

pub mod service;
pub mod verification;

pub use service::AuthService;
pub use verification::{VerificationCodes, VerificationHandle};
