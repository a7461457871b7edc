//! Session slot
//!
//! A single optional reference to the authenticated user.

pub mod repository;

pub use repository::SessionRepository;
