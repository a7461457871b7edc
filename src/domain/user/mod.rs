//! User aggregate
//!
//! Contains the User entity, DTOs, and the directory repository interface.

pub mod model;
pub mod repository;

mod dto_create;
mod dto_update;

// Re-export model types
pub use model::{default_avatar_uri, name_from_identifier, ContactType, User};

// Re-export DTOs
pub use dto_create::RegisterUserDto;
pub use dto_update::ProfilePatch;

// Re-export repository trait
pub use repository::DirectoryRepository;
