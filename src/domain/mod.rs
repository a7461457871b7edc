//! Domain layer
//!
//! Entities, value types and the repository seams. No I/O happens here.

pub mod navigation;
pub mod role;
pub mod session;
pub mod user;

// Re-export commonly used types
pub use navigation::{default_destination, NavigationState, ViewMode, ViewRequestOutcome, WorkspaceTab};
pub use role::{Permission, PermissionSet, RoleDefinition, RoleRegistry, UserRole};
pub use session::SessionRepository;
pub use user::{
    default_avatar_uri, name_from_identifier, ContactType, DirectoryRepository, ProfilePatch,
    RegisterUserDto, User,
};

// Re-export errors from shared for convenience
pub use crate::shared::errors::{DomainError, DomainResult};
