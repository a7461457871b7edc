//! Role aggregate
//!
//! Closed set of roles, the permission vocabulary and the static
//! role → default permission table.

pub mod model;
pub mod registry;

pub use model::{Permission, PermissionSet, RoleDefinition, UserRole};
pub use registry::RoleRegistry;
