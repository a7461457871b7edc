//! Role registry
//!
//! Lookup is an exhaustive `match` over [`UserRole`], so adding a role
//! without a table entry is a compile error.

use tracing::debug;

use super::model::{Permission, RoleDefinition, UserRole};
use crate::domain::DomainResult;

use super::model::Permission::*;

const ROOT_ADMIN: RoleDefinition =
    RoleDefinition::new(UserRole::RootAdmin, "Root Administrator", &Permission::ALL);

const PLATFORM_ADMIN: RoleDefinition = RoleDefinition::new(
    UserRole::PlatformAdmin,
    "Platform Administrator",
    &[
        ViewDiscovery,
        ViewDashboard,
        ViewFinance,
        ReviewContent,
        ManageUsers,
        ManageRoles,
    ],
);

const ENTERPRISE: RoleDefinition = RoleDefinition::new(
    UserRole::Enterprise,
    "Enterprise",
    &[
        ViewDiscovery,
        LicenseWorks,
        ViewDashboard,
        ManageAssets,
        ManageProjects,
        ViewFinance,
    ],
);

const CREATOR: RoleDefinition = RoleDefinition::new(
    UserRole::Creator,
    "Creator",
    &[ViewDiscovery, UploadWorks, ManagePortfolio, ViewFinance],
);

const BUYER: RoleDefinition =
    RoleDefinition::new(UserRole::Buyer, "Buyer", &[ViewDiscovery, LicenseWorks]);

/// Read-only role table. Zero-sized; copy it wherever permissions are stamped.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleRegistry;

impl RoleRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a role code coming from the outside world.
    pub fn resolve(&self, code: &str) -> DomainResult<&'static RoleDefinition> {
        let role = code.parse::<UserRole>()?;
        debug!(role = %role, "Role resolved");
        Ok(self.definition(role))
    }

    pub fn definition(&self, role: UserRole) -> &'static RoleDefinition {
        match role {
            UserRole::RootAdmin => &ROOT_ADMIN,
            UserRole::PlatformAdmin => &PLATFORM_ADMIN,
            UserRole::Enterprise => &ENTERPRISE,
            UserRole::Creator => &CREATOR,
            UserRole::Buyer => &BUYER,
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &'static RoleDefinition> + '_ {
        UserRole::ALL.into_iter().map(|role| self.definition(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_every_role_has_its_own_entry() {
        let registry = RoleRegistry::new();
        for role in UserRole::ALL {
            assert_eq!(registry.definition(role).code, role);
        }
        assert_eq!(registry.all().count(), UserRole::ALL.len());
    }

    #[test]
    fn test_resolve_by_code() {
        let registry = RoleRegistry::new();
        let def = registry.resolve("enterprise").unwrap();
        assert_eq!(def.code, UserRole::Enterprise);
        assert_eq!(def.display_name, "Enterprise");
        assert!(def.grants(Permission::ManageAssets));
        assert!(!def.grants(Permission::ManageUsers));
    }

    #[test]
    fn test_resolve_unknown_code() {
        let err = RoleRegistry::new().resolve("guest").unwrap_err();
        assert_eq!(err, DomainError::RoleNotFound("guest".into()));
    }

    #[test]
    fn test_root_admin_holds_every_permission() {
        let perms = RoleRegistry::new()
            .definition(UserRole::RootAdmin)
            .default_permissions();
        assert_eq!(perms.len(), Permission::ALL.len());
    }

    #[test]
    fn test_every_role_can_browse_discovery() {
        for def in RoleRegistry::new().all() {
            assert!(def.grants(Permission::ViewDiscovery), "{}", def.code);
        }
    }
}
