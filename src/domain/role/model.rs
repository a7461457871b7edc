use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// User role. The set is closed: roles are never created at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    RootAdmin,
    PlatformAdmin,
    Enterprise,
    Creator,
    Buyer,
}

impl UserRole {
    pub const ALL: [UserRole; 5] = [
        UserRole::RootAdmin,
        UserRole::PlatformAdmin,
        UserRole::Enterprise,
        UserRole::Creator,
        UserRole::Buyer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::RootAdmin => "root_admin",
            UserRole::PlatformAdmin => "platform_admin",
            UserRole::Enterprise => "enterprise",
            UserRole::Creator => "creator",
            UserRole::Buyer => "buyer",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::RootAdmin | UserRole::PlatformAdmin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        UserRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| DomainError::RoleNotFound(s.to_string()))
    }
}

/// Capability tag. Always granted in bulk through a role's default set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewDiscovery,
    UploadWorks,
    ManagePortfolio,
    LicenseWorks,
    ViewDashboard,
    ManageAssets,
    ManageProjects,
    ViewFinance,
    ReviewContent,
    ManageUsers,
    ManageRoles,
}

impl Permission {
    pub const ALL: [Permission; 11] = [
        Permission::ViewDiscovery,
        Permission::UploadWorks,
        Permission::ManagePortfolio,
        Permission::LicenseWorks,
        Permission::ViewDashboard,
        Permission::ManageAssets,
        Permission::ManageProjects,
        Permission::ViewFinance,
        Permission::ReviewContent,
        Permission::ManageUsers,
        Permission::ManageRoles,
    ];
}

/// Ordered so the persisted form is stable.
pub type PermissionSet = BTreeSet<Permission>;

/// Static description of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleDefinition {
    pub code: UserRole,
    pub display_name: &'static str,
    default_permissions: &'static [Permission],
}

impl RoleDefinition {
    pub(crate) const fn new(
        code: UserRole,
        display_name: &'static str,
        default_permissions: &'static [Permission],
    ) -> Self {
        Self {
            code,
            display_name,
            default_permissions,
        }
    }

    pub fn default_permissions(&self) -> PermissionSet {
        self.default_permissions.iter().copied().collect()
    }

    pub fn grants(&self, permission: Permission) -> bool {
        self.default_permissions.contains(&permission)
    }
}
