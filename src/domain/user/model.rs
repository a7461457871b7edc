use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult, Permission, PermissionSet, RoleDefinition, UserRole};

/// Channel a user registered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactType {
    Email,
    Phone,
}

impl ContactType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactType::Email => "email",
            ContactType::Phone => "phone",
        }
    }
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactType {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "email" => Ok(ContactType::Email),
            "phone" => Ok(ContactType::Phone),
            other => Err(DomainError::Validation(format!(
                "unknown contact type: {}",
                other
            ))),
        }
    }
}

/// User record, as held by the directory and the session slot.
///
/// `role_name` and `permissions` are stamped from the role table when the
/// user is created and are not editable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub avatar_uri: String,
    pub role: UserRole,
    pub role_name: String,
    pub permissions: PermissionSet,
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl User {
    /// Build a fresh authenticated user for `role`.
    pub fn new(name: impl Into<String>, role: &RoleDefinition) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        Self {
            avatar_uri: default_avatar_uri(&id),
            id,
            name: name.into(),
            role: role.code,
            role_name: role.display_name.to_string(),
            permissions: role.default_permissions(),
            authenticated: true,
            email: None,
            phone: None,
        }
    }

    pub fn with_contact(mut self, contact: impl Into<String>, contact_type: ContactType) -> Self {
        let contact = contact.into();
        match contact_type {
            ContactType::Email => self.email = Some(contact),
            ContactType::Phone => self.phone = Some(contact),
        }
        self
    }

    pub fn contact(&self, contact_type: ContactType) -> Option<&str> {
        match contact_type {
            ContactType::Email => self.email.as_deref(),
            ContactType::Phone => self.phone.as_deref(),
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&permission)
    }
}

pub fn default_avatar_uri(seed: &str) -> String {
    format!("https://api.dicebear.com/7.x/avataaars/svg?seed={}", seed)
}

/// Display name for a user synthesised from a login identifier:
/// the local part of an email address, otherwise the identifier itself.
pub fn name_from_identifier(identifier: &str) -> String {
    match identifier.split_once('@') {
        Some((local, _)) if !local.is_empty() => local.to_string(),
        _ => identifier.to_string(),
    }
}
