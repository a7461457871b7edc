use validator::Validate;

use super::ContactType;

/// Registration request as submitted by the sign-up form.
#[derive(Debug, Clone, Validate)]
pub struct RegisterUserDto {
    #[validate(length(min = 1, max = 50, message = "username must be 1–50 characters"))]
    pub username: String,
    #[validate(length(min = 1, message = "contact is required"))]
    pub contact: String,
    pub contact_type: ContactType,
    pub role: String,
}

impl RegisterUserDto {
    pub fn new(
        username: impl Into<String>,
        contact: impl Into<String>,
        contact_type: ContactType,
        role: impl Into<String>,
    ) -> Self {
        Self {
            username: trimmed(username),
            contact: trimmed(contact),
            contact_type,
            role: role.into(),
        }
    }
}

fn trimmed(value: impl Into<String>) -> String {
    let value: String = value.into();
    value.trim().to_string()
}
