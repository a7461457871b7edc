use thiserror::Error;

use crate::domain::ContactType;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Already registered: {contact_type} {contact}")]
    DuplicateContact {
        contact: String,
        contact_type: ContactType,
    },

    #[error("Invalid phone format: {0}")]
    InvalidPhoneFormat(String),

    #[error("Role not found: {0}")]
    RoleNotFound(String),

    #[error("Session data is corrupt: {0}")]
    SessionCorrupt(String),

    #[error("Verification code for {phone} already sent, retry in {retry_after_secs}s")]
    CodeCooldown { phone: String, retry_after_secs: u64 },

    #[error("Invalid or expired verification code for {0}")]
    InvalidVerificationCode(String),

    #[error("User id already exists: {0}")]
    DuplicateUserId(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Short machine-readable code, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::UserNotFound(_) => "user_not_found",
            DomainError::DuplicateContact { .. } => "duplicate_contact",
            DomainError::InvalidPhoneFormat(_) => "invalid_phone_format",
            DomainError::RoleNotFound(_) => "role_not_found",
            DomainError::SessionCorrupt(_) => "session_corrupt",
            DomainError::CodeCooldown { .. } => "code_cooldown",
            DomainError::InvalidVerificationCode(_) => "invalid_verification_code",
            DomainError::DuplicateUserId(_) => "duplicate_user_id",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::Validation(_) => "validation",
            DomainError::Cancelled => "cancelled",
            DomainError::Storage(_) => "storage",
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<InfraError> for DomainError {
    fn from(e: InfraError) -> Self {
        DomainError::Storage(e.to_string())
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
