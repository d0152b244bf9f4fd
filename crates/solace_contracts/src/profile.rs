#![forbid(unsafe_code)]

use crate::{ContractViolation, SchemaVersion, Validate};

pub const PROFILE_CONTRACT_VERSION: SchemaVersion = SchemaVersion(1);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self, ContractViolation> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "user_id",
                reason: "must not be empty",
            });
        }
        if id.len() > 64 {
            return Err(ContractViolation::InvalidValue {
                field: "user_id",
                reason: "must be <= 64 chars",
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for UserId {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "user_id",
                reason: "must not be empty",
            });
        }
        if self.0.len() > 64 {
            return Err(ContractViolation::InvalidValue {
                field: "user_id",
                reason: "must be <= 64 chars",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(addr: impl Into<String>) -> Result<Self, ContractViolation> {
        let addr = addr.into();
        let trimmed = addr.trim();
        if trimmed.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "email_address",
                reason: "must not be empty",
            });
        }
        if addr.len() > 254 {
            return Err(ContractViolation::InvalidValue {
                field: "email_address",
                reason: "must be <= 254 chars",
            });
        }
        let Some(at) = trimmed.find('@') else {
            return Err(ContractViolation::InvalidValue {
                field: "email_address",
                reason: "must contain '@'",
            });
        };
        if at == 0 || at + 1 == trimmed.len() {
            return Err(ContractViolation::InvalidValue {
                field: "email_address",
                reason: "must have text on both sides of '@'",
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for EmailAddress {
    fn validate(&self) -> Result<(), ContractViolation> {
        if !self.0.contains('@') {
            return Err(ContractViolation::InvalidValue {
                field: "email_address",
                reason: "must contain '@'",
            });
        }
        Ok(())
    }
}

/// Caretaker contact details carried on the user profile. The alert pipeline
/// reads this and nothing else; absence of an email is a normal state, not an
/// error, and must be handled by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaretakerContact {
    pub email: Option<EmailAddress>,
}

impl Validate for CaretakerContact {
    fn validate(&self) -> Result<(), ContractViolation> {
        if let Some(email) = &self.email {
            email.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub schema_version: SchemaVersion,
    pub user_id: UserId,
    pub caretaker: CaretakerContact,
}

impl UserProfile {
    pub fn v1(user_id: UserId, caretaker: CaretakerContact) -> Result<Self, ContractViolation> {
        let p = Self {
            schema_version: PROFILE_CONTRACT_VERSION,
            user_id,
            caretaker,
        };
        p.validate()?;
        Ok(p)
    }
}

impl Validate for UserProfile {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.schema_version != PROFILE_CONTRACT_VERSION {
            return Err(ContractViolation::InvalidValue {
                field: "user_profile.schema_version",
                reason: "must match PROFILE_CONTRACT_VERSION",
            });
        }
        self.user_id.validate()?;
        self.caretaker.validate()?;
        Ok(())
    }
}
