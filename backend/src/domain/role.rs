//! Role data model.
//!
//! Roles are flat: holding one role never implies another.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::RoleId;

/// Maximum length of a role name.
pub const ROLE_NAME_MAX: usize = 32;

/// Validation errors raised by [`RoleName::new`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleNameError {
    /// Name was blank.
    #[error("role name must not be empty")]
    Empty,
    /// Name exceeded [`ROLE_NAME_MAX`].
    #[error("role name must be at most {max} characters")]
    TooLong {
        /// Maximum permitted length.
        max: usize,
    },
    /// Name contained characters outside `[a-z0-9_-]`.
    #[error("role name may only contain lowercase letters, digits, dashes, or underscores")]
    InvalidCharacters,
}

/// Unique lowercase role name, for example `guest` or `admin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    /// Validate and construct a role name.
    pub fn new(name: impl AsRef<str>) -> Result<Self, RoleNameError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(RoleNameError::Empty);
        }
        if name.len() > ROLE_NAME_MAX {
            return Err(RoleNameError::TooLong { max: ROLE_NAME_MAX });
        }
        let allowed = name
            .bytes()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || matches!(byte, b'_' | b'-'));
        if !allowed {
            return Err(RoleNameError::InvalidCharacters);
        }
        Ok(Self(name.to_owned()))
    }
}

impl AsRef<str> for RoleName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        value.0
    }
}

impl TryFrom<String> for RoleName {
    type Error = RoleNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// A named role that can be granted to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: RoleName,
}

impl Role {
    /// Build a role record.
    #[must_use]
    pub fn new(id: RoleId, name: RoleName) -> Self {
        Self { id, name }
    }

    /// Stable identifier.
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Unique name.
    pub fn name(&self) -> &RoleName {
        &self.name
    }
}
