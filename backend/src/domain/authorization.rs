//! Capability checks over a flat role set.
//!
//! Every inbound operation declares the [`Capability`] it needs. Checks run
//! before any relation or lifecycle logic so a rejected caller never reaches
//! the store.

use tracing::debug;

use crate::domain::{Error, Post, Principal, RoleName, UserId};

/// What an operation demands of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Any authenticated principal.
    Authenticated,
    /// A principal holding the guest role.
    Guest,
    /// A principal holding the admin role.
    Admin,
}

/// Role names that satisfy the role-bound capabilities.
///
/// Roles are flat: the admin role does not imply the guest role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePolicy {
    guest: RoleName,
    admin: RoleName,
}

impl RolePolicy {
    /// Build a policy from the configured guest and admin role names.
    #[must_use]
    pub fn new(guest: RoleName, admin: RoleName) -> Self {
        Self { guest, admin }
    }

    /// Role attached to every new registration.
    pub fn guest(&self) -> &RoleName {
        &self.guest
    }

    /// Role that unlocks administrative operations.
    pub fn admin(&self) -> &RoleName {
        &self.admin
    }

    /// Check that `principal` holds `capability`.
    ///
    /// A missing principal yields `Unauthenticated`; a present principal
    /// without the capability yields `Unauthorized`.
    pub fn require<'a>(
        &self,
        principal: Option<&'a Principal>,
        capability: Capability,
    ) -> Result<&'a Principal, Error> {
        let Some(principal) = principal else {
            return Err(Error::unauthenticated("login required"));
        };
        let required_role = match capability {
            Capability::Authenticated => return Ok(principal),
            Capability::Guest => &self.guest,
            Capability::Admin => &self.admin,
        };
        if principal.has_role(required_role) {
            Ok(principal)
        } else {
            debug!(
                user_id = %principal.user_id(),
                role = %required_role,
                "caller lacks required role"
            );
            Err(Error::unauthorized(format!(
                "the {required_role} role is required"
            )))
        }
    }
}

/// Check that `principal` owns `post`.
pub fn require_owner(principal: &Principal, post: &Post) -> Result<(), Error> {
    if post.owner() == principal.user_id() {
        Ok(())
    } else {
        Err(Error::unauthorized("only the owner may modify this post"))
    }
}

/// Reject actions a principal attempts against themselves.
pub fn reject_self_target(principal: &Principal, target: UserId, action: &str) -> Result<(), Error> {
    if principal.user_id() == target {
        Err(Error::invalid_operation(format!(
            "users cannot {action} themselves"
        )))
    } else {
        Ok(())
    }
}
