//! Authenticated caller identity.

use crate::domain::{Role, RoleName, User, UserId};

/// The authenticated user behind an inbound action together with the names
/// of the roles they hold.
///
/// Built by a [`crate::domain::ports::PrincipalResolver`] from the stored
/// user record on every request, so role grants and account deletion take
/// effect immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: UserId,
    roles: Vec<RoleName>,
}

impl Principal {
    /// Build a principal from a user id and resolved role names.
    #[must_use]
    pub fn new(user_id: UserId, roles: Vec<RoleName>) -> Self {
        Self { user_id, roles }
    }

    /// Build a principal for `user`, keeping the names of `roles` the user
    /// actually holds.
    #[must_use]
    pub fn from_user(user: &User, roles: &[Role]) -> Self {
        let names = roles
            .iter()
            .filter(|role| user.roles().contains(&role.id()))
            .map(|role| role.name().clone())
            .collect();
        Self::new(user.id(), names)
    }

    /// Authenticated user.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Names of held roles.
    pub fn roles(&self) -> &[RoleName] {
        &self.roles
    }

    /// Whether the principal holds the role called `name`.
    pub fn has_role(&self, name: &RoleName) -> bool {
        self.roles.contains(name)
    }
}
