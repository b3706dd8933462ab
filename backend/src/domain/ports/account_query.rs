//! Driving port for account reads.

use async_trait::async_trait;

use crate::domain::{Error, Principal, Role, User, UserId};

/// Domain use-case port for reading users and roles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountQuery: Send + Sync {
    /// The caller's own record.
    async fn current_user(&self, principal: Option<Principal>) -> Result<User, Error>;

    /// Any user by id. Requires the guest role.
    async fn get_user(&self, principal: Option<Principal>, user_id: UserId)
    -> Result<User, Error>;

    /// Every user except the caller.
    async fn list_users(&self, principal: Option<Principal>) -> Result<Vec<User>, Error>;

    /// Number of registered users. Requires the admin role.
    async fn count_users(&self, principal: Option<Principal>) -> Result<u64, Error>;

    /// Every role. Requires the admin role.
    async fn list_roles(&self, principal: Option<Principal>) -> Result<Vec<Role>, Error>;
}
