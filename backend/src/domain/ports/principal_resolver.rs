//! Driving port that turns a session's user id into a [`Principal`].

use async_trait::async_trait;

use crate::domain::{Error, Principal, UserId};

/// Loads the caller's current roles for each request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    /// Resolve `user_id`; `None` when the account no longer exists.
    async fn resolve(&self, user_id: &UserId) -> Result<Option<Principal>, Error>;
}
