//! Driving port for account mutations: registration, profile edits,
//! follows, role grants and account deletion.

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::{DisplayName, Error, LoginCredentials, Principal, RoleId, User, UserId};

/// Request to create an account.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Login and password; the login is validated by the service.
    pub credentials: LoginCredentials,
    /// Initial display name.
    pub username: DisplayName,
    /// Optional avatar reference.
    pub image: Option<String>,
    /// Optional biography.
    pub about_me: Option<String>,
}

/// Partial profile update. `None` leaves a field unchanged.
#[derive(Clone, Default)]
pub struct ProfileUpdateRequest {
    /// New display name.
    pub username: Option<DisplayName>,
    /// New avatar reference.
    pub image: Option<String>,
    /// New biography.
    pub about_me: Option<String>,
    /// New password; requires `current_password`.
    pub new_password: Option<Zeroizing<String>>,
    /// Current password, checked when `new_password` is present.
    pub current_password: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for ProfileUpdateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileUpdateRequest")
            .field("username", &self.username)
            .field("image", &self.image)
            .field("about_me", &self.about_me)
            .field("new_password", &self.new_password.as_ref().map(|_| "<redacted>"))
            .field(
                "current_password",
                &self.current_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Domain use-case port for account mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an account holding the guest role.
    async fn register(&self, request: RegistrationRequest) -> Result<User, Error>;

    /// Change the caller's profile and, optionally, password.
    async fn update_profile(
        &self,
        principal: Option<Principal>,
        request: ProfileUpdateRequest,
    ) -> Result<User, Error>;

    /// Follow `target`; returns the caller's updated record.
    async fn follow(&self, principal: Option<Principal>, target: UserId) -> Result<User, Error>;

    /// Stop following `target`; absent targets are a no-op.
    async fn unfollow(&self, principal: Option<Principal>, target: UserId)
    -> Result<User, Error>;

    /// Grant `role` to `target`. Requires the admin role.
    async fn grant_role(
        &self,
        principal: Option<Principal>,
        target: UserId,
        role: RoleId,
    ) -> Result<User, Error>;

    /// Delete the caller's account and everything it owns.
    async fn delete_self(&self, principal: Option<Principal>) -> Result<(), Error>;

    /// Delete another account. Requires the admin role.
    async fn delete_user(&self, principal: Option<Principal>, target: UserId)
    -> Result<(), Error>;
}
