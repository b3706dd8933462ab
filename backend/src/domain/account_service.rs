//! Account domain service.
//!
//! Implements registration, authentication, principal resolution, profile
//! edits, follows, role grants and account deletion. The guest role is
//! resolved once at startup and injected here.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::authorization::reject_self_target;
use crate::domain::cascade::{self, OwnerLink};
use crate::domain::ports::{
    AccountCommand, AccountQuery, EntityStoreError, EntityStores, LoginService,
    PrincipalResolver, ProfileUpdateRequest, RegistrationRequest, Versioned,
};
use crate::domain::record_update::{
    MAX_UPDATE_ATTEMPTS, RecordChange, map_store_error, update_record,
};
use crate::domain::{
    Capability, CredentialHash, Error, Login, LoginCredentials, Membership, Principal, Role,
    RoleId, RolePolicy, User, UserId, UserProfile, UserValidationError,
};

fn invalid_field(error: &UserValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({ "field": error.field() }))
}

fn user_not_found(user_id: UserId) -> Error {
    Error::not_found(format!("user {user_id} not found"))
}

/// Replace a stored optional text field; an empty string clears it.
fn apply_optional(target: &mut Option<String>, update: Option<&String>) -> bool {
    let Some(value) = update else {
        return false;
    };
    let next = (!value.trim().is_empty()).then(|| value.clone());
    if *target == next {
        return false;
    }
    *target = next;
    true
}

/// Account service implementing the account driving ports.
#[derive(Clone)]
pub struct AccountService {
    stores: EntityStores,
    policy: RolePolicy,
    guest_role: Role,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Create a service; `guest_role` is attached to every registration.
    pub fn new(
        stores: EntityStores,
        policy: RolePolicy,
        guest_role: Role,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            stores,
            policy,
            guest_role,
            clock,
        }
    }

    async fn load_user(&self, user_id: UserId) -> Result<User, Error> {
        self.stores
            .users
            .find_by_id(&user_id)
            .await
            .map_err(map_store_error)?
            .map(Versioned::into_record)
            .ok_or_else(|| user_not_found(user_id))
    }

    /// Cascade the user's posts, then remove the user at the revision whose
    /// post list was cascaded. A post attached in between bumps the revision,
    /// so the loop reloads and cascades the newcomer before retrying.
    async fn delete_account(&self, user_id: UserId) -> Result<(), Error> {
        let mut current = self
            .stores
            .users
            .find_by_id(&user_id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| user_not_found(user_id))?;

        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            for post_id in current.record.posts().iter() {
                let post = self
                    .stores
                    .posts
                    .find_by_id(post_id)
                    .await
                    .map_err(map_store_error)?;
                if let Some(post) = post {
                    cascade::delete_post(&self.stores, post, OwnerLink::Skip).await?;
                }
            }

            match self
                .stores
                .users
                .delete_at_revision(&user_id, current.revision)
                .await
            {
                Ok(true) => {
                    cascade::detach_user_everywhere(&self.stores, user_id).await?;
                    info!(
                        user_id = %user_id,
                        posts = current.record.posts().len(),
                        "user deleted"
                    );
                    return Ok(());
                }
                Ok(false) => return Err(user_not_found(user_id)),
                Err(EntityStoreError::RevisionMismatch { expected, actual }) => {
                    debug!(
                        user_id = %user_id,
                        attempt,
                        expected,
                        actual,
                        "user changed before deletion; retrying"
                    );
                }
                Err(other) => return Err(map_store_error(other)),
            }

            current = self
                .stores
                .users
                .find_by_id(&user_id)
                .await
                .map_err(map_store_error)?
                .ok_or_else(|| user_not_found(user_id))?;
        }
        Err(Error::internal(format!(
            "gave up deleting user {user_id} after {MAX_UPDATE_ATTEMPTS} attempts"
        )))
    }
}

#[async_trait]
impl AccountCommand for AccountService {
    async fn register(&self, request: RegistrationRequest) -> Result<User, Error> {
        let login = Login::new(request.credentials.login()).map_err(|err| invalid_field(&err))?;
        let credential =
            CredentialHash::derive(request.credentials.password()).map_err(|err| invalid_field(&err))?;
        let profile = UserProfile {
            username: request.username,
            image: request.image.filter(|value| !value.trim().is_empty()),
            about_me: request.about_me.filter(|value| !value.trim().is_empty()),
            joined_at: self.clock.utc(),
        };
        let user = User::register(
            UserId::random(),
            login,
            credential,
            profile,
            self.guest_role.id(),
        );

        match self.stores.users.create(&user).await {
            Ok(stored) => {
                info!(user_id = %user.id(), "user registered");
                Ok(stored.record)
            }
            Err(EntityStoreError::DuplicateKey { .. }) => {
                debug!(login = %user.login(), "login already taken");
                Err(Error::already_exists("login is already taken")
                    .with_details(json!({ "field": "login" })))
            }
            Err(other) => Err(map_store_error(other)),
        }
    }

    async fn update_profile(
        &self,
        principal: Option<Principal>,
        request: ProfileUpdateRequest,
    ) -> Result<User, Error> {
        let principal = self
            .policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        let new_credential = request
            .new_password
            .as_deref()
            .map(|password| CredentialHash::derive(password))
            .transpose()
            .map_err(|err| invalid_field(&err))?;

        let updated = update_record(self.stores.users.as_ref(), &principal.user_id(), |user| {
            let mut changed = false;
            if let Some(credential) = &new_credential {
                let confirmed = request
                    .current_password
                    .as_deref()
                    .is_some_and(|current| user.credential().verify(current));
                if !confirmed {
                    return Err(Error::invalid_operation(
                        "current password is missing or incorrect",
                    ));
                }
                user.set_credential(credential.clone());
                changed = true;
            }
            let profile = user.profile_mut();
            if let Some(username) = &request.username {
                if profile.username != *username {
                    profile.username = username.clone();
                    changed = true;
                }
            }
            changed |= apply_optional(&mut profile.image, request.image.as_ref());
            changed |= apply_optional(&mut profile.about_me, request.about_me.as_ref());
            Ok(if changed {
                RecordChange::Modified
            } else {
                RecordChange::Unchanged
            })
        })
        .await?;
        updated
            .map(Versioned::into_record)
            .ok_or_else(|| user_not_found(principal.user_id()))
    }

    async fn follow(&self, principal: Option<Principal>, target: UserId) -> Result<User, Error> {
        let principal = self
            .policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        reject_self_target(principal, target, "follow")?;
        self.load_user(target).await?;

        let actor = principal.user_id();
        let updated = update_record(self.stores.users.as_ref(), &actor, |user| {
            match user.follow(target)? {
                Membership::Added => Ok(RecordChange::Modified),
                _ => {
                    debug!(user_id = %actor, target = %target, "already following");
                    Err(Error::already_exists("already following this user"))
                }
            }
        })
        .await?;
        updated
            .map(Versioned::into_record)
            .ok_or_else(|| user_not_found(actor))
    }

    async fn unfollow(
        &self,
        principal: Option<Principal>,
        target: UserId,
    ) -> Result<User, Error> {
        let principal = self
            .policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        let actor = principal.user_id();
        let updated = update_record(self.stores.users.as_ref(), &actor, |user| {
            Ok(user.unfollow(target).into())
        })
        .await?;
        updated
            .map(Versioned::into_record)
            .ok_or_else(|| user_not_found(actor))
    }

    async fn grant_role(
        &self,
        principal: Option<Principal>,
        target: UserId,
        role: RoleId,
    ) -> Result<User, Error> {
        let principal = self.policy.require(principal.as_ref(), Capability::Admin)?;
        reject_self_target(principal, target, "grant roles to")?;
        let role = self
            .stores
            .roles
            .find_by_id(&role)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("role {role} not found")))?
            .into_record();

        let role_id = role.id();
        let updated = update_record(self.stores.users.as_ref(), &target, |user| {
            match user.grant_role(role_id) {
                Membership::Added => Ok(RecordChange::Modified),
                _ => {
                    debug!(user_id = %target, role = %role.name(), "role already held");
                    Err(Error::already_exists(format!(
                        "user already holds the {} role",
                        role.name()
                    )))
                }
            }
        })
        .await?
        .ok_or_else(|| user_not_found(target))?;
        info!(
            user_id = %target,
            role = %role.name(),
            granted_by = %principal.user_id(),
            "role granted"
        );
        Ok(updated.into_record())
    }

    async fn delete_self(&self, principal: Option<Principal>) -> Result<(), Error> {
        let principal = self
            .policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        self.delete_account(principal.user_id()).await
    }

    async fn delete_user(
        &self,
        principal: Option<Principal>,
        target: UserId,
    ) -> Result<(), Error> {
        self.policy.require(principal.as_ref(), Capability::Admin)?;
        self.delete_account(target).await
    }
}

#[async_trait]
impl AccountQuery for AccountService {
    async fn current_user(&self, principal: Option<Principal>) -> Result<User, Error> {
        let principal = self
            .policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        self.load_user(principal.user_id()).await
    }

    async fn get_user(
        &self,
        principal: Option<Principal>,
        user_id: UserId,
    ) -> Result<User, Error> {
        self.policy.require(principal.as_ref(), Capability::Guest)?;
        self.load_user(user_id).await
    }

    async fn list_users(&self, principal: Option<Principal>) -> Result<Vec<User>, Error> {
        let principal = self
            .policy
            .require(principal.as_ref(), Capability::Authenticated)?;
        let caller = principal.user_id();
        let users = self.stores.users.list().await.map_err(map_store_error)?;
        Ok(users.into_iter().filter(|user| user.id() != caller).collect())
    }

    async fn count_users(&self, principal: Option<Principal>) -> Result<u64, Error> {
        self.policy.require(principal.as_ref(), Capability::Admin)?;
        self.stores.users.count().await.map_err(map_store_error)
    }

    async fn list_roles(&self, principal: Option<Principal>) -> Result<Vec<Role>, Error> {
        self.policy.require(principal.as_ref(), Capability::Admin)?;
        self.stores.roles.list().await.map_err(map_store_error)
    }
}

#[async_trait]
impl LoginService for AccountService {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let stored = self
            .stores
            .users
            .find_by_unique_key(credentials.login())
            .await
            .map_err(map_store_error)?;
        match stored {
            Some(stored) if stored.record.credential().verify(credentials.password()) => {
                Ok(stored.record.id())
            }
            _ => Err(Error::unauthenticated("invalid credentials")),
        }
    }
}

#[async_trait]
impl PrincipalResolver for AccountService {
    async fn resolve(&self, user_id: &UserId) -> Result<Option<Principal>, Error> {
        let Some(stored) = self
            .stores
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_store_error)?
        else {
            return Ok(None);
        };
        let roles = self
            .stores
            .roles
            .populate(stored.record.roles().as_slice())
            .await
            .map_err(map_store_error)?;
        Ok(Some(Principal::from_user(&stored.record, &roles)))
    }
}

#[cfg(test)]
mod tests;
