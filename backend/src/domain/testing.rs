//! Shared fixtures for service-level tests: in-memory stores, seeded roles,
//! a fixed clock and helpers for registering users.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{
    AccountCommand, Document, EntityStore, EntityStoreError, EntityStores, PrincipalResolver,
    RegistrationRequest, Versioned,
};
use crate::domain::record_update::update_record;
use crate::domain::{
    AccountService, DisplayName, LoginCredentials, PostService, Principal, Role, RolePolicy,
    RoleName, UserId, resolve_role, seed_roles,
};
use crate::outbound::memory::{InMemoryEntityStore, in_memory_stores};

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

pub(crate) fn memory_stores() -> EntityStores {
    in_memory_stores()
}

pub(crate) fn default_policy() -> RolePolicy {
    RolePolicy::new(
        RoleName::new("guest").expect("guest role name"),
        RoleName::new("admin").expect("admin role name"),
    )
}

/// Fully wired services over fresh in-memory stores.
pub(crate) struct World {
    pub stores: EntityStores,
    pub accounts: AccountService,
    pub posts: PostService,
    pub guest: Role,
    pub admin: Role,
}

impl World {
    pub async fn new() -> Self {
        Self::with_stores(memory_stores()).await
    }

    pub async fn with_stores(stores: EntityStores) -> Self {
        let policy = default_policy();
        let names = [policy.guest().clone(), policy.admin().clone()];
        seed_roles(stores.roles.as_ref(), &names)
            .await
            .expect("seed roles");
        let guest = resolve_role(stores.roles.as_ref(), policy.guest())
            .await
            .expect("guest role");
        let admin = resolve_role(stores.roles.as_ref(), policy.admin())
            .await
            .expect("admin role");
        let accounts = AccountService::new(
            stores.clone(),
            policy.clone(),
            guest.clone(),
            fixture_clock(),
        );
        let posts = PostService::new(stores.clone(), policy, fixture_clock());
        Self {
            stores,
            accounts,
            posts,
            guest,
            admin,
        }
    }

    /// Register `login` with a fixed password and return its principal.
    pub async fn register(&self, login: &str) -> Principal {
        let request = RegistrationRequest {
            credentials: LoginCredentials::try_from_parts(login, "password123")
                .expect("credentials"),
            username: DisplayName::new(format!("{login} name")).expect("display name"),
            image: None,
            about_me: None,
        };
        let user = self.accounts.register(request).await.expect("register user");
        self.principal(user.id()).await
    }

    /// Resolve the current principal for `user_id`.
    pub async fn principal(&self, user_id: UserId) -> Principal {
        self.accounts
            .resolve(&user_id)
            .await
            .expect("resolve principal")
            .expect("user exists")
    }

    /// Grant the admin role directly through the store.
    pub async fn promote(&self, principal: &Principal) -> Principal {
        let admin = self.admin.id();
        update_record(self.stores.users.as_ref(), &principal.user_id(), |user| {
            Ok(user.grant_role(admin).into())
        })
        .await
        .expect("grant admin")
        .expect("user exists");
        self.principal(principal.user_id()).await
    }
}

/// Store double that delegates to memory but can fail selected operations.
pub(crate) struct FaultyStore<R: Document> {
    inner: InMemoryEntityStore<R>,
    fail_update: bool,
    fail_delete: bool,
}

impl<R: Document> FaultyStore<R> {
    pub fn failing_updates() -> Self {
        Self {
            inner: InMemoryEntityStore::new(),
            fail_update: true,
            fail_delete: false,
        }
    }

    pub fn failing_deletes() -> Self {
        Self {
            inner: InMemoryEntityStore::new(),
            fail_update: false,
            fail_delete: true,
        }
    }
}

#[async_trait]
impl<R: Document> EntityStore<R> for FaultyStore<R> {
    async fn create(
        &self,
        record: &R,
    ) -> Result<Versioned<R>, EntityStoreError> {
        self.inner.create(record).await
    }

    async fn find_by_id(
        &self,
        id: &R::Id,
    ) -> Result<Option<Versioned<R>>, EntityStoreError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_unique_key(
        &self,
        key: &str,
    ) -> Result<Option<Versioned<R>>, EntityStoreError> {
        self.inner.find_by_unique_key(key).await
    }

    async fn populate(
        &self,
        ids: &[R::Id],
    ) -> Result<Vec<R>, EntityStoreError> {
        self.inner.populate(ids).await
    }

    async fn list(&self) -> Result<Vec<R>, EntityStoreError> {
        self.inner.list().await
    }

    async fn count(&self) -> Result<u64, EntityStoreError> {
        self.inner.count().await
    }

    async fn update(
        &self,
        record: &R,
        expected_revision: u64,
    ) -> Result<Versioned<R>, EntityStoreError> {
        if self.fail_update {
            return Err(EntityStoreError::query("update rejected"));
        }
        self.inner.update(record, expected_revision).await
    }

    async fn delete(&self, id: &R::Id) -> Result<bool, EntityStoreError> {
        if self.fail_delete {
            return Err(EntityStoreError::connection("delete rejected"));
        }
        self.inner.delete(id).await
    }

    async fn delete_at_revision(
        &self,
        id: &R::Id,
        expected_revision: u64,
    ) -> Result<bool, EntityStoreError> {
        if self.fail_delete {
            return Err(EntityStoreError::connection("delete rejected"));
        }
        self.inner.delete_at_revision(id, expected_revision).await
    }
}
