//! Startup helpers for the role collection.
//!
//! Roles are never mutated by normal request flow. The binary optionally
//! seeds the configured role names and then resolves the guest role once so
//! it can be injected into the account service.

use tracing::info;

use crate::domain::ports::{EntityStore, EntityStoreError};
use crate::domain::record_update::map_store_error;
use crate::domain::{Error, Role, RoleId, RoleName};

/// Create each role in `names` that does not exist yet.
///
/// Concurrent seeding is harmless: a duplicate name reported by the store is
/// treated as already seeded.
pub async fn seed_roles(store: &dyn EntityStore<Role>, names: &[RoleName]) -> Result<(), Error> {
    for name in names {
        let existing = store
            .find_by_unique_key(name.as_ref())
            .await
            .map_err(map_store_error)?;
        if existing.is_some() {
            continue;
        }
        match store.create(&Role::new(RoleId::random(), name.clone())).await {
            Ok(_) => info!(role = %name, "role seeded"),
            Err(EntityStoreError::DuplicateKey { .. }) => {}
            Err(other) => return Err(map_store_error(other)),
        }
    }
    Ok(())
}

/// Look up a role by name, failing with `NotFound` when it is missing.
pub async fn resolve_role(store: &dyn EntityStore<Role>, name: &RoleName) -> Result<Role, Error> {
    store
        .find_by_unique_key(name.as_ref())
        .await
        .map_err(map_store_error)?
        .map(|stored| stored.record)
        .ok_or_else(|| Error::not_found(format!("role {name} does not exist")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::outbound::memory::InMemoryEntityStore;
    use rstest::rstest;

    fn names(raw: &[&str]) -> Vec<RoleName> {
        raw.iter()
            .map(|name| RoleName::new(name).expect("valid role name"))
            .collect()
    }

    #[rstest]
    #[tokio::test]
    async fn seeding_is_idempotent() {
        let store = InMemoryEntityStore::<Role>::new();
        let wanted = names(&["guest", "admin"]);
        seed_roles(&store, &wanted).await.expect("first seed");
        seed_roles(&store, &wanted).await.expect("second seed");
        assert_eq!(store.count().await.expect("count"), 2);

        let guest = resolve_role(&store, &wanted[0]).await.expect("guest exists");
        assert_eq!(guest.name().as_ref(), "guest");
    }

    #[rstest]
    #[tokio::test]
    async fn missing_role_is_not_found() {
        let store = InMemoryEntityStore::<Role>::new();
        let err = resolve_role(&store, &names(&["guest"])[0])
            .await
            .expect_err("no roles seeded");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }
}
