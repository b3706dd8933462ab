//! In-process entity store backing tests and database-less runs.
//!
//! Records are held as typed values behind a `tokio::sync::RwLock`; every
//! mutation takes the write lock, so revision checks and unique-key checks
//! happen atomically with the write.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{Document, EntityStore, EntityStoreError, EntityStores, Versioned};

#[derive(Debug)]
struct Collection<R: Document> {
    records: HashMap<R::Id, Versioned<R>>,
    order: Vec<R::Id>,
    unique_keys: HashMap<String, R::Id>,
}

impl<R: Document> Default for Collection<R> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            order: Vec::new(),
            unique_keys: HashMap::new(),
        }
    }
}

impl<R: Document> Collection<R> {
    fn remove(&mut self, id: &R::Id) -> bool {
        let Some(removed) = self.records.remove(id) else {
            return false;
        };
        self.order.retain(|candidate| candidate != id);
        if let Some(key) = removed.record.unique_key() {
            self.unique_keys.remove(&key);
        }
        true
    }
}

/// [`EntityStore`] held entirely in memory.
///
/// # Examples
/// ```
/// use proofboard::domain::ports::EntityStore;
/// use proofboard::domain::{Role, RoleId, RoleName};
/// use proofboard::outbound::memory::InMemoryEntityStore;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = InMemoryEntityStore::<Role>::new();
/// let role = Role::new(RoleId::random(), RoleName::new("guest").unwrap());
/// let stored = store.create(&role).await.unwrap();
/// assert_eq!(stored.revision, 1);
/// assert!(store.find_by_unique_key("guest").await.unwrap().is_some());
/// # });
/// ```
#[derive(Debug)]
pub struct InMemoryEntityStore<R: Document> {
    inner: RwLock<Collection<R>>,
}

impl<R: Document> Default for InMemoryEntityStore<R> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Collection::default()),
        }
    }
}

impl<R: Document> InMemoryEntityStore<R> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// One empty in-memory collection per entity.
#[must_use]
pub fn in_memory_stores() -> EntityStores {
    EntityStores {
        users: Arc::new(InMemoryEntityStore::new()),
        posts: Arc::new(InMemoryEntityStore::new()),
        comments: Arc::new(InMemoryEntityStore::new()),
        roles: Arc::new(InMemoryEntityStore::new()),
    }
}

fn not_found<R: Document>(id: &R::Id) -> EntityStoreError {
    EntityStoreError::not_found(R::COLLECTION.as_str(), id.to_string())
}

#[async_trait]
impl<R: Document> EntityStore<R> for InMemoryEntityStore<R> {
    async fn create(&self, record: &R) -> Result<Versioned<R>, EntityStoreError> {
        let mut guard = self.inner.write().await;
        let id = record.id();
        if guard.records.contains_key(&id) {
            return Err(EntityStoreError::duplicate_key(
                R::COLLECTION.as_str(),
                id.to_string(),
            ));
        }
        let key = record.unique_key();
        if let Some(key) = &key {
            if guard.unique_keys.contains_key(key) {
                return Err(EntityStoreError::duplicate_key(R::COLLECTION.as_str(), key));
            }
        }
        let stored = Versioned {
            record: record.clone(),
            revision: 1,
        };
        if let Some(key) = key {
            guard.unique_keys.insert(key, id);
        }
        guard.order.push(id);
        guard.records.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: &R::Id) -> Result<Option<Versioned<R>>, EntityStoreError> {
        Ok(self.inner.read().await.records.get(id).cloned())
    }

    async fn find_by_unique_key(
        &self,
        key: &str,
    ) -> Result<Option<Versioned<R>>, EntityStoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .unique_keys
            .get(key)
            .and_then(|id| guard.records.get(id))
            .cloned())
    }

    async fn populate(&self, ids: &[R::Id]) -> Result<Vec<R>, EntityStoreError> {
        let guard = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| guard.records.get(id))
            .map(|stored| stored.record.clone())
            .collect())
    }

    async fn list(&self) -> Result<Vec<R>, EntityStoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .order
            .iter()
            .filter_map(|id| guard.records.get(id))
            .map(|stored| stored.record.clone())
            .collect())
    }

    async fn count(&self) -> Result<u64, EntityStoreError> {
        let count = self.inner.read().await.records.len();
        u64::try_from(count).map_err(|err| EntityStoreError::query(err.to_string()))
    }

    async fn update(
        &self,
        record: &R,
        expected_revision: u64,
    ) -> Result<Versioned<R>, EntityStoreError> {
        let mut guard = self.inner.write().await;
        let id = record.id();
        let Some(current) = guard.records.get(&id) else {
            return Err(not_found::<R>(&id));
        };
        if current.revision != expected_revision {
            return Err(EntityStoreError::revision_mismatch(
                expected_revision,
                current.revision,
            ));
        }
        let old_key = current.record.unique_key();
        let new_key = record.unique_key();
        if new_key != old_key {
            if let Some(key) = &new_key {
                if guard.unique_keys.contains_key(key) {
                    return Err(EntityStoreError::duplicate_key(R::COLLECTION.as_str(), key));
                }
            }
            if let Some(key) = old_key {
                guard.unique_keys.remove(&key);
            }
            if let Some(key) = new_key {
                guard.unique_keys.insert(key, id);
            }
        }
        let stored = Versioned {
            record: record.clone(),
            revision: expected_revision + 1,
        };
        guard.records.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &R::Id) -> Result<bool, EntityStoreError> {
        let mut guard = self.inner.write().await;
        Ok(guard.remove(id))
    }

    async fn delete_at_revision(
        &self,
        id: &R::Id,
        expected_revision: u64,
    ) -> Result<bool, EntityStoreError> {
        let mut guard = self.inner.write().await;
        let Some(current) = guard.records.get(id) else {
            return Ok(false);
        };
        if current.revision != expected_revision {
            return Err(EntityStoreError::revision_mismatch(
                expected_revision,
                current.revision,
            ));
        }
        Ok(guard.remove(id))
    }
}
